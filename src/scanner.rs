use crate::{BytesReader, ByteSink, ByteSource, RawFrame, MAX_FRAME_LEN, SYNC_MARKER};

/// Fewest marker bytes that make up a preamble.
pub const MIN_PREAMBLE_LEN: u8 = 2;
/// Longest preamble a sender may be configured for.
pub const MAX_PREAMBLE_LEN: u8 = 3;

/// Struct for configuring a `SyncScanner`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScannerConfig {
    /// Byte the preamble is made of. Default is `'x'`.
    pub marker: u8,
    /// Consecutive markers needed before a payload is collected. Default is `2`.
    pub preamble_len: u8,
    /// Payload bytes collected per frame. Default is `10`.
    pub frame_len: usize,
    /// Byte ending a payload before `frame_len` is reached. Default is `None`.
    pub terminator: Option<u8>,
}

impl ScannerConfig {
    pub const fn default() -> Self {
        Self {
            marker: SYNC_MARKER,
            preamble_len: MIN_PREAMBLE_LEN,
            frame_len: MAX_FRAME_LEN,
            terminator: None,
        }
    }

    pub const fn with_marker(mut self, marker: u8) -> Self {
        self.marker = marker;
        self
    }

    pub const fn with_preamble_len(mut self, preamble_len: u8) -> Self {
        self.preamble_len = preamble_len;
        self
    }

    pub const fn with_frame_len(mut self, frame_len: usize) -> Self {
        self.frame_len = frame_len;
        self
    }

    pub const fn with_terminator(mut self, terminator: Option<u8>) -> Self {
        self.terminator = terminator;
        self
    }
}

/// Represents a state machine for acquiring a frame
///
/// +----------------+   +----------+   +------------+
/// | AwaitingMarker |-->| Preamble |-->| Collecting |
/// +----------------+   +----------+   +------------+
///         ^                  |               |
///         |                  |               |
///         +------------------+               |
///         +----------------------------------+
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    AwaitingMarker,
    Preamble { run: u8 },
    Collecting,
}

/// Finds frames in a noisy byte stream.
///
/// Bytes are discarded until a run of marker bytes is seen. Further markers extend the
/// preamble; the first other byte starts the payload, which is then collected verbatim
/// (markers included) until `frame_len` bytes or the terminator arrive.
#[derive(Debug)]
pub struct SyncScanner {
    config: ScannerConfig,
    state: ScanState,
    raw: RawFrame,
}

impl SyncScanner {
    /// Creates a new scanner. Out of range preamble and frame lengths are clamped.
    pub const fn new(config: ScannerConfig) -> Self {
        let mut config = config;

        if config.preamble_len < MIN_PREAMBLE_LEN {
            config.preamble_len = MIN_PREAMBLE_LEN;
        } else if config.preamble_len > MAX_PREAMBLE_LEN {
            config.preamble_len = MAX_PREAMBLE_LEN;
        }

        if config.frame_len == 0 || config.frame_len > MAX_FRAME_LEN {
            config.frame_len = MAX_FRAME_LEN;
        }

        Self {
            config,
            state: ScanState::AwaitingMarker,
            raw: RawFrame::empty(),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Drops any partial frame and goes back to looking for a preamble.
    pub fn reset(&mut self) {
        self.state = ScanState::AwaitingMarker;
        self.raw.clear();
    }

    /// Whether the scanner is in the middle of a preamble or payload.
    pub fn is_busy(&self) -> bool {
        self.state != ScanState::AwaitingMarker
    }

    /// Consumes a byte and returns the frame it completes, if any.
    pub fn push_byte(&mut self, byte: u8) -> Option<&RawFrame> {
        if self.step(byte) {
            Some(&self.raw)
        } else {
            None
        }
    }

    /// Consumes bytes up to the end of the first complete frame. Returns the frame, if one
    /// was completed, and the bytes left unread.
    pub fn push_bytes<'r, 'b>(&'r mut self, bytes: &'b [u8]) -> (Option<&'r RawFrame>, &'b [u8]) {
        let mut reader = BytesReader::new(bytes);

        while let Some(byte) = reader.next() {
            if self.step(byte) {
                return (Some(&self.raw), reader.remaining());
            }
        }

        (None, reader.remaining())
    }

    /// Pulls bytes from `source`, mirroring each one to `echo`, until a frame is complete.
    ///
    /// Returns `None` once the source has nothing more to give; a partial frame is kept
    /// and completed by later calls.
    pub fn scan<S, E>(&mut self, source: &mut S, echo: &mut E, blocking: bool) -> Option<&RawFrame>
    where
        S: ByteSource + ?Sized,
        E: ByteSink + ?Sized,
    {
        loop {
            let byte = source.next_byte(blocking)?;
            echo.emit_byte(byte);

            if self.step(byte) {
                return Some(&self.raw);
            }
        }
    }

    /// Returns an iterator over the frames found in `buf`.
    pub fn iter_frames<'a, 'b>(&'a mut self, buf: &'b [u8]) -> IterFrames<'a, 'b> {
        IterFrames { scanner: self, buf }
    }

    /// Advances the state machine, returning `true` when `byte` completes a frame.
    fn step(&mut self, byte: u8) -> bool {
        match self.state {
            ScanState::AwaitingMarker => {
                if byte == self.config.marker {
                    self.state = ScanState::Preamble { run: 1 };
                }
                false
            }
            ScanState::Preamble { run } => {
                if byte == self.config.marker {
                    self.state = ScanState::Preamble {
                        run: run.saturating_add(1),
                    };
                    false
                } else if run >= self.config.preamble_len {
                    self.raw.clear();
                    self.state = ScanState::Collecting;
                    self.collect(byte)
                } else {
                    self.state = ScanState::AwaitingMarker;
                    false
                }
            }
            ScanState::Collecting => self.collect(byte),
        }
    }

    fn collect(&mut self, byte: u8) -> bool {
        if self.config.terminator == Some(byte) {
            self.state = ScanState::AwaitingMarker;
            if self.raw.is_empty() {
                return false;
            }
        } else {
            self.raw.push(byte);
            if self.raw.len() < self.config.frame_len {
                return false;
            }
            self.state = ScanState::AwaitingMarker;
        }

        trace!("frame of {} bytes acquired", self.raw.len());
        true
    }
}

/// Iterator over the frames in a buffer. Created by [`SyncScanner::iter_frames`].
///
/// A frame cut off by the end of the buffer is kept by the scanner and completed by the
/// next buffer fed to it.
pub struct IterFrames<'a, 'b> {
    scanner: &'a mut SyncScanner,
    buf: &'b [u8],
}

impl Iterator for IterFrames<'_, '_> {
    type Item = RawFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }

        let (frame, remaining) = self.scanner.push_bytes(self.buf);
        self.buf = remaining;
        frame.copied()
    }
}

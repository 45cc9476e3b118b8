use crate::{CommandFrame, DecodeError, DecoderConfig, MAX_RAW_LEN, SEPARATOR, TERMINATOR};

/// Represents a raw frame (not decoded)
///
/// Holds the ASCII bytes of one frame as received, without the sync preamble.
#[derive(Clone, Copy, Debug)]
pub struct RawFrame {
    pub(crate) buf: [u8; MAX_RAW_LEN],
    pub(crate) len: usize,
}

impl RawFrame {
    pub(crate) const fn empty() -> RawFrame {
        RawFrame {
            buf: [TERMINATOR; MAX_RAW_LEN],
            len: 0,
        }
    }

    /// Create a new RawFrame from the given slice. Bytes after the first NUL are ignored,
    /// and the string must be at most `MAX_RAW_LEN` bytes long.
    pub fn new(slice: &[u8]) -> Result<RawFrame, DecodeError> {
        let len = slice
            .iter()
            .position(|&b| b == TERMINATOR)
            .unwrap_or(slice.len());

        let mut frame = RawFrame::empty();
        frame
            .buf
            .get_mut(..len)
            .ok_or(DecodeError::BadLength { len })?
            .copy_from_slice(&slice[..len]);
        frame.len = len;

        Ok(frame)
    }

    /// Get the frame bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len.min(MAX_RAW_LEN)]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the checksum-relevant part of the frame: everything before the separator, or the
    /// whole frame when it carries no separator.
    pub fn prefix(&self) -> &[u8] {
        let data = self.as_slice();
        match data.iter().position(|&b| b == SEPARATOR) {
            Some(idx) => &data[..idx],
            None => data,
        }
    }

    /// Appends a byte, returning `false` when the buffer is full.
    pub(crate) fn push(&mut self, byte: u8) -> bool {
        if let Some(slot) = self.buf.get_mut(self.len) {
            *slot = byte;
            self.len += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn push_bytes(&mut self, data: &[u8]) -> bool {
        data.iter().all(|&b| self.push(b))
    }

    /// Drops everything from `len` on.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
            self.buf[len] = TERMINATOR;
        }
    }

    /// Empties the frame so stale bytes cannot be decoded again.
    pub fn clear(&mut self) {
        self.buf[0] = TERMINATOR;
        self.len = 0;
    }

    /// Whether the frame has been cleared (first byte is the terminator).
    pub fn is_cleared(&self) -> bool {
        self.buf[0] == TERMINATOR
    }

    /// Decode the raw frame into a [`CommandFrame`]
    pub fn to_frame(&self) -> Result<CommandFrame, DecodeError> {
        CommandFrame::decode(self.as_slice())
    }

    /// Decode the raw frame with an explicit decoder configuration
    pub fn to_frame_with(&self, config: &DecoderConfig) -> Result<CommandFrame, DecodeError> {
        CommandFrame::decode_with(self.as_slice(), config)
    }
}

/// Frames are equal when their bytes are; whatever lies past `len` is not part of the frame.
impl PartialEq for RawFrame {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for RawFrame {}

#[cfg(test)]
mod tests {
    use crate::{ChecksumAlgorithm, DecodeError, FrameValidator, RawFrame, MAX_RAW_LEN};

    #[test]
    fn test_raw_frame_stops_at_nul() {
        let raw = RawFrame::new(b"01231\0garbage").unwrap();
        assert_eq!(raw.as_slice(), b"01231");
        assert_eq!(raw.len(), 5);
    }

    #[test]
    fn test_raw_frame_too_long() {
        let data = [b'0'; MAX_RAW_LEN + 1];
        assert_eq!(
            RawFrame::new(&data),
            Err(DecodeError::BadLength { len: MAX_RAW_LEN + 1 })
        );
    }

    #[test]
    fn test_raw_frame_prefix() {
        assert_eq!(RawFrame::new(b"0123011:DE").unwrap().prefix(), b"0123011");
        assert_eq!(RawFrame::new(b"01231:4A").unwrap().prefix(), b"01231");
        assert_eq!(RawFrame::new(b"0123011").unwrap().prefix(), b"0123011");
    }

    #[test]
    fn test_raw_frame_clear_and_truncate() {
        let mut raw = RawFrame::new(b"0123011:DE").unwrap();

        raw.truncate(7);
        assert_eq!(raw.as_slice(), b"0123011");
        assert!(!raw.is_cleared());

        raw.clear();
        assert!(raw.is_cleared());
        assert!(raw.is_empty());
        assert_eq!(raw.as_slice(), b"");
    }

    #[test]
    fn test_raw_frame_eq_ignores_stale_bytes() {
        let mut raw = RawFrame::new(b"0123011:DE").unwrap();
        FrameValidator::default()
            .validate(&mut raw, ChecksumAlgorithm::Crc8Ibutton)
            .unwrap();

        assert_eq!(raw, RawFrame::new(b"0123011").unwrap());
        assert_ne!(raw, RawFrame::new(b"0123011:DE").unwrap());

        let mut cleared = RawFrame::new(b"FFFF020").unwrap();
        cleared.clear();
        assert_eq!(cleared, RawFrame::empty());
    }
}

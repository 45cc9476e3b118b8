use crate::BytesReader;

/// A byte channel the receiver pulls frames from (a UART, a radio module, a replay buffer).
pub trait ByteSource {
    /// Returns the next received byte.
    ///
    /// With `blocking` set the call waits until a byte arrives; otherwise it returns `None`
    /// when nothing is ready. Returning `None` while blocking means the channel is closed.
    fn next_byte(&mut self, blocking: bool) -> Option<u8>;
}

/// Passive mirror of received bytes, typically a debug console.
pub trait ByteSink {
    fn emit_byte(&mut self, byte: u8);
}

/// Sink that drops every byte.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEcho;

impl ByteSink for NoEcho {
    fn emit_byte(&mut self, _byte: u8) {}
}

impl ByteSource for BytesReader<'_> {
    fn next_byte(&mut self, _blocking: bool) -> Option<u8> {
        self.next()
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn next_byte(&mut self, blocking: bool) -> Option<u8> {
        (**self).next_byte(blocking)
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn emit_byte(&mut self, byte: u8) {
        (**self).emit_byte(byte)
    }
}

/// Cursor over a borrowed byte slice.
///
/// Used by the scanner to consume chunks, and usable as a [`ByteSource`](crate::ByteSource)
/// when frames are replayed from memory.
#[derive(Debug)]
pub struct BytesReader<'a> {
    buf: &'a [u8],
    idx: usize,
}

impl<'a> BytesReader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, idx: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.idx
    }

    pub fn is_empty(&self) -> bool {
        self.idx == self.buf.len()
    }

    pub fn next(&mut self) -> Option<u8> {
        let val = self.buf.get(self.idx).copied()?;
        self.idx += 1;
        Some(val)
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.idx..]
    }
}

#[cfg(test)]
mod tests {
    use crate::BytesReader;

    #[test]
    fn test_bytes_reader_tracks_position() {
        let mut reader = BytesReader::new(b"xx01");

        assert_eq!(reader.next(), Some(b'x'));
        assert_eq!(reader.consumed(), 1);
        assert_eq!(reader.remaining(), b"x01");

        assert_eq!(reader.next(), Some(b'x'));
        assert_eq!(reader.next(), Some(b'0'));
        assert_eq!(reader.next(), Some(b'1'));
        assert!(reader.is_empty());
        assert_eq!(reader.next(), None);
        assert_eq!(reader.remaining(), b"");
    }
}

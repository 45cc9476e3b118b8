use snafu::Snafu;

use super::CHECKSUM_DIGITS;
use crate::{
    ChecksumAlgorithm, CommandFrame, FrameFormat, RawFrame, MAX_PREFIX_LEN, MAX_RAW_LEN,
    SEPARATOR,
};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Frame fields bounded by the digit width of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Pin,
    Command,
}

impl CommandFrame {
    /// Builds a frame to send to `address`.
    ///
    /// The frame carries the `AAAAPPC` prefix, so checksums computed on it match the
    /// ten-character layout. Only the low nibble of `command` fits that prefix.
    pub const fn new(address: u16, pin_mask: u8, command: u8) -> Self {
        let mut frame = Self::empty();
        frame.address = address;
        frame.high_byte = (address >> 8) as u8;
        frame.low_byte = address as u8;
        frame.pin_mask = pin_mask;
        frame.command = command;
        frame.prefix = [
            hex_digit(address, 12),
            hex_digit(address, 8),
            hex_digit(address, 4),
            hex_digit(address, 0),
            hex_digit(pin_mask as u16, 4),
            hex_digit(pin_mask as u16, 0),
            hex_digit(command as u16, 0),
        ];
        frame.prefix_len = MAX_PREFIX_LEN;
        frame
    }

    /// Writes the frame string for `format`, appending the checksum when the layout has one.
    ///
    /// Hex digits are written uppercase.
    pub fn encode(
        &self,
        format: FrameFormat,
        algorithm: ChecksumAlgorithm,
    ) -> Result<RawFrame, EncodeError> {
        let mut raw = RawFrame::empty();
        self.encode_into(&mut raw, format, algorithm)?;
        Ok(raw)
    }

    /// Same as [`encode`](CommandFrame::encode), behind `count` copies of the sync `marker`.
    pub fn encode_with_sync(
        &self,
        format: FrameFormat,
        algorithm: ChecksumAlgorithm,
        marker: u8,
        count: usize,
    ) -> Result<RawFrame, EncodeError> {
        let len = count.checked_add(format.len()).unwrap_or(usize::MAX);
        if len > MAX_RAW_LEN {
            return Err(EncodeError::BufferFull { len });
        }

        let mut raw = RawFrame::empty();
        for _ in 0..count {
            raw.push(marker);
        }
        self.encode_into(&mut raw, format, algorithm)?;
        Ok(raw)
    }

    fn encode_into(
        &self,
        raw: &mut RawFrame,
        format: FrameFormat,
        algorithm: ChecksumAlgorithm,
    ) -> Result<(), EncodeError> {
        let pin_digits = format.pin_digits();
        if pin_digits == 1 && self.pin_mask > 0xF {
            return Err(EncodeError::FieldOverflow {
                field: Field::Pin,
                value: self.pin_mask,
            });
        }

        let command_limit = if format.has_command() { 0xF } else { 0 };
        if self.command > command_limit {
            return Err(EncodeError::FieldOverflow {
                field: Field::Command,
                value: self.command,
            });
        }

        let start = raw.len();
        let mut ok = push_hex(raw, self.address, 4);
        ok &= push_hex(raw, self.pin_mask as u16, pin_digits);
        if format.has_command() {
            ok &= push_hex(raw, self.command as u16, 1);
        }

        if format.has_checksum() {
            let mut sealed = *self;
            sealed.set_prefix(&raw.as_slice()[start..]);
            let checksum = algorithm.compute(&sealed);

            ok &= raw.push(SEPARATOR);
            ok &= push_hex(raw, checksum as u16, CHECKSUM_DIGITS);
        }

        if ok {
            Ok(())
        } else {
            Err(EncodeError::BufferFull {
                len: start + format.len(),
            })
        }
    }
}

const fn hex_digit(value: u16, shift: u32) -> u8 {
    HEX_DIGITS[((value >> shift) & 0xF) as usize]
}

fn push_hex(raw: &mut RawFrame, value: u16, digits: usize) -> bool {
    let mut digit_buf = [0u8; 4];
    for (i, slot) in digit_buf[..digits].iter_mut().rev().enumerate() {
        *slot = hex_digit(value, 4 * i as u32);
    }
    raw.push_bytes(&digit_buf[..digits])
}

/// Enum of encoding errors.
#[non_exhaustive]
#[derive(Debug, PartialEq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    #[snafu(display("{field:?} value {value:#04x} does not fit the frame layout"))]
    FieldOverflow { field: Field, value: u8 },
    #[snafu(display("Frame of {len} bytes does not fit the frame buffer"))]
    BufferFull { len: usize },
}

use core::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use snafu::Snafu;

use crate::{MAX_PREFIX_LEN, SEPARATOR, TERMINATOR};

mod command;
pub use command::*;

mod encode;
pub use encode::*;

mod pin_mask;
pub use pin_mask::*;

/// Number of hex digits carrying the unit address.
const ADDRESS_DIGITS: usize = 4;
/// Number of hex digits carrying the checksum.
const CHECKSUM_DIGITS: usize = 2;

/// Frame layouts, keyed by the length of the frame string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FrameFormat {
    /// `AAAAP`
    AddressPin = 5,
    /// `AAAAPPC`
    AddressPinCommand = 7,
    /// `AAAAP:RR`
    AddressPinChecksum = 8,
    /// `AAAAPPC:RR`
    AddressPinCommandChecksum = 10,
}

impl FrameFormat {
    /// Selects the layout for a frame string of `len` bytes.
    pub fn from_len(len: usize) -> Result<Self, DecodeError> {
        u8::try_from(len)
            .ok()
            .and_then(|len| FrameFormat::try_from(len).ok())
            .ok_or(DecodeError::BadLength { len })
    }

    /// Length of the frame string.
    pub const fn len(self) -> usize {
        self as usize
    }

    /// Number of hex digits carrying the pin mask.
    pub const fn pin_digits(self) -> usize {
        match self {
            FrameFormat::AddressPin | FrameFormat::AddressPinChecksum => 1,
            FrameFormat::AddressPinCommand | FrameFormat::AddressPinCommandChecksum => 2,
        }
    }

    pub const fn has_command(self) -> bool {
        matches!(
            self,
            FrameFormat::AddressPinCommand | FrameFormat::AddressPinCommandChecksum
        )
    }

    pub const fn has_checksum(self) -> bool {
        matches!(
            self,
            FrameFormat::AddressPinChecksum | FrameFormat::AddressPinCommandChecksum
        )
    }

    /// Length of the checksum-relevant prefix, i.e. the offset of the separator.
    pub const fn prefix_len(self) -> usize {
        ADDRESS_DIGITS + self.pin_digits() + self.has_command() as usize
    }
}

/// Struct for configuring the frame decoder.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderConfig {
    /// Reject numeric fields holding non-hex characters instead of reading them as 0.
    /// Default is `false`, which matches what deployed units do.
    pub strict_hex: bool,
}

impl DecoderConfig {
    pub const fn default() -> Self {
        Self { strict_hex: false }
    }

    pub const fn with_strict_hex(mut self, strict_hex: bool) -> Self {
        self.strict_hex = strict_hex;
        self
    }
}

/// A decoded command frame.
///
/// Only ever produced by a successful decode (or built by a sender through
/// [`CommandFrame::new`]), so its fields never hold leftovers from a rejected frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFrame {
    /// Full unit address
    pub address: u16,
    /// High byte of the address, as written on the wire
    pub high_byte: u8,
    /// Low byte of the address, as written on the wire
    pub low_byte: u8,
    /// Bitmap of the actuation lines the command applies to
    pub pin_mask: u8,
    /// Action code, see [`CommandCode`]
    pub command: u8,
    /// Checksum claimed by the sender, 0 for layouts without one
    pub checksum: u16,
    format: Option<FrameFormat>,
    prefix: [u8; MAX_PREFIX_LEN],
    prefix_len: usize,
}

impl CommandFrame {
    pub(crate) const fn empty() -> Self {
        Self {
            address: 0,
            high_byte: 0,
            low_byte: 0,
            pin_mask: 0,
            command: 0,
            checksum: 0,
            format: None,
            prefix: [TERMINATOR; MAX_PREFIX_LEN],
            prefix_len: 0,
        }
    }

    /// Decodes a frame string with the default (lenient) configuration.
    ///
    /// The input is read up to its first NUL byte, if any.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with(raw, &DecoderConfig::default())
    }

    /// Decodes a frame string.
    ///
    /// Non-hex characters in a numeric field make that field read as 0 unless
    /// `config.strict_hex` is set. The lenient reading lets a corrupted digit slip through
    /// to the checksum stage, so prefer a checksummed layout on noisy links.
    pub fn decode_with(raw: &[u8], config: &DecoderConfig) -> Result<Self, DecodeError> {
        let len = raw
            .iter()
            .position(|&b| b == TERMINATOR)
            .unwrap_or(raw.len());
        let data = &raw[..len];

        let format = FrameFormat::from_len(len)?;
        let strict = config.strict_hex;
        let prefix_len = format.prefix_len();
        let pin_end = ADDRESS_DIGITS + format.pin_digits();

        let checksum = if format.has_checksum() {
            match data[prefix_len] {
                SEPARATOR => parse_hex(
                    &data[prefix_len + 1..prefix_len + 1 + CHECKSUM_DIGITS],
                    strict,
                )?,
                found => return Err(DecodeError::BadSeparator { found }),
            }
        } else {
            0
        };

        let mut frame = Self::empty();
        frame.address = parse_hex(&data[..ADDRESS_DIGITS], strict)?;
        frame.high_byte = parse_hex(&data[..2], strict)? as u8;
        frame.low_byte = parse_hex(&data[2..ADDRESS_DIGITS], strict)? as u8;
        frame.pin_mask = parse_hex(&data[ADDRESS_DIGITS..pin_end], strict)? as u8;
        if format.has_command() {
            frame.command = parse_hex(&data[pin_end..pin_end + 1], strict)? as u8;
        }
        frame.checksum = checksum;
        frame.format = Some(format);
        frame.set_prefix(&data[..prefix_len]);

        Ok(frame)
    }

    /// Layout the frame was decoded from, `None` for frames built with [`CommandFrame::new`].
    pub fn format(&self) -> Option<FrameFormat> {
        self.format
    }

    /// The checksum-relevant prefix of the frame string.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix[..self.prefix_len.min(MAX_PREFIX_LEN)]
    }

    /// Interprets the command field.
    pub fn command_code(&self) -> Option<CommandCode> {
        CommandCode::try_from(self.command).ok()
    }

    pub(crate) fn set_prefix(&mut self, prefix: &[u8]) {
        let len = prefix.len().min(MAX_PREFIX_LEN);
        self.prefix[..len].copy_from_slice(&prefix[..len]);
        self.prefix_len = len;
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Addr: {:04X} Pin: {:02X} Cmd: {:X} CRC: {:02X}",
            self.address, self.pin_mask, self.command, self.checksum
        )
    }
}

/// Reads a run of hex digits.
///
/// A non-hex byte makes the whole field read as 0, or fails in strict mode.
fn parse_hex(digits: &[u8], strict: bool) -> Result<u16, DecodeError> {
    let mut value = 0u16;

    for &byte in digits {
        match (byte as char).to_digit(16) {
            Some(nibble) => value = (value << 4) | nibble as u16,
            None if strict => return Err(DecodeError::InvalidHex { byte }),
            None => return Ok(0),
        }
    }

    Ok(value)
}

/// Enum of decoding errors.
#[non_exhaustive]
#[derive(Debug, PartialEq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    #[snafu(display("Invalid frame length {len}, should be 5, 7, 8 or 10"))]
    BadLength { len: usize },
    #[snafu(display("Expected separator ':' before the checksum, got {found:#04x}"))]
    BadSeparator { found: u8 },
    #[snafu(display("Invalid hex digit {byte:#04x}"))]
    InvalidHex { byte: u8 },
}

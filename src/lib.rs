//! This crate provides a `no-std` decoder and validator for the OneWay ASCII command protocol,
//! used to drive addressable slave units over a low bit-rate serial/radio link.
//!
//! A frame on the wire is a sync preamble (`xx`) followed by a short hex string:
//!
//! | Length | Layout       |
//! |--------|--------------|
//! | 5      | `AAAAP`      |
//! | 7      | `AAAAPPC`    |
//! | 8      | `AAAAP:RR`   |
//! | 10     | `AAAAPPC:RR` |
//!
//! where `A` is the unit address, `P` the pin mask, `C` the command and `RR` the checksum.
//!
//! # Usage
//! ### Frame Validation
//! ```rust
//! use oneway::{ChecksumAlgorithm, FrameValidator, ScannerConfig, SyncScanner};
//!
//! let mut scanner = SyncScanner::new(ScannerConfig::default());
//! let mut validator = FrameValidator::default();
//!
//! let mut frames = scanner.iter_frames(b"noisexx0123011:DE");
//! let mut raw = frames.next().expect("frame expected");
//! let frame = validator
//!     .validate(&mut raw, ChecksumAlgorithm::Crc8Ibutton)
//!     .expect("valid frame");
//!
//! assert_eq!(frame.address, 0x0123);
//! assert_eq!(frame.pin_mask, 0x01);
//! assert_eq!(frame.command, 0x1);
//! ```
//! ### Frame Encoding
//! ```rust
//! use oneway::{ChecksumAlgorithm, CommandFrame, FrameFormat};
//!
//! let frame = CommandFrame::new(0x0123, 0x01, 0x1);
//! let raw = frame
//!     .encode(FrameFormat::AddressPinCommandChecksum, ChecksumAlgorithm::Crc8Ibutton)
//!     .unwrap();
//! assert_eq!(raw.as_slice(), b"0123011:DE");
//! ```

#![no_std]

#[macro_use]
mod fmt;

mod address;
pub use address::*;

mod buffer;
pub use buffer::*;

mod channel;
pub use channel::*;

mod checksum;
pub use checksum::*;

mod frame;
pub use frame::*;

mod raw_frame;
pub use raw_frame::*;

mod receiver;
pub use receiver::*;

mod scanner;
pub use scanner::*;

mod validator;
pub use validator::*;

/// Marker byte making up the sync preamble.
pub const SYNC_MARKER: u8 = b'x';
/// Separator between the checksum-relevant prefix and the checksum digits.
pub const SEPARATOR: u8 = b':';
/// String terminator written into a cleared frame buffer.
pub const TERMINATOR: u8 = 0;

/// Longest frame layout (`AAAAPPC:RR`).
pub const MAX_FRAME_LEN: usize = 10;
/// Longest checksum-relevant prefix (`AAAAPPC`).
pub const MAX_PREFIX_LEN: usize = 7;
/// Capacity of a raw frame buffer, large enough for a frame behind a preamble.
pub const MAX_RAW_LEN: usize = 16;

/// Address every unit answers to.
pub const BROADCAST_ADDRESS: u16 = 0xFFFF;
/// Address of a unit with no valid persisted address.
pub const UNCONFIGURED_ADDRESS: u16 = 0x0000;

pub(crate) const CRC8: crc::Crc<u8> = crc::Crc::<u8>::new(&crc::CRC_8_MAXIM_DOW);

use snafu::Snafu;

use crate::{CommandFrame, CRC8};

/// Polynomial of the per-field bit-serial CRC.
const ONE_NET_POLY: u8 = 0xA6;
/// Seed of the first field in a bit-serial CRC chain.
pub const ONE_NET_SEED: u8 = 0xFF;

/// Checksum conventions deployed on the link.
///
/// Both are in use in the field, so the caller must state which one a given link runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumAlgorithm {
    /// Dallas/Maxim "iButton" CRC-8 over the ASCII prefix, seeded with 0.
    #[default]
    Crc8Ibutton,
    /// Bit-serial CRC (poly `0xA6`) over the address bytes, pin mask and command.
    BitwiseCrc16,
}

impl ChecksumAlgorithm {
    /// Computes the checksum a sender would have attached to `frame`.
    ///
    /// Frames built with [`CommandFrame::new`] are checksummed as the `AAAAPPC:RR` layout.
    pub fn compute(&self, frame: &CommandFrame) -> u8 {
        match self {
            ChecksumAlgorithm::Crc8Ibutton => crc8_ibutton(frame.prefix()),
            ChecksumAlgorithm::BitwiseCrc16 => bitwise_crc(&[
                frame.high_byte,
                frame.low_byte,
                frame.pin_mask,
                frame.command,
            ]),
        }
    }
}

/// iButton CRC-8 of `data`.
pub fn crc8_ibutton(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Feeds one byte MSB-first through the bit-serial CRC starting from `seed`.
pub fn one_net_crc(data: u8, seed: u8) -> u8 {
    let mut crc = seed;
    let mut mask = 0x80u8;

    while mask != 0 {
        let mut feedback = crc & 0x80 != 0;
        crc <<= 1;

        if data & mask != 0 {
            feedback = !feedback;
        }

        if feedback {
            crc ^= ONE_NET_POLY;
        }

        mask >>= 1;
    }

    crc
}

/// Chains [`one_net_crc`] over `fields`, seeding the first with [`ONE_NET_SEED`].
pub fn bitwise_crc(fields: &[u8]) -> u8 {
    fields
        .iter()
        .fold(ONE_NET_SEED, |crc, &field| one_net_crc(field, crc))
}

/// Enum of checksum errors.
#[non_exhaustive]
#[derive(Debug, PartialEq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChecksumError {
    #[snafu(display("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}"))]
    Mismatch { expected: u16, actual: u16 },
}

#[cfg(test)]
mod tests {
    use crate::{bitwise_crc, crc8_ibutton, one_net_crc, ChecksumAlgorithm, CommandFrame};

    #[test]
    fn test_crc8_ibutton_check_value() {
        assert_eq!(crc8_ibutton(b"123456789"), 0xA1);
        assert_eq!(crc8_ibutton(b""), 0x00);
    }

    #[test]
    fn test_crc8_ibutton_prefixes() {
        assert_eq!(crc8_ibutton(b"0123011"), 0xDE);
        assert_eq!(crc8_ibutton(b"01231"), 0x4A);
        assert_eq!(crc8_ibutton(b"FFFF1"), 0xAD);
    }

    #[test]
    fn test_crc8_ibutton_is_pure_and_bit_sensitive() {
        let first = crc8_ibutton(b"0123011");
        assert_eq!(first, crc8_ibutton(b"0123011"));

        // '1' (0x31) -> '0' (0x30) flips a single bit
        assert_ne!(first, crc8_ibutton(b"0123010"));
    }

    #[test]
    fn test_bitwise_crc_reference_vector() {
        let chained = bitwise_crc(&[0xFF, 0xDF, 0xCF, 0x0E]);
        assert_eq!(chained, 0x24);

        let mut crc = one_net_crc(0xFF, 0xFF);
        crc = one_net_crc(0xDF, crc);
        crc = one_net_crc(0xCF, crc);
        crc = one_net_crc(0x0E, crc);
        assert_eq!(crc, chained);
    }

    #[test]
    fn test_bitwise_crc_is_pure_and_bit_sensitive() {
        let first = bitwise_crc(&[0x01, 0x23, 0x01, 0x01]);
        assert_eq!(first, bitwise_crc(&[0x01, 0x23, 0x01, 0x01]));
        assert_eq!(first, 0x00);

        assert_eq!(bitwise_crc(&[0x01, 0x23, 0x01, 0x00]), 0xA6);
        assert_eq!(bitwise_crc(&[0x12, 0x34, 0x0F, 0x01]), 0x44);
    }

    #[test]
    fn test_algorithm_compute_uses_the_right_inputs() {
        let frame = CommandFrame::decode(b"0123011:DE").unwrap();

        assert_eq!(ChecksumAlgorithm::Crc8Ibutton.compute(&frame), 0xDE);
        assert_eq!(ChecksumAlgorithm::BitwiseCrc16.compute(&frame), 0x00);
    }

    #[test]
    fn test_algorithm_compute_on_built_frame() {
        let frame = CommandFrame::new(0x0123, 0x01, 0x1);

        assert_eq!(ChecksumAlgorithm::Crc8Ibutton.compute(&frame), 0xDE);
        assert_eq!(ChecksumAlgorithm::BitwiseCrc16.compute(&frame), 0x00);
    }
}

use snafu::Snafu;

use crate::{ChecksumAlgorithm, ChecksumError, CommandFrame, DecodeError, DecoderConfig, RawFrame};

/// Represents the state machine validating one frame
///
/// +----------+   +-----------------+   +----------+
/// | Decoding |-->| ChecksumPending |-->| Accepted |
/// +----------+   +-----------------+   +----------+
///       |          |        |                ^
///       |          |        +----------------+ (no checksum field)
///       v          v
/// +----------------------+
/// |       Rejected       |
/// +----------------------+
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationState {
    Decoding,
    ChecksumPending,
    Accepted,
    Rejected,
}

/// Decodes and integrity-checks raw frames.
#[derive(Debug)]
pub struct FrameValidator {
    config: DecoderConfig,
    state: ValidationState,
}

impl Default for FrameValidator {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl FrameValidator {
    pub const fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            state: ValidationState::Decoding,
        }
    }

    /// State reached by the last call to [`validate`](FrameValidator::validate).
    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Validates `raw` using the checksum convention of the link.
    ///
    /// On success `raw` is cut down to the checksum-relevant prefix. On failure it is
    /// cleared, so its bytes cannot be picked up again.
    pub fn validate(
        &mut self,
        raw: &mut RawFrame,
        algorithm: ChecksumAlgorithm,
    ) -> Result<CommandFrame, ValidationError> {
        self.state = ValidationState::Decoding;

        match self.check(raw, algorithm) {
            Ok(frame) => {
                self.state = ValidationState::Accepted;
                raw.truncate(frame.prefix().len());
                debug!("frame accepted for address {:#x}", frame.address);
                Ok(frame)
            }
            Err(err) => {
                self.state = ValidationState::Rejected;
                raw.clear();
                debug!("frame rejected: {:?}", err);
                Err(err)
            }
        }
    }

    fn check(
        &mut self,
        raw: &RawFrame,
        algorithm: ChecksumAlgorithm,
    ) -> Result<CommandFrame, ValidationError> {
        let frame = raw.to_frame_with(&self.config)?;

        if frame.format().is_some_and(|format| format.has_checksum()) {
            self.state = ValidationState::ChecksumPending;

            let actual = algorithm.compute(&frame) as u16;
            if actual != frame.checksum {
                return Err(ChecksumError::Mismatch {
                    expected: frame.checksum,
                    actual,
                }
                .into());
            }
        }

        Ok(frame)
    }
}

/// Enum of validation errors.
#[non_exhaustive]
#[derive(Debug, PartialEq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    #[snafu(context(false), display("Malformed frame: {source}"))]
    Decode { source: DecodeError },
    #[snafu(context(false), display("Corrupted frame: {source}"))]
    Checksum { source: ChecksumError },
}

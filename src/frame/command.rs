use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Command codes carried in the `C` digit of a frame.
///
/// Two encodings of on/off coexist on deployed links.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandCode {
    Off = 0,
    On = 1,
    AltOn = 2,
    AltOff = 3,
}

/// Output state requested for the selected lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Switch {
    On,
    Off,
}

impl CommandCode {
    pub fn switch(self) -> Switch {
        match self {
            CommandCode::On | CommandCode::AltOn => Switch::On,
            CommandCode::Off | CommandCode::AltOff => Switch::Off,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{CommandCode, Switch};

    #[test]
    fn test_command_code_switch() {
        assert_eq!(CommandCode::try_from(0).unwrap().switch(), Switch::Off);
        assert_eq!(CommandCode::try_from(1).unwrap().switch(), Switch::On);
        assert_eq!(CommandCode::try_from(2).unwrap().switch(), Switch::On);
        assert_eq!(CommandCode::try_from(3).unwrap().switch(), Switch::Off);
        assert!(CommandCode::try_from(4).is_err());
        assert_eq!(u8::from(CommandCode::AltOn), 2);
    }
}

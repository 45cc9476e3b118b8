use bitfields::bitfield;

/// Actuation lines selected by a frame's pin field.
///
/// Units drive four lines; the upper nibble only exists in the two-digit layouts and
/// is carried through untouched.
#[bitfield(u8)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMask {
    pub line0: bool,
    pub line1: bool,
    pub line2: bool,
    pub line3: bool,
    #[bits(4)]
    pub upper: u8,
}

impl PinMask {
    /// Number of actuation lines on a unit.
    pub const LINES: usize = 4;

    /// Selection state of each line, line 0 first.
    pub fn lines(&self) -> [bool; Self::LINES] {
        [self.line0(), self.line1(), self.line2(), self.line3()]
    }

    /// Whether `line` is selected. Lines past the fourth never are.
    pub fn is_selected(&self, line: usize) -> bool {
        self.lines().get(line).copied().unwrap_or(false)
    }
}

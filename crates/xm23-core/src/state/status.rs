/// `PSW` bit for carry.
pub const PSW_C: u16 = 1 << 0;
/// `PSW` bit for zero result.
pub const PSW_Z: u16 = 1 << 1;
/// `PSW` bit for negative result.
pub const PSW_N: u16 = 1 << 2;
/// `PSW` bit for sleep state.
pub const PSW_SLP: u16 = 1 << 3;
/// `PSW` bit for signed overflow.
pub const PSW_V: u16 = 1 << 4;
/// Shift of the 3-bit current priority field.
pub const PSW_CURRENT_SHIFT: u16 = 5;
/// `PSW` bit for the fault-in-progress marker.
pub const PSW_FLT: u16 = 1 << 8;
/// Shift of the 3-bit previous priority field.
pub const PSW_PREVIOUS_SHIFT: u16 = 13;
/// Width mask of a priority field before shifting.
pub const PRIORITY_MASK: u16 = 0b111;
/// Every architecturally defined `PSW` bit; bits 9..12 are reserved.
pub const PSW_DEFINED_MASK: u16 = PSW_C
    | PSW_Z
    | PSW_N
    | PSW_SLP
    | PSW_V
    | (PRIORITY_MASK << PSW_CURRENT_SHIFT)
    | PSW_FLT
    | (PRIORITY_MASK << PSW_PREVIOUS_SHIFT);

/// Single-bit `PSW` flags addressable from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StatusFlag {
    /// Carry out of the most significant bit.
    Carry,
    /// Result was zero.
    Zero,
    /// Result sign bit was set.
    Negative,
    /// Sleep state.
    Sleep,
    /// Signed overflow.
    Overflow,
    /// Fault in progress.
    Fault,
}

impl StatusFlag {
    /// Every flag in `PSW` bit order.
    pub const ALL: [Self; 6] = [
        Self::Carry,
        Self::Zero,
        Self::Negative,
        Self::Sleep,
        Self::Overflow,
        Self::Fault,
    ];

    /// `PSW` bit for this flag.
    #[must_use]
    pub const fn mask(self) -> u16 {
        match self {
            Self::Carry => PSW_C,
            Self::Zero => PSW_Z,
            Self::Negative => PSW_N,
            Self::Sleep => PSW_SLP,
            Self::Overflow => PSW_V,
            Self::Fault => PSW_FLT,
        }
    }
}

/// Processor status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusWord {
    bits: u16,
}

impl StatusWord {
    /// Unpacks a raw word, dropping reserved bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self {
            bits: bits & PSW_DEFINED_MASK,
        }
    }

    /// Packed 16-bit representation.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.bits
    }

    /// Returns `true` when `flag` is set.
    #[must_use]
    pub const fn flag(self, flag: StatusFlag) -> bool {
        self.bits & flag.mask() != 0
    }

    /// Sets or clears `flag`.
    pub const fn set_flag(&mut self, flag: StatusFlag, enabled: bool) {
        if enabled {
            self.bits |= flag.mask();
        } else {
            self.bits &= !flag.mask();
        }
    }

    /// Carry flag.
    #[must_use]
    pub const fn carry(self) -> bool {
        self.flag(StatusFlag::Carry)
    }

    /// Zero flag.
    #[must_use]
    pub const fn zero(self) -> bool {
        self.flag(StatusFlag::Zero)
    }

    /// Negative flag.
    #[must_use]
    pub const fn negative(self) -> bool {
        self.flag(StatusFlag::Negative)
    }

    /// Overflow flag.
    #[must_use]
    pub const fn overflow(self) -> bool {
        self.flag(StatusFlag::Overflow)
    }

    /// Current priority (0..=7).
    #[must_use]
    pub const fn current_priority(self) -> u8 {
        ((self.bits >> PSW_CURRENT_SHIFT) & PRIORITY_MASK) as u8
    }

    /// Sets the current priority; only the low 3 bits are kept.
    pub const fn set_current_priority(&mut self, priority: u8) {
        self.set_field(PSW_CURRENT_SHIFT, priority);
    }

    /// Previous priority (0..=7).
    #[must_use]
    pub const fn previous_priority(self) -> u8 {
        ((self.bits >> PSW_PREVIOUS_SHIFT) & PRIORITY_MASK) as u8
    }

    /// Sets the previous priority; only the low 3 bits are kept.
    pub const fn set_previous_priority(&mut self, priority: u8) {
        self.set_field(PSW_PREVIOUS_SHIFT, priority);
    }

    const fn set_field(&mut self, shift: u16, value: u8) {
        self.bits &= !(PRIORITY_MASK << shift);
        self.bits |= (value as u16 & PRIORITY_MASK) << shift;
    }
}

#[cfg(test)]
mod tests {
    use super::{StatusFlag, StatusWord, PSW_DEFINED_MASK};

    #[test]
    fn flags_can_be_set_and_cleared_individually() {
        let mut psw = StatusWord::default();

        for flag in StatusFlag::ALL {
            psw.set_flag(flag, true);
            assert!(psw.flag(flag));
        }
        for flag in StatusFlag::ALL {
            psw.set_flag(flag, false);
            assert!(!psw.flag(flag));
        }
        assert_eq!(psw.bits(), 0);
    }

    #[test]
    fn packed_layout_matches_architecture() {
        let mut psw = StatusWord::default();
        psw.set_flag(StatusFlag::Carry, true);
        psw.set_flag(StatusFlag::Overflow, true);
        psw.set_current_priority(0b101);
        psw.set_previous_priority(0b011);
        psw.set_flag(StatusFlag::Fault, true);

        assert_eq!(psw.bits(), 0b0110_0001_1011_0001);
        assert_eq!(StatusWord::from_bits(psw.bits()), psw);
    }

    #[test]
    fn reserved_bits_are_dropped_on_unpack() {
        let psw = StatusWord::from_bits(0xFFFF);
        assert_eq!(psw.bits(), PSW_DEFINED_MASK);
        assert_eq!(psw.bits() & 0x1E00, 0);
        assert_eq!(psw.current_priority(), 7);
        assert_eq!(psw.previous_priority(), 7);
    }

    #[test]
    fn priority_setters_truncate_to_three_bits() {
        let mut psw = StatusWord::default();
        psw.set_current_priority(0xFF);
        assert_eq!(psw.current_priority(), 7);
        assert!(!psw.carry());
        assert!(!psw.flag(StatusFlag::Fault));
    }
}

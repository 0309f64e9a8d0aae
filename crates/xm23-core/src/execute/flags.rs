//! Status-word update behaviors for different instruction classes.

use crate::memory::Width;
use crate::state::{StatusFlag, StatusWord};

/// Carry out, indexed by `[src_msb][dst_msb][result_msb]`.
pub const CARRY_TABLE: [[[bool; 2]; 2]; 2] = [
    [[false, false], [true, false]],
    [[true, false], [true, true]],
];

/// Signed overflow, indexed by `[src_msb][dst_msb][result_msb]`.
pub const OVERFLOW_TABLE: [[[bool; 2]; 2]; 2] = [
    [[false, true], [false, false]],
    [[false, false], [true, false]],
];

/// Describes how the status word should be updated after an instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// No change.
    #[default]
    None,
    /// Update `Z` and `N`; `C` and `V` keep their values.
    ZeroNegative {
        /// Zero flag.
        zero: bool,
        /// Negative flag.
        negative: bool,
    },
    /// Update `C`, `Z` and `N`; `V` keeps its value.
    CarryZeroNegative {
        /// Carry flag.
        carry: bool,
        /// Zero flag.
        zero: bool,
        /// Negative flag.
        negative: bool,
    },
    /// Update all four arithmetic flags.
    Arithmetic {
        /// Carry flag.
        carry: bool,
        /// Zero flag.
        zero: bool,
        /// Negative flag.
        negative: bool,
        /// Overflow flag.
        overflow: bool,
    },
}

impl FlagsUpdate {
    /// Writes the selected flags into `psw`.
    pub const fn apply(self, psw: &mut StatusWord) {
        match self {
            Self::None => {}
            Self::ZeroNegative { zero, negative } => {
                psw.set_flag(StatusFlag::Zero, zero);
                psw.set_flag(StatusFlag::Negative, negative);
            }
            Self::CarryZeroNegative {
                carry,
                zero,
                negative,
            } => {
                psw.set_flag(StatusFlag::Carry, carry);
                psw.set_flag(StatusFlag::Zero, zero);
                psw.set_flag(StatusFlag::Negative, negative);
            }
            Self::Arithmetic {
                carry,
                zero,
                negative,
                overflow,
            } => {
                psw.set_flag(StatusFlag::Carry, carry);
                psw.set_flag(StatusFlag::Zero, zero);
                psw.set_flag(StatusFlag::Negative, negative);
                psw.set_flag(StatusFlag::Overflow, overflow);
            }
        }
    }
}

const fn msb(value: u16, width: Width) -> usize {
    (value & width.sign_mask() != 0) as usize
}

/// `Z`/`N` for a result at `width`.
#[must_use]
pub const fn zero_negative(result: u16, width: Width) -> FlagsUpdate {
    FlagsUpdate::ZeroNegative {
        zero: result & width.value_mask() == 0,
        negative: result & width.sign_mask() != 0,
    }
}

/// `C`/`Z`/`N` for a result at `width` with an explicit carry.
#[must_use]
pub const fn carry_zero_negative(carry: bool, result: u16, width: Width) -> FlagsUpdate {
    FlagsUpdate::CarryZeroNegative {
        carry,
        zero: result & width.value_mask() == 0,
        negative: result & width.sign_mask() != 0,
    }
}

/// Full flag set for an adder pass, looked up from the operand and result sign bits.
///
/// `src` is the operand actually fed to the adder (already complemented for
/// subtraction).
#[must_use]
pub const fn arithmetic(src: u16, dst: u16, result: u16, width: Width) -> FlagsUpdate {
    let (s, d, r) = (msb(src, width), msb(dst, width), msb(result, width));
    FlagsUpdate::Arithmetic {
        carry: CARRY_TABLE[s][d][r],
        zero: result & width.value_mask() == 0,
        negative: r == 1,
        overflow: OVERFLOW_TABLE[s][d][r],
    }
}

#[cfg(test)]
mod tests {
    use super::{arithmetic, zero_negative, FlagsUpdate};
    use crate::memory::Width;
    use crate::state::{StatusFlag, StatusWord};

    #[test]
    fn zero_negative_update_leaves_carry_and_overflow() {
        let mut psw = StatusWord::default();
        psw.set_flag(StatusFlag::Carry, true);
        psw.set_flag(StatusFlag::Overflow, true);

        zero_negative(0x0080, Width::Byte).apply(&mut psw);
        assert!(psw.carry());
        assert!(psw.overflow());
        assert!(psw.negative());
        assert!(!psw.zero());
    }

    #[test]
    fn byte_width_ignores_high_byte_for_zero() {
        assert_eq!(
            zero_negative(0xFF00, Width::Byte),
            FlagsUpdate::ZeroNegative {
                zero: true,
                negative: false,
            }
        );
    }

    #[test]
    fn signed_overflow_into_sign_bit() {
        assert_eq!(
            arithmetic(0x0001, 0x7FFF, 0x8000, Width::Word),
            FlagsUpdate::Arithmetic {
                carry: false,
                zero: false,
                negative: true,
                overflow: true,
            }
        );
    }

    #[test]
    fn none_update_is_a_no_op() {
        let mut psw = StatusWord::from_bits(0x001F);
        FlagsUpdate::None.apply(&mut psw);
        assert_eq!(psw.bits(), 0x001F);
    }
}

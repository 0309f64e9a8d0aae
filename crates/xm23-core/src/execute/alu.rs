//! Arithmetic unit: binary and decimal adders, logic operations and the
//! single-register shifts.
//!
//! Every function here is pure. Byte-width results only replace the low byte
//! of the destination; the high byte is carried over unchanged.

use super::flags::{self, FlagsUpdate};
use crate::decoder::{AluOp, UnaryOp};
use crate::memory::Width;

/// Result of one arithmetic-unit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    /// New destination value, or `None` when the result is discarded.
    pub value: Option<u16>,
    /// Status-word update.
    pub flags: FlagsUpdate,
    /// Adder passes consumed.
    pub adder_passes: u32,
    /// Decimal digits processed.
    pub bcd_digits: u32,
}

impl AluResult {
    const fn logic(value: Option<u16>, result: u16, width: Width) -> Self {
        Self {
            value,
            flags: flags::zero_negative(result, width),
            adder_passes: 0,
            bcd_digits: 0,
        }
    }
}

/// Binary add of `src + dst + carry_in` at `width`.
///
/// Returns the merged destination value and the full flag update.
#[must_use]
pub const fn add_with_carry(src: u16, dst: u16, carry_in: bool, width: Width) -> (u16, FlagsUpdate) {
    let mask = width.value_mask();
    let sum = (dst & mask)
        .wrapping_add(src & mask)
        .wrapping_add(carry_in as u16)
        & mask;
    (
        width.merge(dst, sum),
        flags::arithmetic(src, dst, sum, width),
    )
}

/// Packed-decimal add of `src + dst + carry_in`, one nibble per digit.
///
/// Returns the merged destination value and the final decimal carry.
#[must_use]
pub const fn bcd_add(src: u16, dst: u16, carry_in: bool, width: Width) -> (u16, bool) {
    let mut carry = carry_in;
    let mut result = dst;
    let mut digit = 0;
    while digit < width.nibbles() {
        let shift = digit * 4;
        let mut sum = ((src >> shift) & 0xF) + ((dst >> shift) & 0xF) + carry as u16;
        carry = sum > 9;
        if carry {
            sum -= 10;
        }
        result = (result & !(0xF << shift)) | ((sum & 0xF) << shift);
        digit += 1;
    }
    (result, carry)
}

/// Single-bit mask for `BIT`/`BIC`/`BIS`; positions past bit 15 give zero.
#[must_use]
pub fn bit_mask(position: u16, width: Width) -> u16 {
    if width == Width::Byte && position > 7 {
        tracing::warn!(
            position,
            "bit position beyond the low byte in a byte operation"
        );
    }
    1u16.checked_shl(u32::from(position)).unwrap_or(0)
}

/// Runs a two-operand operation.
#[must_use]
pub fn execute(op: AluOp, src: u16, dst: u16, carry: bool, width: Width) -> AluResult {
    match op {
        AluOp::Add | AluOp::Addc | AluOp::Sub | AluOp::Subc | AluOp::Cmp => {
            let (operand, carry_in) = match op {
                AluOp::Add => (src, false),
                AluOp::Addc => (src, carry),
                AluOp::Sub | AluOp::Cmp => (!src, true),
                _ => (!src, carry),
            };
            let (value, flags) = add_with_carry(operand, dst, carry_in, width);
            AluResult {
                value: (!op.discards_result()).then_some(value),
                flags,
                adder_passes: 1,
                bcd_digits: 0,
            }
        }
        AluOp::Dadd => {
            let (value, carry_out) = bcd_add(src, dst, carry, width);
            AluResult {
                value: Some(value),
                flags: flags::carry_zero_negative(carry_out, value, width),
                adder_passes: 0,
                bcd_digits: width.nibbles(),
            }
        }
        AluOp::Xor => {
            let result = width.merge(dst, dst ^ src);
            AluResult::logic(Some(result), result, width)
        }
        AluOp::And => {
            let result = width.merge(dst, dst & src);
            AluResult::logic(Some(result), result, width)
        }
        AluOp::Or => {
            let result = width.merge(dst, dst | src);
            AluResult::logic(Some(result), result, width)
        }
        AluOp::Bit => AluResult::logic(None, dst & bit_mask(src, width), width),
        AluOp::Bic => {
            let result = width.merge(dst, dst & !bit_mask(src, width));
            AluResult::logic(Some(result), result, width)
        }
        AluOp::Bis => {
            let result = width.merge(dst, dst | bit_mask(src, width));
            AluResult::logic(Some(result), result, width)
        }
    }
}

/// Runs a single-register operation.
#[must_use]
pub const fn execute_unary(op: UnaryOp, dst: u16, carry: bool, width: Width) -> AluResult {
    let low = dst & width.value_mask();
    let sign = width.sign_mask();
    let (value, flags) = match op {
        UnaryOp::Sra => {
            let shifted = width.merge(dst, (low >> 1) | (low & sign));
            (
                shifted,
                flags::carry_zero_negative(low & 1 != 0, shifted, width),
            )
        }
        UnaryOp::Rrc => {
            let incoming = if carry { sign } else { 0 };
            let rotated = width.merge(dst, (low >> 1) | incoming);
            (
                rotated,
                flags::carry_zero_negative(low & 1 != 0, rotated, width),
            )
        }
        UnaryOp::Comp => {
            let complemented = width.merge(dst, !dst);
            (complemented, flags::zero_negative(complemented, width))
        }
        UnaryOp::Swpb => (dst.swap_bytes(), FlagsUpdate::None),
        UnaryOp::Sxt => ((dst as u8 as i8) as i16 as u16, FlagsUpdate::None),
    };
    AluResult {
        value: Some(value),
        flags,
        adder_passes: 0,
        bcd_digits: 0,
    }
}

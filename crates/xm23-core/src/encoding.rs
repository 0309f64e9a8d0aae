/// Top-level instruction groups selected by the leading opcode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum InstructionGroup {
    BranchLink,
    ConditionalBranch,
    RegisterOperation,
    IndexedMemory,
    MoveImmediate,
    RelativeMemory,
}

/// Classifies a word by bits 15..12.
#[must_use]
pub const fn classify_group(word: u16) -> InstructionGroup {
    match (
        bit(word, 15),
        bit(word, 14),
        bit(word, 13),
        bit(word, 12),
    ) {
        (true, _, _, _) => InstructionGroup::RelativeMemory,
        (false, false, false, _) => InstructionGroup::BranchLink,
        (false, false, true, _) => InstructionGroup::ConditionalBranch,
        (false, true, true, _) => InstructionGroup::MoveImmediate,
        (false, true, false, false) => InstructionGroup::RegisterOperation,
        (false, true, false, true) => InstructionGroup::IndexedMemory,
    }
}

/// Magnitude bits of a conditional-branch displacement (sign bit at 9).
pub const BRANCH_MAGNITUDE_BITS: u16 = 9;
/// Magnitude bits of a `BL` displacement (sign bit at 12).
pub const LINK_MAGNITUDE_BITS: u16 = 12;

/// Returns bit `pos` of `word`.
#[must_use]
pub const fn bit(word: u16, pos: u16) -> bool {
    (word >> pos) & 1 != 0
}

/// Destination register field (bits 2..0).
#[must_use]
pub const fn dst_field(word: u16) -> u8 {
    (word & 0x7) as u8
}

/// Source register or constant field (bits 5..3).
#[must_use]
pub const fn src_field(word: u16) -> u8 {
    ((word >> 3) & 0x7) as u8
}

/// Width bit (bit 6); set selects a byte operation.
#[must_use]
pub const fn width_bit(word: u16) -> bool {
    bit(word, 6)
}

/// Register/constant bit (bit 7); set selects the constant table.
#[must_use]
pub const fn constant_bit(word: u16) -> bool {
    bit(word, 7)
}

/// Arithmetic/logic selector: bits 10..8, plus 8 for the bit-11 group.
#[must_use]
pub const fn alu_code(word: u16) -> u8 {
    if bit(word, 11) {
        8 + ((word >> 8) & 0x3) as u8
    } else {
        ((word >> 8) & 0x7) as u8
    }
}

/// Branch condition selector (bits 12..10).
#[must_use]
pub const fn condition_code(word: u16) -> u8 {
    ((word >> 10) & 0x7) as u8
}

/// Indexed mode bits as `PRPO << 2 | DEC << 1 | INC` (bits 9..7).
#[must_use]
pub const fn index_mode_bits(word: u16) -> u8 {
    ((word >> 7) & 0x7) as u8
}

/// Move-immediate selector (bits 12..11).
#[must_use]
pub const fn move_immediate_code(word: u16) -> u8 {
    ((word >> 11) & 0x3) as u8
}

/// Immediate byte carried by the `MOVL`/`MOVLZ`/`MOVLS`/`MOVH` family (bits 10..3).
#[must_use]
pub const fn move_immediate_byte(word: u16) -> u8 {
    ((word >> 3) & 0xFF) as u8
}

/// Seven-bit signed relative offset (bits 13..7), sign-extended to 16 bits.
#[must_use]
pub const fn relative_offset(word: u16) -> u16 {
    let raw = (word >> 7) & 0x7F;
    if bit(word, 13) {
        raw | 0xFF80
    } else {
        raw
    }
}

/// Word-scaled, sign-extended PC displacement.
///
/// The low `magnitude_bits` bits are shifted left once; bit `magnitude_bits`
/// is the sign, which fills every bit above the shifted magnitude.
#[must_use]
pub const fn displacement(word: u16, magnitude_bits: u16) -> u16 {
    let magnitude = (word & ((1 << magnitude_bits) - 1)) << 1;
    if bit(word, magnitude_bits) {
        magnitude | (0xFFFF << (magnitude_bits + 1))
    } else {
        magnitude
    }
}

/// Displacement of a conditional branch.
#[must_use]
pub const fn branch_displacement(word: u16) -> u16 {
    displacement(word, BRANCH_MAGNITUDE_BITS)
}

/// Displacement of `BL`.
#[must_use]
pub const fn link_displacement(word: u16) -> u16 {
    displacement(word, LINK_MAGNITUDE_BITS)
}

/// Inverse of [`displacement`]: packs a byte displacement into its field.
#[must_use]
pub const fn pack_displacement(displacement: u16, magnitude_bits: u16) -> u16 {
    (displacement >> 1) & ((1 << (magnitude_bits + 1)) - 1)
}

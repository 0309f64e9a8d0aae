//! Address canonicalisation and little-endian word helpers.

use crate::FaultCode;

/// Returns true when `addr` is a legal word address.
#[must_use]
pub const fn is_word_aligned(addr: u16) -> bool {
    addr & 1 == 0
}

/// Rounds an odd word address down to the even address below it.
///
/// Odd word addresses are never rejected; the correction is logged and the
/// access proceeds at the canonical address.
#[must_use]
pub fn canonical_word_address(addr: u16) -> u16 {
    if is_word_aligned(addr) {
        addr
    } else {
        let corrected = addr & !1;
        tracing::warn!(
            address = format_args!("{addr:#06X}"),
            corrected = format_args!("{corrected:#06X}"),
            "odd word address rounded down"
        );
        corrected
    }
}

/// Narrows a host-supplied address into the 16-bit address space.
///
/// # Errors
///
/// Returns [`FaultCode::AddressOutOfRange`] when `addr` exceeds `0xFFFF`.
pub fn validate_address(addr: u32) -> Result<u16, FaultCode> {
    u16::try_from(addr).map_err(|_| FaultCode::AddressOutOfRange)
}

/// Reads the little-endian word stored at `addr` and `addr + 1`.
#[must_use]
pub fn read_u16_le(memory: &[u8], addr: u16) -> u16 {
    let lo = memory[usize::from(addr)];
    let hi = memory[usize::from(addr.wrapping_add(1))];
    u16::from_le_bytes([lo, hi])
}

/// Stores `value` little-endian at `addr` and `addr + 1`.
pub fn write_u16_le(memory: &mut [u8], addr: u16, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    memory[usize::from(addr)] = lo;
    memory[usize::from(addr.wrapping_add(1))] = hi;
}

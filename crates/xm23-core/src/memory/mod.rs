//! Memory model primitives: the flat 64 KiB byte store and the bus contract.

/// Address canonicalisation and word packing helpers.
pub mod access;

pub use access::{
    canonical_word_address, is_word_aligned, read_u16_le, validate_address, write_u16_le,
};

use crate::{Clock, CycleCostKind, FaultCode};

/// Size in bytes of the flat architectural address space (64 KiB).
pub const ADDRESS_SPACE_BYTES: usize = u16::MAX as usize + 1;

/// Allocates a canonical zeroed 64 KiB address-space backing store.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}

/// Operand width selected by an instruction's W/B bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Width {
    /// Full 16-bit access.
    #[default]
    Word,
    /// Low 8 bits only.
    Byte,
}

impl Width {
    /// Maps the W/B instruction bit (set means byte).
    #[must_use]
    pub const fn from_bit(byte: bool) -> Self {
        if byte {
            Self::Byte
        } else {
            Self::Word
        }
    }

    /// Pointer step used by auto-increment and auto-decrement.
    #[must_use]
    pub const fn step(self) -> u16 {
        match self {
            Self::Word => 2,
            Self::Byte => 1,
        }
    }

    /// Mask covering every bit this width operates on.
    #[must_use]
    pub const fn value_mask(self) -> u16 {
        match self {
            Self::Word => 0xFFFF,
            Self::Byte => 0x00FF,
        }
    }

    /// Mask selecting the sign bit at this width.
    #[must_use]
    pub const fn sign_mask(self) -> u16 {
        match self {
            Self::Word => 0x8000,
            Self::Byte => 0x0080,
        }
    }

    /// Number of decimal digits a BCD add processes at this width.
    #[must_use]
    pub const fn nibbles(self) -> u32 {
        match self {
            Self::Word => 4,
            Self::Byte => 2,
        }
    }

    /// Combines a width-limited `result` with the untouched upper bits of `original`.
    #[must_use]
    pub const fn merge(self, original: u16, result: u16) -> u16 {
        (original & !self.value_mask()) | (result & self.value_mask())
    }
}

/// Word/byte access contract shared by main memory and the cache controller.
///
/// Every access is charged to the supplied clock.
pub trait MemoryBus {
    /// Reads a word or byte. Byte reads return the value zero-extended.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`FaultCode`] when the access cannot be completed.
    fn read(&mut self, addr: u16, width: Width, clock: &mut Clock) -> Result<u16, FaultCode>;

    /// Writes a word or the low byte of `value`.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`FaultCode`] when the access cannot be completed.
    fn write(
        &mut self,
        addr: u16,
        width: Width,
        value: u16,
        clock: &mut Clock,
    ) -> Result<(), FaultCode>;
}

/// Flat 64 KiB little-endian main memory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MainMemory {
    bytes: Box<[u8]>,
}

impl Default for MainMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MainMemory {
    /// Creates zero-filled memory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: new_address_space(),
        }
    }

    /// Raw view of the backing store.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Reads a byte without charging the clock.
    #[must_use]
    pub fn peek_byte(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr)]
    }

    /// Reads a word without charging the clock.
    #[must_use]
    pub fn peek_word(&self, addr: u16) -> u16 {
        read_u16_le(&self.bytes, canonical_word_address(addr))
    }

    /// Copies `image` into memory starting at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::AddressOutOfRange`] when the image would run past
    /// the top of the address space. Memory is left untouched in that case.
    pub fn load(&mut self, origin: u16, image: &[u8]) -> Result<(), FaultCode> {
        let start = usize::from(origin);
        let end = start
            .checked_add(image.len())
            .filter(|end| *end <= ADDRESS_SPACE_BYTES)
            .ok_or(FaultCode::AddressOutOfRange)?;
        self.bytes[start..end].copy_from_slice(image);
        Ok(())
    }

    /// Zero-fills the whole address space.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

impl MemoryBus for MainMemory {
    fn read(&mut self, addr: u16, width: Width, clock: &mut Clock) -> Result<u16, FaultCode> {
        clock.advance(CycleCostKind::MemoryAccess);
        Ok(match width {
            Width::Word => self.peek_word(addr),
            Width::Byte => u16::from(self.peek_byte(addr)),
        })
    }

    fn write(
        &mut self,
        addr: u16,
        width: Width,
        value: u16,
        clock: &mut Clock,
    ) -> Result<(), FaultCode> {
        clock.advance(CycleCostKind::MemoryAccess);
        match width {
            Width::Word => write_u16_le(&mut self.bytes, canonical_word_address(addr), value),
            Width::Byte => self.bytes[usize::from(addr)] = value.to_le_bytes()[0],
        }
        Ok(())
    }
}

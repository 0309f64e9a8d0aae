use thiserror::Error;

/// Fault classes used for diagnostics aggregation and run-loop policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder rejected an instruction encoding.
    Decode,
    /// Address outside the 64 KiB space.
    Memory,
    /// Cache controller bookkeeping broke down.
    Cache,
    /// Arithmetic unit was handed an operation it does not know.
    Alu,
    /// Host-side request (console or configuration) could not be honoured.
    Host,
}

/// Stable fault taxonomy for every error the core can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Bit pattern matches no instruction.
    #[error("undefined instruction encoding")]
    UndefinedOpcode = 0x01,
    /// Indexed load/store carried an invalid PRPO/DEC/INC combination.
    #[error("undefined indexed addressing mode")]
    UndefinedAddressingMode = 0x02,
    /// Instruction class is recognised but has no execution semantics.
    #[error("instruction recognised but not implemented")]
    UnimplementedInstruction = 0x03,
    /// Arithmetic unit was asked for an unknown operation code.
    #[error("unknown arithmetic operation")]
    UnknownAluOperation = 0x04,
    /// Write requested with no valid destination register.
    #[error("write has no valid destination")]
    NoWriteTarget = 0x05,
    /// Address beyond the 16-bit address space.
    #[error("address outside the 64 KiB address space")]
    AddressOutOfRange = 0x06,
    /// A line installed by the cache could not be found again.
    #[error("cache line missing after installation")]
    CacheInconsistency = 0x07,
    /// Core configuration is out of its supported range.
    #[error("invalid core configuration")]
    InvalidConfiguration = 0x08,
}

impl FaultCode {
    /// Converts a fault code to its stable low-byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable low-byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::UndefinedOpcode),
            0x02 => Some(Self::UndefinedAddressingMode),
            0x03 => Some(Self::UnimplementedInstruction),
            0x04 => Some(Self::UnknownAluOperation),
            0x05 => Some(Self::NoWriteTarget),
            0x06 => Some(Self::AddressOutOfRange),
            0x07 => Some(Self::CacheInconsistency),
            0x08 => Some(Self::InvalidConfiguration),
            _ => None,
        }
    }

    /// Returns the diagnostics fault class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::UndefinedOpcode
            | Self::UndefinedAddressingMode
            | Self::UnimplementedInstruction => FaultClass::Decode,
            Self::AddressOutOfRange => FaultClass::Memory,
            Self::CacheInconsistency => FaultClass::Cache,
            Self::UnknownAluOperation => FaultClass::Alu,
            Self::NoWriteTarget | Self::InvalidConfiguration => FaultClass::Host,
        }
    }

    /// Faults that stop a run instead of abandoning a single instruction.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::AddressOutOfRange | Self::CacheInconsistency)
    }
}

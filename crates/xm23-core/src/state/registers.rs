/// Number of architecturally visible general-purpose registers (`R0..R7`).
pub const GENERAL_REGISTER_COUNT: usize = 8;

/// Constant generator values selected by the source field when R/C is set.
pub const CONSTANT_TABLE: [u16; GENERAL_REGISTER_COUNT] = [0, 1, 2, 4, 8, 16, 32, 0xFFFF];

/// Architecturally visible general-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum GeneralRegister {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl GeneralRegister {
    /// Ordered list of all architectural general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Base pointer alias.
    pub const BP: Self = Self::R4;
    /// Link register alias, written by `BL`.
    pub const LR: Self = Self::R5;
    /// Stack pointer alias.
    pub const SP: Self = Self::R6;
    /// Program counter alias.
    pub const PC: Self = Self::R7;

    /// Returns the array index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a 3-bit register field into an architectural register.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::R0),
            1 => Some(Self::R1),
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            7 => Some(Self::R7),
            _ => None,
        }
    }

    /// Looks up a register by host-supplied index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_u3)
    }
}

/// Selects whether a source field names a register or a constant (the R/C bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandSource {
    /// Source field is a register number.
    #[default]
    Register,
    /// Source field indexes [`CONSTANT_TABLE`].
    Constant,
}

impl OperandSource {
    /// Maps the R/C instruction bit (set means constant).
    #[must_use]
    pub const fn from_bit(constant: bool) -> Self {
        if constant {
            Self::Constant
        } else {
            Self::Register
        }
    }
}

/// Eight 16-bit general registers; `R7` doubles as the program counter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    gpr: [u16; GENERAL_REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: GeneralRegister) -> u16 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register.
    pub const fn set_gpr(&mut self, reg: GeneralRegister, value: u16) {
        self.gpr[reg.index()] = value;
    }

    /// Resolves a source operand: register contents or a table constant.
    #[must_use]
    pub const fn operand(&self, source: OperandSource, reg: GeneralRegister) -> u16 {
        match source {
            OperandSource::Register => self.gpr(reg),
            OperandSource::Constant => CONSTANT_TABLE[reg.index()],
        }
    }

    /// Reads the program counter (`R7`).
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.gpr(GeneralRegister::PC)
    }

    /// Writes the program counter (`R7`).
    pub const fn set_pc(&mut self, value: u16) {
        self.set_gpr(GeneralRegister::PC, value);
    }

    /// Reads the link register (`R5`).
    #[must_use]
    pub const fn lr(&self) -> u16 {
        self.gpr(GeneralRegister::LR)
    }

    /// Writes the link register (`R5`).
    pub const fn set_lr(&mut self, value: u16) {
        self.set_gpr(GeneralRegister::LR, value);
    }

    /// Reads the stack pointer (`R6`).
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.gpr(GeneralRegister::SP)
    }

    /// All eight registers in index order.
    #[must_use]
    pub const fn as_array(&self) -> [u16; GENERAL_REGISTER_COUNT] {
        self.gpr
    }

    /// Clears every register to zero.
    pub const fn clear(&mut self) {
        self.gpr = [0; GENERAL_REGISTER_COUNT];
    }
}

//! Instruction decoder for the XM-23 ISA.
//!
//! Walks the fixed decision tree over the leading opcode bits and produces a
//! fully typed [`Instruction`], or the fault explaining why the word has no
//! executable meaning.

use crate::encoding::{
    alu_code, bit, branch_displacement, classify_group, condition_code, constant_bit, dst_field,
    index_mode_bits, link_displacement, move_immediate_byte, move_immediate_code,
    pack_displacement, relative_offset, src_field, width_bit, InstructionGroup,
    BRANCH_MAGNITUDE_BITS, LINK_MAGNITUDE_BITS,
};
use crate::fault::FaultCode;
use crate::memory::Width;
use crate::state::{GeneralRegister, OperandSource};

/// Two-operand arithmetic and logic operations, numbered by their selector code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum AluOp {
    Add = 0,
    Addc = 1,
    Sub = 2,
    Subc = 3,
    Dadd = 4,
    Cmp = 5,
    Xor = 6,
    And = 7,
    Or = 8,
    Bit = 9,
    Bic = 10,
    Bis = 11,
}

impl AluOp {
    /// Every operation in selector order.
    pub const ALL: [Self; 12] = [
        Self::Add,
        Self::Addc,
        Self::Sub,
        Self::Subc,
        Self::Dadd,
        Self::Cmp,
        Self::Xor,
        Self::And,
        Self::Or,
        Self::Bit,
        Self::Bic,
        Self::Bis,
    ];

    /// Selector code of this operation.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up an operation by selector code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Add),
            1 => Some(Self::Addc),
            2 => Some(Self::Sub),
            3 => Some(Self::Subc),
            4 => Some(Self::Dadd),
            5 => Some(Self::Cmp),
            6 => Some(Self::Xor),
            7 => Some(Self::And),
            8 => Some(Self::Or),
            9 => Some(Self::Bit),
            10 => Some(Self::Bic),
            11 => Some(Self::Bis),
            _ => None,
        }
    }

    /// Operations that only touch `Z` and `N`.
    #[must_use]
    pub const fn is_logic(self) -> bool {
        matches!(
            self,
            Self::Xor | Self::And | Self::Or | Self::Bit | Self::Bic | Self::Bis
        )
    }

    /// Operations whose result is discarded after the flags are set.
    #[must_use]
    pub const fn discards_result(self) -> bool {
        matches!(self, Self::Cmp | Self::Bit)
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Addc => "ADDC",
            Self::Sub => "SUB",
            Self::Subc => "SUBC",
            Self::Dadd => "DADD",
            Self::Cmp => "CMP",
            Self::Xor => "XOR",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Bit => "BIT",
            Self::Bic => "BIC",
            Self::Bis => "BIS",
        }
    }
}

impl TryFrom<u8> for AluOp {
    type Error = FaultCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(FaultCode::UnknownAluOperation)
    }
}

/// Conditional branch predicates, numbered by their 3-bit selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum BranchCondition {
    /// `BEQ`: `Z` set.
    Equal = 0,
    /// `BNE`: `Z` clear.
    NotEqual = 1,
    /// `BC`: `C` set.
    CarrySet = 2,
    /// `BNC`: `C` clear.
    CarryClear = 3,
    /// `BN`: `N` set.
    Negative = 4,
    /// `BGE`: `N` equals `V`.
    GreaterOrEqual = 5,
    /// `BLT`: `N` differs from `V`.
    Less = 6,
    /// `BRA`: always taken.
    Always = 7,
}

impl BranchCondition {
    /// Decodes a 3-bit condition selector.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Equal),
            1 => Some(Self::NotEqual),
            2 => Some(Self::CarrySet),
            3 => Some(Self::CarryClear),
            4 => Some(Self::Negative),
            5 => Some(Self::GreaterOrEqual),
            6 => Some(Self::Less),
            7 => Some(Self::Always),
            _ => None,
        }
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Equal => "BEQ",
            Self::NotEqual => "BNE",
            Self::CarrySet => "BC",
            Self::CarryClear => "BNC",
            Self::Negative => "BN",
            Self::GreaterOrEqual => "BGE",
            Self::Less => "BLT",
            Self::Always => "BRA",
        }
    }
}

/// Pointer adjustment applied by indexed `LD`/`ST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum IndexMode {
    /// Use the base register as-is.
    Plain,
    /// Access, then add the step.
    PostIncrement,
    /// Access, then subtract the step.
    PostDecrement,
    /// Add the step, then access.
    PreIncrement,
    /// Subtract the step, then access.
    PreDecrement,
}

impl IndexMode {
    /// Decodes `PRPO << 2 | DEC << 1 | INC`; other combinations are undefined.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(Self::Plain),
            0b001 => Some(Self::PostIncrement),
            0b010 => Some(Self::PostDecrement),
            0b101 => Some(Self::PreIncrement),
            0b110 => Some(Self::PreDecrement),
            _ => None,
        }
    }

    /// Encoded `PRPO/DEC/INC` bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Plain => 0b000,
            Self::PostIncrement => 0b001,
            Self::PostDecrement => 0b010,
            Self::PreIncrement => 0b101,
            Self::PreDecrement => 0b110,
        }
    }
}

/// Single-register shift and byte operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum UnaryOp {
    Sra = 0,
    Rrc = 1,
    Comp = 2,
    Swpb = 3,
    Sxt = 4,
}

impl UnaryOp {
    /// Decodes the selector held in the source field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Sra),
            1 => Some(Self::Rrc),
            2 => Some(Self::Comp),
            3 => Some(Self::Swpb),
            4 => Some(Self::Sxt),
            _ => None,
        }
    }
}

/// Byte-immediate moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum MoveImmediateOp {
    /// Replace the low byte, keep the high byte.
    Movl = 0,
    /// Replace the low byte, clear the high byte.
    Movlz = 1,
    /// Replace the low byte, set the high byte to `0xFF`.
    Movls = 2,
    /// Replace the high byte, keep the low byte.
    Movh = 3,
}

impl MoveImmediateOp {
    /// Decodes the 2-bit selector.
    #[must_use]
    pub const fn from_u2(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Movl),
            1 => Some(Self::Movlz),
            2 => Some(Self::Movls),
            3 => Some(Self::Movh),
            _ => None,
        }
    }
}

/// Data direction of a memory instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryDirection {
    /// Memory into the destination register.
    Load,
    /// Source register into memory.
    Store,
}

/// Decoded instruction with all extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Instruction {
    /// `BL`: save the program counter in `LR` and jump.
    BranchLink {
        /// Sign-extended byte displacement.
        displacement: u16,
    },
    /// Conditional branch.
    Branch {
        /// Predicate over the status word.
        condition: BranchCondition,
        /// Sign-extended byte displacement.
        displacement: u16,
    },
    /// Two-operand arithmetic or logic.
    Alu {
        /// Operation.
        op: AluOp,
        /// Register or constant source.
        source: OperandSource,
        /// Operand width.
        width: Width,
        /// Source field.
        src: GeneralRegister,
        /// Destination register.
        dst: GeneralRegister,
    },
    /// `MOV`: register to register copy.
    Move {
        /// Operand width.
        width: Width,
        /// Source register.
        src: GeneralRegister,
        /// Destination register.
        dst: GeneralRegister,
    },
    /// `SWAP`: exchange two registers.
    Swap {
        /// First register.
        src: GeneralRegister,
        /// Second register.
        dst: GeneralRegister,
    },
    /// Single-register operation.
    Unary {
        /// Operation.
        op: UnaryOp,
        /// Operand width.
        width: Width,
        /// Register operated on.
        dst: GeneralRegister,
    },
    /// `LD`/`ST` through a base register with optional auto-adjust.
    Indexed {
        /// Load or store.
        direction: MemoryDirection,
        /// Pointer adjustment.
        mode: IndexMode,
        /// Operand width.
        width: Width,
        /// Source register (base for loads, data for stores).
        src: GeneralRegister,
        /// Destination register (target for loads, base for stores).
        dst: GeneralRegister,
    },
    /// `LDR`/`STR`: base register plus signed offset.
    Relative {
        /// Load or store.
        direction: MemoryDirection,
        /// Sign-extended byte offset.
        offset: u16,
        /// Operand width.
        width: Width,
        /// Source register (base for loads, data for stores).
        src: GeneralRegister,
        /// Destination register (target for loads, base for stores).
        dst: GeneralRegister,
    },
    /// `MOVL`/`MOVLZ`/`MOVLS`/`MOVH`.
    MoveImmediate {
        /// Operation.
        op: MoveImmediateOp,
        /// Immediate byte.
        immediate: u8,
        /// Destination register.
        dst: GeneralRegister,
    },
}

impl Instruction {
    /// Assembly mnemonic, used in trace output.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::BranchLink { .. } => "BL",
            Self::Branch { condition, .. } => condition.mnemonic(),
            Self::Alu { op, .. } => op.mnemonic(),
            Self::Move { .. } => "MOV",
            Self::Swap { .. } => "SWAP",
            Self::Unary { op, .. } => match op {
                UnaryOp::Sra => "SRA",
                UnaryOp::Rrc => "RRC",
                UnaryOp::Comp => "COMP",
                UnaryOp::Swpb => "SWPB",
                UnaryOp::Sxt => "SXT",
            },
            Self::Indexed { direction, .. } => match direction {
                MemoryDirection::Load => "LD",
                MemoryDirection::Store => "ST",
            },
            Self::Relative { direction, .. } => match direction {
                MemoryDirection::Load => "LDR",
                MemoryDirection::Store => "STR",
            },
            Self::MoveImmediate { op, .. } => match op {
                MoveImmediateOp::Movl => "MOVL",
                MoveImmediateOp::Movlz => "MOVLZ",
                MoveImmediateOp::Movls => "MOVLS",
                MoveImmediateOp::Movh => "MOVH",
            },
        }
    }

    /// Re-encodes this decoded instruction back to a 16-bit word.
    #[must_use]
    pub const fn encode(self) -> u16 {
        match self {
            Self::BranchLink { displacement } => {
                pack_displacement(displacement, LINK_MAGNITUDE_BITS)
            }
            Self::Branch {
                condition,
                displacement,
            } => {
                0x2000
                    | ((condition as u16) << 10)
                    | pack_displacement(displacement, BRANCH_MAGNITUDE_BITS)
            }
            Self::Alu {
                op,
                source,
                width,
                src,
                dst,
            } => {
                let code = op as u16;
                let selector = if code < 8 {
                    code << 8
                } else {
                    0x0800 | ((code - 8) << 8)
                };
                0x4000 | selector | register_operands(source, width, src, dst)
            }
            Self::Move { width, src, dst } => {
                0x4C00 | register_operands(OperandSource::Register, width, src, dst)
            }
            Self::Swap { src, dst } => {
                0x4C80 | register_operands(OperandSource::Register, Width::Word, src, dst)
            }
            Self::Unary { op, width, dst } => {
                0x4D00 | ((op as u16) << 3) | width_bits(width) | dst as u16
            }
            Self::Indexed {
                direction,
                mode,
                width,
                src,
                dst,
            } => {
                let opcode = match direction {
                    MemoryDirection::Load => 0x5800,
                    MemoryDirection::Store => 0x5C00,
                };
                opcode
                    | ((mode.bits() as u16) << 7)
                    | register_operands(OperandSource::Register, width, src, dst)
            }
            Self::Relative {
                direction,
                offset,
                width,
                src,
                dst,
            } => {
                let opcode = match direction {
                    MemoryDirection::Load => 0x8000,
                    MemoryDirection::Store => 0xC000,
                };
                opcode
                    | ((offset & 0x7F) << 7)
                    | width_bits(width)
                    | ((src as u16) << 3)
                    | dst as u16
            }
            Self::MoveImmediate { op, immediate, dst } => {
                0x6000 | ((op as u16) << 11) | ((immediate as u16) << 3) | dst as u16
            }
        }
    }
}

const fn width_bits(width: Width) -> u16 {
    match width {
        Width::Word => 0,
        Width::Byte => 1 << 6,
    }
}

const fn register_operands(
    source: OperandSource,
    width: Width,
    src: GeneralRegister,
    dst: GeneralRegister,
) -> u16 {
    let rc = match source {
        OperandSource::Register => 0,
        OperandSource::Constant => 1 << 7,
    };
    rc | width_bits(width) | ((src as u16) << 3) | dst as u16
}

/// Result of decoding an instruction word.
///
/// Either contains a valid decoded instruction or the fault that occurred
/// during decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedOrFault {
    /// Successfully decoded instruction.
    Instruction(Instruction),
    /// Decoding failed with a fault.
    Fault(FaultCode),
}

impl DecodedOrFault {
    /// Returns the decoded instruction if present.
    #[must_use]
    pub const fn instruction(self) -> Option<Instruction> {
        match self {
            Self::Instruction(i) => Some(i),
            Self::Fault(_) => None,
        }
    }

    /// Returns the fault if decoding failed.
    #[must_use]
    pub const fn fault(self) -> Option<FaultCode> {
        match self {
            Self::Instruction(_) => None,
            Self::Fault(f) => Some(f),
        }
    }
}

impl From<DecodedOrFault> for Result<Instruction, FaultCode> {
    fn from(value: DecodedOrFault) -> Self {
        match value {
            DecodedOrFault::Instruction(i) => Ok(i),
            DecodedOrFault::Fault(code) => Err(code),
        }
    }
}

/// Instruction decoder for the XM-23 ISA.
pub struct Decoder;

const fn register(bits: u8) -> GeneralRegister {
    match GeneralRegister::from_u3(bits) {
        Some(reg) => reg,
        None => GeneralRegister::R0,
    }
}

impl Decoder {
    /// Decodes a 16-bit instruction word.
    ///
    /// Undefined encodings, invalid indexed modes and recognised but
    /// unimplemented classes (`CEX`, `SETPRI`, `SVC`, `SETCC`, `CLRCC`) are
    /// reported as faults and never reach execution.
    #[must_use]
    pub const fn decode(word: u16) -> DecodedOrFault {
        let src = register(src_field(word));
        let dst = register(dst_field(word));
        let width = Width::from_bit(width_bit(word));

        let instruction = match classify_group(word) {
            InstructionGroup::BranchLink => Instruction::BranchLink {
                displacement: link_displacement(word),
            },
            InstructionGroup::ConditionalBranch => {
                let Some(condition) = BranchCondition::from_u3(condition_code(word)) else {
                    return DecodedOrFault::Fault(FaultCode::UndefinedOpcode);
                };
                Instruction::Branch {
                    condition,
                    displacement: branch_displacement(word),
                }
            }
            InstructionGroup::RegisterOperation => return Self::decode_register_operation(word),
            InstructionGroup::IndexedMemory => {
                let direction = match (word >> 10) & 0x3 {
                    0b10 => MemoryDirection::Load,
                    0b11 => MemoryDirection::Store,
                    0b00 => return DecodedOrFault::Fault(FaultCode::UnimplementedInstruction),
                    _ => return DecodedOrFault::Fault(FaultCode::UndefinedOpcode),
                };
                let Some(mode) = IndexMode::from_bits(index_mode_bits(word)) else {
                    return DecodedOrFault::Fault(FaultCode::UndefinedAddressingMode);
                };
                Instruction::Indexed {
                    direction,
                    mode,
                    width,
                    src,
                    dst,
                }
            }
            InstructionGroup::MoveImmediate => {
                let Some(op) = MoveImmediateOp::from_u2(move_immediate_code(word)) else {
                    return DecodedOrFault::Fault(FaultCode::UndefinedOpcode);
                };
                Instruction::MoveImmediate {
                    op,
                    immediate: move_immediate_byte(word),
                    dst,
                }
            }
            InstructionGroup::RelativeMemory => Instruction::Relative {
                direction: if bit(word, 14) {
                    MemoryDirection::Store
                } else {
                    MemoryDirection::Load
                },
                offset: relative_offset(word),
                width,
                src,
                dst,
            },
        };

        DecodedOrFault::Instruction(instruction)
    }

    const fn decode_register_operation(word: u16) -> DecodedOrFault {
        let src = register(src_field(word));
        let dst = register(dst_field(word));
        let width = Width::from_bit(width_bit(word));

        if !bit(word, 11) || !bit(word, 10) {
            let Some(op) = AluOp::from_code(alu_code(word)) else {
                return DecodedOrFault::Fault(FaultCode::UnknownAluOperation);
            };
            return DecodedOrFault::Instruction(Instruction::Alu {
                op,
                source: OperandSource::from_bit(constant_bit(word)),
                width,
                src,
                dst,
            });
        }

        let instruction = match (bit(word, 8), bit(word, 7)) {
            (false, false) => Instruction::Move { width, src, dst },
            (false, true) => Instruction::Swap { src, dst },
            (true, true) => return DecodedOrFault::Fault(FaultCode::UnimplementedInstruction),
            (true, false) => {
                let Some(op) = UnaryOp::from_u3(src_field(word)) else {
                    return DecodedOrFault::Fault(FaultCode::UndefinedOpcode);
                };
                Instruction::Unary { op, width, dst }
            }
        };

        DecodedOrFault::Instruction(instruction)
    }
}

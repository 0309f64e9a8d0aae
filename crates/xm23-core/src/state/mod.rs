//! Architectural CPU state model primitives.

/// General registers and the constant generator.
pub mod registers;
/// Processor status word.
pub mod status;

pub use registers::{
    GeneralRegister, OperandSource, RegisterFile, CONSTANT_TABLE, GENERAL_REGISTER_COUNT,
};
pub use status::{
    StatusFlag, StatusWord, PRIORITY_MASK, PSW_C, PSW_CURRENT_SHIFT, PSW_DEFINED_MASK, PSW_FLT,
    PSW_N, PSW_PREVIOUS_SHIFT, PSW_SLP, PSW_V, PSW_Z,
};

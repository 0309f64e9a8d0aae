//! Core emulator crate for the XM-23 16-bit processor.

/// Flat 64 KiB memory and the bus contract.
pub mod memory;
pub use memory::{
    canonical_word_address, is_word_aligned, new_address_space, read_u16_le, validate_address,
    write_u16_le, MainMemory, MemoryBus, Width, ADDRESS_SPACE_BYTES,
};

/// Word-granular data cache with configurable write and mapping policies.
pub mod cache;
pub use cache::{
    CacheConfig, CacheController, CacheLine, CacheLineSnapshot, CacheStats, MappingPolicy,
    WritePolicy, DEFAULT_CACHE_LINES, MAX_CACHE_LINES,
};

/// Fault and retirement counters.
pub mod diag;
pub use diag::DiagCounters;

/// Public host-facing API and run control.
pub mod api;
pub use api::{CancellationToken, CoreConfig, CoreState, RunOutcome, StepOutcome, StopReason};

/// Architectural register and status-word model.
pub mod state;
pub use state::{
    GeneralRegister, OperandSource, RegisterFile, StatusFlag, StatusWord, CONSTANT_TABLE,
    GENERAL_REGISTER_COUNT,
};

/// Instruction word field extraction and group classification.
pub mod encoding;
pub use encoding::{classify_group, InstructionGroup};

/// Total instruction decoder.
pub mod decoder;
pub use decoder::{
    AluOp, BranchCondition, DecodedOrFault, Decoder, IndexMode, Instruction, MemoryDirection,
    MoveImmediateOp, UnaryOp,
};

/// Fault taxonomy shared by every unit.
pub mod fault;
pub use fault::{FaultClass, FaultCode};
/// Cycle-cost table and simulated clock.
pub mod timing;
pub use timing::{cycle_cost, Clock, CycleCostKind, CYCLE_COST_TABLE};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, run_until, step_one, ExecuteState, FlagsUpdate,
    CARRY_TABLE, OVERFLOW_TABLE,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;

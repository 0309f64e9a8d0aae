//! Instruction execution pipeline for the XM-23 ISA.
//!
//! One step runs fetch, decode and execute in order, charging the clock at
//! each stage:
//! 1. Fetch the word at `PC` from main memory and advance `PC` by two
//! 2. Decode it into an [`Instruction`]
//! 3. Compute results and perform data accesses through the cache
//! 4. Commit register writes and the status-word update
//!
//! A faulting instruction commits nothing beyond the fetch: the fault is
//! reported and execution continues with the next word.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

/// Binary and decimal arithmetic, logic and shift operations.
pub mod alu;
/// Indexed and relative effective-address resolution.
pub mod addressing;
/// Branch predicates and targets.
pub mod branch;
mod flags;

pub use flags::{FlagsUpdate, CARRY_TABLE, OVERFLOW_TABLE};

use crate::decoder::{Instruction, MoveImmediateOp, UnaryOp};
use crate::memory::{canonical_word_address, validate_address, MemoryBus, Width};
use crate::state::GeneralRegister;
use crate::timing::CycleCostKind;
use crate::{CancellationToken, CoreState, Decoder, FaultCode, RunOutcome, StepOutcome, StopReason};

/// Side effects accumulated while executing one instruction.
///
/// Nothing here touches the register file or status word until
/// [`commit_execution`] runs, so a fault part-way through leaves them intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Register writes in commit order.
    pub register_writes: [Option<(GeneralRegister, u16)>; 2],
    /// Status-word update to apply.
    pub flags_update: FlagsUpdate,
}

impl ExecuteState {
    /// Queues a register write in the first free slot.
    pub fn push_write(&mut self, reg: GeneralRegister, value: u16) {
        if let Some(slot) = self.register_writes.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some((reg, value));
        }
    }

    fn with_write(reg: GeneralRegister, value: u16, flags_update: FlagsUpdate) -> Self {
        Self {
            register_writes: [Some((reg, value)), None],
            flags_update,
        }
    }
}

/// Result of a byte-immediate move into `current`.
#[must_use]
pub const fn move_immediate(op: MoveImmediateOp, immediate: u8, current: u16) -> u16 {
    let immediate = immediate as u16;
    match op {
        MoveImmediateOp::Movl => (current & 0xFF00) | immediate,
        MoveImmediateOp::Movlz => immediate,
        MoveImmediateOp::Movls => 0xFF00 | immediate,
        MoveImmediateOp::Movh => (current & 0x00FF) | (immediate << 8),
    }
}

/// Executes one decoded instruction against `state`.
///
/// Data accesses are performed immediately through the cache; register and
/// status-word changes are returned for [`commit_execution`].
///
/// # Errors
///
/// Returns the fault raised by a data access.
pub fn execute_instruction(
    instruction: &Instruction,
    state: &mut CoreState,
) -> Result<ExecuteState, FaultCode> {
    state.clock.advance(CycleCostKind::Execute);

    let exec = match *instruction {
        Instruction::BranchLink { displacement } => branch::branch_link(&state.regs, displacement),
        Instruction::Branch {
            condition,
            displacement,
        } => branch::conditional_branch(&state.regs, state.psw, condition, displacement),
        Instruction::Alu {
            op,
            source,
            width,
            src,
            dst,
        } => {
            let result = alu::execute(
                op,
                state.regs.operand(source, src),
                state.regs.gpr(dst),
                state.psw.carry(),
                width,
            );
            state
                .clock
                .advance_times(CycleCostKind::AdderPass, result.adder_passes);
            state
                .clock
                .advance_times(CycleCostKind::BcdDigit, result.bcd_digits);
            let mut exec = ExecuteState {
                flags_update: result.flags,
                ..ExecuteState::default()
            };
            if let Some(value) = result.value {
                exec.push_write(dst, value);
            }
            exec
        }
        Instruction::Move { width, src, dst } => {
            let value = state.regs.gpr(src) & width.value_mask();
            ExecuteState::with_write(dst, value, FlagsUpdate::None)
        }
        Instruction::Swap { src, dst } => {
            let mut exec = ExecuteState::default();
            exec.push_write(dst, state.regs.gpr(src));
            exec.push_write(src, state.regs.gpr(dst));
            exec
        }
        Instruction::Unary { op, width, dst } => {
            let width = if op == UnaryOp::Swpb { Width::Word } else { width };
            let result = alu::execute_unary(op, state.regs.gpr(dst), state.psw.carry(), width);
            let mut exec = ExecuteState {
                flags_update: result.flags,
                ..ExecuteState::default()
            };
            if let Some(value) = result.value {
                exec.push_write(dst, value);
            }
            exec
        }
        Instruction::Indexed {
            direction,
            mode,
            width,
            src,
            dst,
        } => addressing::execute_indexed(state, direction, mode, width, src, dst)?,
        Instruction::Relative {
            direction,
            offset,
            width,
            src,
            dst,
        } => addressing::execute_relative(state, direction, offset, width, src, dst)?,
        Instruction::MoveImmediate { op, immediate, dst } => ExecuteState::with_write(
            dst,
            move_immediate(op, immediate, state.regs.gpr(dst)),
            FlagsUpdate::None,
        ),
    };

    Ok(exec)
}

/// Applies accumulated register writes and the status-word update.
pub fn commit_execution(state: &mut CoreState, exec: &ExecuteState) {
    for (reg, value) in exec.register_writes.iter().flatten() {
        state.regs.set_gpr(*reg, *value);
    }
    exec.flags_update.apply(&mut state.psw);
}

fn raise(state: &mut CoreState, pc: u16, word: u16, cause: FaultCode) -> StepOutcome {
    state.diag.record_fault(cause, pc, state.clock.cycles());
    if cause.is_fatal() {
        tracing::error!(
            pc = format_args!("{pc:#06X}"),
            word = format_args!("{word:#06X}"),
            %cause,
            "fatal fault"
        );
    } else {
        tracing::warn!(
            pc = format_args!("{pc:#06X}"),
            word = format_args!("{word:#06X}"),
            %cause,
            "instruction abandoned"
        );
    }
    StepOutcome::Fault { pc, cause }
}

/// Fetches, decodes and executes the instruction at `PC`.
pub fn step_one(state: &mut CoreState) -> StepOutcome {
    let cycles_before = state.clock.cycles();
    let pc = canonical_word_address(state.regs.pc());

    let word = match state
        .cache
        .memory_mut()
        .read(pc, Width::Word, &mut state.clock)
    {
        Ok(word) => word,
        Err(cause) => return raise(state, pc, 0, cause),
    };
    state.clock.advance(CycleCostKind::Fetch);
    state.regs.set_pc(pc.wrapping_add(2));
    state.ir = word;

    state.clock.advance(CycleCostKind::Decode);
    let decoded: Result<Instruction, FaultCode> = Decoder::decode(word).into();
    let instruction = match decoded {
        Ok(instruction) => instruction,
        Err(cause) => return raise(state, pc, word, cause),
    };
    tracing::trace!(
        pc = format_args!("{pc:#06X}"),
        word = format_args!("{word:#06X}"),
        mnemonic = instruction.mnemonic(),
        "decoded"
    );

    match execute_instruction(&instruction, state) {
        Ok(exec) => {
            commit_execution(state, &exec);
            state.diag.increment_instruction_count();
            StepOutcome::Retired {
                pc,
                word,
                cycles: state.clock.cycles() - cycles_before,
            }
        }
        Err(cause) => raise(state, pc, word, cause),
    }
}

/// Steps until `PC` equals `target`, the token is cancelled, or a fatal fault.
///
/// Both stop conditions are checked before every instruction, so a run whose
/// `PC` already equals the target executes nothing. An odd target is rounded
/// down to the even address below it.
pub fn run_until(state: &mut CoreState, target: u32, cancel: &CancellationToken) -> RunOutcome {
    let target = match validate_address(target) {
        Ok(target) => canonical_word_address(target),
        Err(cause) => {
            tracing::error!(requested = target, %cause, "run target outside the address space");
            state
                .diag
                .record_fault(cause, state.regs.pc(), state.clock.cycles());
            return RunOutcome {
                steps: 0,
                stop: StopReason::Fault(cause),
            };
        }
    };

    let mut steps = 0_u64;
    loop {
        if state.regs.pc() == target {
            tracing::debug!(steps, "breakpoint reached");
            return RunOutcome {
                steps,
                stop: StopReason::BreakpointReached,
            };
        }
        if cancel.is_cancelled() {
            tracing::debug!(steps, "run cancelled");
            return RunOutcome {
                steps,
                stop: StopReason::Cancelled,
            };
        }

        let outcome = step_one(state);
        steps = steps.saturating_add(1);
        if let StepOutcome::Fault { cause, .. } = outcome {
            if cause.is_fatal() {
                return RunOutcome {
                    steps,
                    stop: StopReason::Fault(cause),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{AluOp, MemoryDirection};
    use crate::state::{OperandSource, StatusFlag};

    fn state_with_program(words: &[u16]) -> CoreState {
        let mut state = CoreState::default();
        let image: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        state.load_image(0x0000, &image).expect("image fits");
        state
    }

    #[test]
    fn move_immediate_family_replaces_bytes() {
        assert_eq!(move_immediate(MoveImmediateOp::Movl, 0xAB, 0x1234), 0x12AB);
        assert_eq!(move_immediate(MoveImmediateOp::Movlz, 0xAB, 0x1234), 0x00AB);
        assert_eq!(move_immediate(MoveImmediateOp::Movls, 0xAB, 0x1234), 0xFFAB);
        assert_eq!(move_immediate(MoveImmediateOp::Movh, 0xAB, 0x1234), 0xAB34);
    }

    #[test]
    fn add_retires_and_charges_pipeline_costs() {
        let add = Instruction::Alu {
            op: AluOp::Add,
            source: OperandSource::Register,
            width: Width::Word,
            src: GeneralRegister::R1,
            dst: GeneralRegister::R2,
        };
        let mut state = state_with_program(&[add.encode()]);
        state.regs.set_gpr(GeneralRegister::R1, 0x7FFF);
        state.regs.set_gpr(GeneralRegister::R2, 0x0001);

        let outcome = step_one(&mut state);

        // 3 memory + 1 fetch + 1 decode + 1 execute + 1 adder
        assert_eq!(
            outcome,
            StepOutcome::Retired {
                pc: 0,
                word: add.encode(),
                cycles: 7,
            }
        );
        assert_eq!(state.regs.gpr(GeneralRegister::R2), 0x8000);
        assert!(state.psw.overflow());
        assert!(state.psw.negative());
        assert!(!state.psw.carry());
        assert!(!state.psw.zero());
        assert_eq!(state.regs.pc(), 2);
        assert_eq!(state.ir, add.encode());
        assert_eq!(state.diag.instruction_count, 1);
    }

    #[test]
    fn undefined_word_is_abandoned_and_execution_continues() {
        let mut state = state_with_program(&[0x5400, 0x6000 | (0x42 << 3) | 1]);
        let outcome = step_one(&mut state);
        assert_eq!(
            outcome,
            StepOutcome::Fault {
                pc: 0,
                cause: FaultCode::UndefinedOpcode,
            }
        );
        assert_eq!(state.regs.pc(), 2);
        assert_eq!(state.diag.fault_count_decode, 1);

        assert!(matches!(step_one(&mut state), StepOutcome::Retired { .. }));
        assert_eq!(state.regs.gpr(GeneralRegister::R1), 0x0042);
    }

    #[test]
    fn register_writes_wait_for_commit() {
        let mut state = CoreState::default();
        let load = Instruction::Indexed {
            direction: MemoryDirection::Load,
            mode: crate::decoder::IndexMode::PostIncrement,
            width: Width::Word,
            src: GeneralRegister::R1,
            dst: GeneralRegister::R2,
        };
        let exec = execute_instruction(&load, &mut state).expect("load succeeds");
        assert_eq!(exec.register_writes[1], Some((GeneralRegister::R1, 2)));
        assert_eq!(state.regs.gpr(GeneralRegister::R1), 0);

        commit_execution(&mut state, &exec);
        assert_eq!(state.regs.gpr(GeneralRegister::R1), 2);
    }

    #[test]
    fn run_stops_at_target_before_executing_it() {
        let bra_self = Instruction::Branch {
            condition: crate::decoder::BranchCondition::Always,
            displacement: 0xFFFE,
        };
        let mut state = state_with_program(&[0x6000, 0x6000, bra_self.encode()]);
        let outcome = run_until(&mut state, 0x0005, &CancellationToken::new());
        assert_eq!(
            outcome,
            RunOutcome {
                steps: 2,
                stop: StopReason::BreakpointReached,
            }
        );
        assert_eq!(state.regs.pc(), 4);
    }

    #[test]
    fn run_target_above_address_space_is_fatal() {
        let mut state = CoreState::default();
        let outcome = run_until(&mut state, 0x1_0000, &CancellationToken::new());
        assert_eq!(outcome.stop, StopReason::Fault(FaultCode::AddressOutOfRange));
        assert_eq!(outcome.steps, 0);
        assert_eq!(state.diag.fault_count_memory, 1);
    }

    #[test]
    fn cancelled_token_stops_before_first_step() {
        let mut state = CoreState::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = run_until(&mut state, 0x0100, &cancel);
        assert_eq!(outcome.stop, StopReason::Cancelled);
        assert_eq!(outcome.steps, 0);
        assert!(!state.psw.flag(StatusFlag::Fault));
    }
}

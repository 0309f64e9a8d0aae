//! Branch unit: condition evaluation and PC-relative targets.

use super::ExecuteState;
use crate::decoder::BranchCondition;
use crate::state::{GeneralRegister, RegisterFile, StatusWord};

/// Evaluates a branch predicate against the status word.
#[must_use]
pub const fn condition_holds(condition: BranchCondition, psw: StatusWord) -> bool {
    match condition {
        BranchCondition::Equal => psw.zero(),
        BranchCondition::NotEqual => !psw.zero(),
        BranchCondition::CarrySet => psw.carry(),
        BranchCondition::CarryClear => !psw.carry(),
        BranchCondition::Negative => psw.negative(),
        BranchCondition::GreaterOrEqual => psw.negative() == psw.overflow(),
        BranchCondition::Less => psw.negative() != psw.overflow(),
        BranchCondition::Always => true,
    }
}

/// PC plus sign-extended displacement, wrapping within the address space.
#[must_use]
pub const fn branch_target(pc: u16, displacement: u16) -> u16 {
    pc.wrapping_add(displacement)
}

/// Conditional branch; the PC is only written when the predicate holds.
#[must_use]
pub fn conditional_branch(
    regs: &RegisterFile,
    psw: StatusWord,
    condition: BranchCondition,
    displacement: u16,
) -> ExecuteState {
    let mut exec = ExecuteState::default();
    if condition_holds(condition, psw) {
        let target = branch_target(regs.pc(), displacement);
        tracing::trace!(
            condition = condition.mnemonic(),
            target = format_args!("{target:#06X}"),
            "branch taken"
        );
        exec.push_write(GeneralRegister::PC, target);
    }
    exec
}

/// `BL`: the already-advanced PC goes to `LR`, then the PC jumps.
#[must_use]
pub fn branch_link(regs: &RegisterFile, displacement: u16) -> ExecuteState {
    let pc = regs.pc();
    let mut exec = ExecuteState::default();
    exec.push_write(GeneralRegister::LR, pc);
    exec.push_write(GeneralRegister::PC, branch_target(pc, displacement));
    exec
}

//! Effective-address resolution for indexed and relative `LD`/`ST`.
//!
//! Loads use the source register as the base and write the destination;
//! stores use the destination register as the base and write memory from the
//! source. Every resulting access goes through the cache controller.

use super::ExecuteState;
use crate::decoder::{IndexMode, MemoryDirection};
use crate::memory::{MemoryBus, Width};
use crate::state::GeneralRegister;
use crate::{CoreState, CycleCostKind, FaultCode};

/// Address to access and the value the base register takes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedAddress {
    /// Address used for the memory access.
    pub effective: u16,
    /// Base register value after any auto-adjust.
    pub updated_base: u16,
}

/// Applies an index mode to `base` with a step of 2 (word) or 1 (byte).
#[must_use]
pub const fn resolve_indexed(base: u16, mode: IndexMode, width: Width) -> IndexedAddress {
    let step = width.step();
    let (effective, updated_base) = match mode {
        IndexMode::Plain => (base, base),
        IndexMode::PostIncrement => (base, base.wrapping_add(step)),
        IndexMode::PostDecrement => (base, base.wrapping_sub(step)),
        IndexMode::PreIncrement => {
            let adjusted = base.wrapping_add(step);
            (adjusted, adjusted)
        }
        IndexMode::PreDecrement => {
            let adjusted = base.wrapping_sub(step);
            (adjusted, adjusted)
        }
    };
    IndexedAddress {
        effective,
        updated_base,
    }
}

/// Base plus sign-extended offset, wrapping within the address space.
#[must_use]
pub const fn resolve_relative(base: u16, offset: u16) -> u16 {
    base.wrapping_add(offset)
}

const fn roles(
    direction: MemoryDirection,
    src: GeneralRegister,
    dst: GeneralRegister,
) -> (GeneralRegister, GeneralRegister) {
    match direction {
        MemoryDirection::Load => (src, dst),
        MemoryDirection::Store => (dst, src),
    }
}

fn transfer(
    state: &mut CoreState,
    direction: MemoryDirection,
    address: u16,
    width: Width,
    data_reg: GeneralRegister,
    exec: &mut ExecuteState,
) -> Result<(), FaultCode> {
    match direction {
        MemoryDirection::Load => {
            let value = state.cache.read(address, width, &mut state.clock)?;
            exec.push_write(data_reg, width.merge(state.regs.gpr(data_reg), value));
        }
        MemoryDirection::Store => {
            let value = state.regs.gpr(data_reg);
            state.cache.write(address, width, value, &mut state.clock)?;
        }
    }
    Ok(())
}

/// Executes indexed `LD`/`ST`.
///
/// The base register is not adjusted when source and destination name the
/// same register.
///
/// # Errors
///
/// Propagates fatal cache faults; no register write is recorded in that case.
pub fn execute_indexed(
    state: &mut CoreState,
    direction: MemoryDirection,
    mode: IndexMode,
    width: Width,
    src: GeneralRegister,
    dst: GeneralRegister,
) -> Result<ExecuteState, FaultCode> {
    state.clock.advance(CycleCostKind::AddressCalculation);
    let (base_reg, data_reg) = roles(direction, src, dst);
    let address = resolve_indexed(state.regs.gpr(base_reg), mode, width);

    let mut exec = ExecuteState::default();
    transfer(state, direction, address.effective, width, data_reg, &mut exec)?;
    if src != dst {
        exec.push_write(base_reg, address.updated_base);
    }
    Ok(exec)
}

/// Executes `LDR`/`STR`.
///
/// # Errors
///
/// Propagates fatal cache faults; no register write is recorded in that case.
pub fn execute_relative(
    state: &mut CoreState,
    direction: MemoryDirection,
    offset: u16,
    width: Width,
    src: GeneralRegister,
    dst: GeneralRegister,
) -> Result<ExecuteState, FaultCode> {
    state.clock.advance(CycleCostKind::AddressCalculation);
    let (base_reg, data_reg) = roles(direction, src, dst);
    let address = resolve_relative(state.regs.gpr(base_reg), offset);

    let mut exec = ExecuteState::default();
    transfer(state, direction, address, width, data_reg, &mut exec)?;
    Ok(exec)
}

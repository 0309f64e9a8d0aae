//! Public host-facing API for embedding the core in a console or test harness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::{CacheConfig, CacheController, CacheLineSnapshot, CacheStats};
use crate::memory::{MainMemory, ADDRESS_SPACE_BYTES};
use crate::state::{GeneralRegister, RegisterFile, StatusFlag, StatusWord};
use crate::{execute, Clock, DiagCounters, FaultCode};

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Data cache geometry and policies.
    pub cache: CacheConfig,
    /// Initial program counter.
    pub entry_point: u16,
}

impl CoreConfig {
    /// Checks every configurable part.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidConfiguration`] for unsupported cache geometry.
    pub const fn validate(&self) -> Result<(), FaultCode> {
        self.cache.validate()
    }
}

/// Cooperative stop signal for [`CoreState::run_until`].
///
/// Clones share one flag, so a console can keep a clone in its interrupt
/// handler and cancel a run in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the run stop before its next instruction.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation so the token can be reused.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Output status from one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction executed and committed.
    Retired {
        /// Address the instruction was fetched from.
        pc: u16,
        /// Raw instruction word.
        word: u16,
        /// Cycles charged for the whole step.
        cycles: u64,
    },
    /// Instruction was abandoned.
    Fault {
        /// Address the instruction was fetched from.
        pc: u16,
        /// Reason the instruction was abandoned.
        cause: FaultCode,
    },
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// `PC` reached the requested address.
    BreakpointReached,
    /// The cancellation token was set.
    Cancelled,
    /// A fatal fault ended the run.
    Fault(FaultCode),
}

/// Aggregated outcome from [`CoreState::run_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Instructions stepped, including abandoned ones.
    pub steps: u64,
    /// Stop condition observed.
    pub stop: StopReason,
}

/// Complete simulator context, passed by reference to every unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// General registers; `R7` is the program counter.
    pub regs: RegisterFile,
    /// Processor status word.
    pub psw: StatusWord,
    /// Data cache, owning main memory.
    pub cache: CacheController,
    /// Simulated cycle counter.
    pub clock: Clock,
    /// Last fetched instruction word.
    pub ir: u16,
    /// Fault and retirement counters.
    pub diag: DiagCounters,
    entry_point: u16,
}

impl Default for CoreState {
    fn default() -> Self {
        Self::build(&CoreConfig::default())
    }
}

impl CoreState {
    /// Creates a core in power-on state.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidConfiguration`] when `config` fails validation.
    pub fn with_config(config: &CoreConfig) -> Result<Self, FaultCode> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &CoreConfig) -> Self {
        let mut regs = RegisterFile::default();
        regs.set_pc(config.entry_point);
        Self {
            regs,
            psw: StatusWord::default(),
            cache: CacheController::new(&config.cache, MainMemory::new()),
            clock: Clock::new(),
            ir: 0,
            diag: DiagCounters::new(),
            entry_point: config.entry_point,
        }
    }

    /// Copies a loader image into main memory at `origin`.
    ///
    /// Cache lines covering the loaded range are written back and dropped
    /// first, so later reads see the new image and pending stores to bytes
    /// outside it survive.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::AddressOutOfRange`] when the image would run past
    /// `0xFFFF`; nothing is written in that case.
    pub fn load_image(&mut self, origin: u16, image: &[u8]) -> Result<(), FaultCode> {
        if usize::from(origin).saturating_add(image.len()) > ADDRESS_SPACE_BYTES {
            return Err(FaultCode::AddressOutOfRange);
        }
        self.cache.evict_range(origin, image.len(), &mut self.clock)?;
        self.cache.memory_mut().load(origin, image)
    }

    /// Address the core starts from after reset.
    #[must_use]
    pub const fn entry_point(&self) -> u16 {
        self.entry_point
    }

    /// Sets the reset address and moves `PC` there.
    pub const fn set_entry_point(&mut self, addr: u16) {
        self.entry_point = addr;
        self.regs.set_pc(addr);
    }

    /// Reads a register by console index.
    #[must_use]
    pub fn register(&self, index: usize) -> Option<u16> {
        GeneralRegister::from_index(index).map(|reg| self.regs.gpr(reg))
    }

    /// Writes a register by console index.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::NoWriteTarget`] when `index` names no register.
    pub fn set_register(&mut self, index: usize, value: u16) -> Result<(), FaultCode> {
        let Some(reg) = GeneralRegister::from_index(index) else {
            tracing::warn!(index, "register write has no target");
            return Err(FaultCode::NoWriteTarget);
        };
        self.regs.set_gpr(reg, value);
        Ok(())
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.regs.pc()
    }

    /// Moves the program counter.
    pub const fn set_pc(&mut self, addr: u16) {
        self.regs.set_pc(addr);
    }

    /// Reads one status flag.
    #[must_use]
    pub const fn flag(&self, flag: StatusFlag) -> bool {
        self.psw.flag(flag)
    }

    /// Sets or clears one status flag.
    pub const fn set_flag(&mut self, flag: StatusFlag, enabled: bool) {
        self.psw.set_flag(flag, enabled);
    }

    /// Console view of every cache line.
    #[must_use]
    pub fn cache_snapshot(&self) -> Vec<CacheLineSnapshot> {
        self.cache.snapshot()
    }

    /// Cache hit/miss counters.
    #[must_use]
    pub const fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cycles charged since power-on or the last reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.clock.cycles()
    }

    /// Writes every dirty cache line back to memory.
    ///
    /// # Errors
    ///
    /// Propagates memory faults from the write-back.
    pub fn flush_cache(&mut self) -> Result<(), FaultCode> {
        self.cache.flush_all(&mut self.clock)
    }

    /// Flushes, then empties the cache.
    ///
    /// # Errors
    ///
    /// Propagates memory faults from the write-back.
    pub fn invalidate_cache(&mut self) -> Result<(), FaultCode> {
        self.cache.invalidate_all(&mut self.clock)
    }

    /// Returns to power-on state while keeping main memory.
    ///
    /// Cache lines are dropped without being written back, so stores still
    /// held in dirty lines are lost; call [`flush_cache`](Self::flush_cache)
    /// first to keep them.
    pub fn reset(&mut self) {
        self.regs.clear();
        self.regs.set_pc(self.entry_point);
        self.psw = StatusWord::default();
        self.cache.discard_all();
        self.cache.reset_stats();
        self.clock.reset();
        self.ir = 0;
        self.diag.reset();
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> StepOutcome {
        execute::step_one(self)
    }

    /// Runs until `PC` reaches `target`, `cancel` is set, or a fatal fault.
    pub fn run_until(&mut self, target: u32, cancel: &CancellationToken) -> RunOutcome {
        execute::run_until(self, target, cancel)
    }
}

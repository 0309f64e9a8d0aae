//! Saturating diagnostic counters kept alongside the architectural state.

use crate::{FaultClass, FaultCode};

/// Fault and retirement counters updated by the step loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagCounters {
    /// The last fault code that occurred, if any.
    pub last_fault_code: Option<FaultCode>,
    /// Address of the instruction that raised the last fault.
    pub last_fault_pc: u16,
    /// Cycle counter value when the last fault was raised.
    pub last_fault_cycle: u64,
    /// Saturating counter for decode-class faults.
    pub fault_count_decode: u32,
    /// Saturating counter for memory-class faults.
    pub fault_count_memory: u32,
    /// Saturating counter for cache-class faults.
    pub fault_count_cache: u32,
    /// Saturating counter for ALU-class faults.
    pub fault_count_alu: u32,
    /// Saturating counter for host-class faults.
    pub fault_count_host: u32,
    /// Saturating counter for retired instructions.
    pub instruction_count: u64,
}

impl DiagCounters {
    /// Creates a zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault occurrence, updating the last fault info and incrementing
    /// the appropriate fault class counter.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_fault(&mut self, code: FaultCode, pc: u16, cycle: u64) {
        self.last_fault_code = Some(code);
        self.last_fault_pc = pc;
        self.last_fault_cycle = cycle;
        let counter = match code.class() {
            FaultClass::Decode => &mut self.fault_count_decode,
            FaultClass::Memory => &mut self.fault_count_memory,
            FaultClass::Cache => &mut self.fault_count_cache,
            FaultClass::Alu => &mut self.fault_count_alu,
            FaultClass::Host => &mut self.fault_count_host,
        };
        *counter = counter.saturating_add(1);
    }

    /// Increments the retired-instruction counter with saturating behavior.
    #[allow(clippy::missing_const_for_fn)]
    pub fn increment_instruction_count(&mut self) {
        self.instruction_count = self.instruction_count.saturating_add(1);
    }

    /// Total faults across every class.
    #[must_use]
    pub const fn total_faults(&self) -> u64 {
        self.fault_count_decode as u64
            + self.fault_count_memory as u64
            + self.fault_count_cache as u64
            + self.fault_count_alu as u64
            + self.fault_count_host as u64
    }

    /// Resets all diagnostic fields to their default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_zeroed() {
        let diag = DiagCounters::new();
        assert_eq!(diag.last_fault_code, None);
        assert_eq!(diag.instruction_count, 0);
        assert_eq!(diag.total_faults(), 0);
    }

    #[test]
    fn record_fault_tracks_last_fault_and_class() {
        let mut diag = DiagCounters::default();
        diag.record_fault(FaultCode::UndefinedOpcode, 0x0100, 42);
        diag.record_fault(FaultCode::UndefinedAddressingMode, 0x0102, 50);
        diag.record_fault(FaultCode::CacheInconsistency, 0x0104, 60);

        assert_eq!(diag.fault_count_decode, 2);
        assert_eq!(diag.fault_count_cache, 1);
        assert_eq!(diag.last_fault_code, Some(FaultCode::CacheInconsistency));
        assert_eq!(diag.last_fault_pc, 0x0104);
        assert_eq!(diag.last_fault_cycle, 60);
        assert_eq!(diag.total_faults(), 3);
    }

    #[test]
    fn record_fault_saturates_at_max() {
        let mut diag = DiagCounters {
            fault_count_host: u32::MAX,
            ..DiagCounters::default()
        };
        diag.record_fault(FaultCode::NoWriteTarget, 0, 0);
        assert_eq!(diag.fault_count_host, u32::MAX);
    }

    #[test]
    fn reset_clears_everything() {
        let mut diag = DiagCounters::default();
        diag.increment_instruction_count();
        diag.record_fault(FaultCode::AddressOutOfRange, 0, 0);
        diag.reset();
        assert_eq!(diag, DiagCounters::default());
    }
}

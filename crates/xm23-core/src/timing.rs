/// Pipeline activities that advance the cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CycleCostKind {
    /// Main-memory read or write through the bus.
    MemoryAccess,
    /// Instruction fetch stage.
    Fetch,
    /// Instruction decode stage.
    Decode,
    /// Dispatch into an instruction handler.
    Execute,
    /// Effective-address calculation for indexed or relative access.
    AddressCalculation,
    /// One pass through the binary adder.
    AdderPass,
    /// One nibble of a decimal add.
    BcdDigit,
    /// Access satisfied from a cache line.
    CacheHit,
}

/// Single source-of-truth cycle-cost table for every clocked activity.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u64)] = &[
    (CycleCostKind::MemoryAccess, 3),
    (CycleCostKind::Fetch, 1),
    (CycleCostKind::Decode, 1),
    (CycleCostKind::Execute, 1),
    (CycleCostKind::AddressCalculation, 1),
    (CycleCostKind::AdderPass, 1),
    (CycleCostKind::BcdDigit, 1),
    (CycleCostKind::CacheHit, 0),
];

/// Looks up the cycle cost for a cycle-cost kind.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u64> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}

/// Monotonic simulated cycle counter shared by every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Clock {
    cycles: u64,
}

impl Clock {
    /// Creates a clock at cycle zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { cycles: 0 }
    }

    /// Total cycles charged so far.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Charges the table cost of one activity.
    pub fn advance(&mut self, kind: CycleCostKind) {
        self.advance_by(cycle_cost(kind).unwrap_or(0));
    }

    /// Charges the table cost of an activity repeated `times` times.
    pub fn advance_times(&mut self, kind: CycleCostKind, times: u32) {
        self.advance_by(cycle_cost(kind).unwrap_or(0).saturating_mul(u64::from(times)));
    }

    /// Charges an explicit number of cycles.
    pub const fn advance_by(&mut self, cycles: u64) {
        self.cycles = self.cycles.saturating_add(cycles);
    }

    /// Returns the counter to zero.
    pub const fn reset(&mut self) {
        self.cycles = 0;
    }
}

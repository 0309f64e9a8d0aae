//! Word-granular data cache in front of main memory.
//!
//! Every data access issued by the execution units goes through the
//! [`CacheController`]. Lines hold one aligned word each. Placement is either
//! fully associative with recency-based replacement, or direct-mapped on
//! `address % line_count`. Stores are either written back on eviction or
//! written through immediately.
//!
//! Recency is tracked with per-line ages: touching a line gives it the maximum
//! age (`line_count - 1`) and decrements every non-zero line that was more
//! recent than the touched line's prior age. Ages therefore stay distinct and
//! the lowest age is always the least recently used line.

/// Cache line storage and console snapshots.
pub mod line;
/// Cache geometry and policy configuration.
pub mod policy;

pub use line::{CacheLine, CacheLineSnapshot};
pub use policy::{CacheConfig, MappingPolicy, WritePolicy, DEFAULT_CACHE_LINES, MAX_CACHE_LINES};

use crate::memory::{canonical_word_address, MainMemory, MemoryBus, Width};
use crate::{Clock, CycleCostKind, FaultCode};

/// Hit/miss accounting for the data cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheStats {
    /// Accesses satisfied by a resident line.
    pub hits: u64,
    /// Accesses that installed a line.
    pub misses: u64,
    /// Valid lines displaced by an installation.
    pub evictions: u64,
    /// Dirty lines flushed to memory.
    pub write_backs: u64,
}

/// Data cache owning the main memory it fronts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheController {
    memory: MainMemory,
    lines: Vec<CacheLine>,
    write_policy: WritePolicy,
    mapping: MappingPolicy,
    stats: CacheStats,
}

impl CacheController {
    /// Builds a cold cache over `memory`.
    ///
    /// The line count is clamped into `1..=MAX_CACHE_LINES`; call
    /// [`CacheConfig::validate`] first to reject bad geometry instead.
    #[must_use]
    pub fn new(config: &CacheConfig, memory: MainMemory) -> Self {
        let line_count = config.line_count.clamp(1, MAX_CACHE_LINES);
        Self {
            memory,
            lines: vec![CacheLine::default(); line_count],
            write_policy: config.write_policy,
            mapping: config.mapping,
            stats: CacheStats::default(),
        }
    }

    /// Main memory behind the cache.
    #[must_use]
    pub const fn memory(&self) -> &MainMemory {
        &self.memory
    }

    /// Mutable main memory, bypassing the cache.
    ///
    /// Used for instruction fetch and image loading. Writes made here are not
    /// reflected in resident lines.
    #[allow(clippy::missing_const_for_fn)]
    pub fn memory_mut(&mut self) -> &mut MainMemory {
        &mut self.memory
    }

    /// Raw line array.
    #[must_use]
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Store policy in effect.
    #[must_use]
    pub const fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Placement policy in effect.
    #[must_use]
    pub const fn mapping(&self) -> MappingPolicy {
        self.mapping
    }

    /// Hit/miss counters.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Console view of every line.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CacheLineSnapshot> {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| CacheLineSnapshot::capture(index, line))
            .collect()
    }

    /// Index of the line holding the word at `tag`, if resident.
    #[must_use]
    pub fn find(&self, tag: u16) -> Option<usize> {
        match self.mapping {
            MappingPolicy::DirectMapped => {
                let index = self.direct_index(tag);
                self.lines[index].holds(tag).then_some(index)
            }
            MappingPolicy::Associative => self.lines.iter().position(|line| line.holds(tag)),
        }
    }

    /// Writes every dirty line back to memory, leaving lines resident and clean.
    ///
    /// # Errors
    ///
    /// Propagates memory faults from the write-back.
    pub fn flush_all(&mut self, clock: &mut Clock) -> Result<(), FaultCode> {
        for index in 0..self.lines.len() {
            self.write_back(index, clock)?;
        }
        Ok(())
    }

    /// Flushes dirty lines, then empties the cache.
    ///
    /// # Errors
    ///
    /// Propagates memory faults from the write-back.
    pub fn invalidate_all(&mut self, clock: &mut Clock) -> Result<(), FaultCode> {
        self.flush_all(clock)?;
        self.discard_all();
        Ok(())
    }

    /// Empties the cache without writing anything back.
    pub fn discard_all(&mut self) {
        self.lines.fill(CacheLine::default());
    }

    /// Writes back, then drops, every line whose word overlaps
    /// `start..start + len`.
    ///
    /// A line straddling either edge of the range may hold a dirty byte
    /// outside it, so nothing is dropped unflushed.
    ///
    /// # Errors
    ///
    /// Propagates memory faults from the write-back.
    pub fn evict_range(
        &mut self,
        start: u16,
        len: usize,
        clock: &mut Clock,
    ) -> Result<(), FaultCode> {
        if len == 0 {
            return Ok(());
        }
        let first = usize::from(start & !1);
        let end = usize::from(start).saturating_add(len);
        for index in 0..self.lines.len() {
            let line = self.lines[index];
            let tag = usize::from(line.tag);
            if line.valid && tag >= first && tag < end {
                self.write_back(index, clock)?;
                self.lines[index] = CacheLine::default();
            }
        }
        Ok(())
    }

    /// Zeroes the hit/miss counters.
    pub const fn reset_stats(&mut self) {
        self.stats = CacheStats {
            hits: 0,
            misses: 0,
            evictions: 0,
            write_backs: 0,
        };
    }

    fn direct_index(&self, tag: u16) -> usize {
        usize::from(tag) % self.lines.len()
    }

    fn max_age(&self) -> u8 {
        u8::try_from(self.lines.len() - 1).unwrap_or(u8::MAX)
    }

    /// Marks `index` most recently used.
    fn touch(&mut self, index: usize) {
        let prior = self.lines[index].age;
        for line in &mut self.lines {
            if line.age > 0 && line.age > prior {
                line.age -= 1;
            }
        }
        self.lines[index].age = self.max_age();
    }

    /// Associative victims are invalid lines first, then the lowest age;
    /// the lowest index wins ties.
    fn select_victim(&self, tag: u16) -> usize {
        match self.mapping {
            MappingPolicy::DirectMapped => self.direct_index(tag),
            MappingPolicy::Associative => self
                .lines
                .iter()
                .enumerate()
                .min_by_key(|(_, line)| (line.valid, line.age))
                .map(|(index, _)| index)
                .unwrap_or(0),
        }
    }

    /// Writes only the dirty halves of a line back to memory.
    fn write_back(&mut self, index: usize, clock: &mut Clock) -> Result<(), FaultCode> {
        let line = self.lines[index];
        if !line.valid || !line.is_dirty() {
            return Ok(());
        }

        match (line.dirty_lo, line.dirty_hi) {
            (true, true) => self.memory.write(line.tag, Width::Word, line.content, clock)?,
            (true, false) => {
                self.memory
                    .write(line.tag, Width::Byte, line.content & 0x00FF, clock)?;
            }
            (false, true) => self.memory.write(
                line.tag.wrapping_add(1),
                Width::Byte,
                line.content >> 8,
                clock,
            )?,
            (false, false) => {}
        }

        tracing::debug!(
            line = index,
            address = format_args!("{:#06X}", line.tag),
            content = format_args!("{:#06X}", line.content),
            "dirty line written back"
        );
        self.lines[index].mark_clean();
        self.stats.write_backs = self.stats.write_backs.saturating_add(1);
        Ok(())
    }

    /// Places `content` for `tag` into the chosen victim, flushing it first.
    fn install(&mut self, tag: u16, content: u16, clock: &mut Clock) -> Result<usize, FaultCode> {
        let victim = self.select_victim(tag);
        if self.lines[victim].valid {
            tracing::trace!(
                line = victim,
                evicted = format_args!("{:#06X}", self.lines[victim].tag),
                installed = format_args!("{tag:#06X}"),
                "cache line evicted"
            );
            self.stats.evictions = self.stats.evictions.saturating_add(1);
        }
        self.write_back(victim, clock)?;

        let line = &mut self.lines[victim];
        line.tag = tag;
        line.content = content;
        line.valid = true;
        line.mark_clean();
        Ok(victim)
    }

    /// Re-locates a line that must be resident after installation.
    fn resident(&self, tag: u16) -> Result<usize, FaultCode> {
        self.find(tag).ok_or_else(|| {
            tracing::error!(
                address = format_args!("{tag:#06X}"),
                "installed cache line not found"
            );
            FaultCode::CacheInconsistency
        })
    }

    fn locate_or_fill(
        &mut self,
        tag: u16,
        fill: Option<u16>,
        clock: &mut Clock,
    ) -> Result<usize, FaultCode> {
        if let Some(index) = self.find(tag) {
            self.stats.hits = self.stats.hits.saturating_add(1);
            clock.advance(CycleCostKind::CacheHit);
            return Ok(index);
        }

        self.stats.misses = self.stats.misses.saturating_add(1);
        let content = match fill {
            Some(word) => word,
            None => self.memory.read(tag, Width::Word, clock)?,
        };
        self.install(tag, content, clock)?;
        self.resident(tag)
    }
}

impl MemoryBus for CacheController {
    fn read(&mut self, addr: u16, width: Width, clock: &mut Clock) -> Result<u16, FaultCode> {
        let addr = match width {
            Width::Word => canonical_word_address(addr),
            Width::Byte => addr,
        };
        let tag = addr & !1;

        let index = self.locate_or_fill(tag, None, clock)?;
        self.touch(index);
        Ok(self.lines[index].read(addr, width))
    }

    fn write(
        &mut self,
        addr: u16,
        width: Width,
        value: u16,
        clock: &mut Clock,
    ) -> Result<(), FaultCode> {
        let addr = match width {
            Width::Word => canonical_word_address(addr),
            Width::Byte => addr,
        };
        let tag = addr & !1;

        // A full-word store needs nothing from memory.
        let fill = (width == Width::Word).then_some(value);
        let index = self.locate_or_fill(tag, fill, clock)?;

        let halves = self.lines[index].store(addr, width, value);
        match self.write_policy {
            WritePolicy::WriteBack => self.lines[index].mark_dirty(halves),
            WritePolicy::WriteThrough => self.memory.write(addr, width, value, clock)?,
        }
        self.touch(index);
        Ok(())
    }
}

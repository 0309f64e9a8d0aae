use crate::memory::Width;

/// One cached memory word.
///
/// `tag` is the even address of the word. The two dirty bits track which
/// halves differ from main memory so a byte store never flushes its neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheLine {
    pub(super) tag: u16,
    pub(super) content: u16,
    pub(super) valid: bool,
    pub(super) dirty_lo: bool,
    pub(super) dirty_hi: bool,
    pub(super) age: u8,
}

impl CacheLine {
    /// Even address of the cached word.
    #[must_use]
    pub const fn tag(&self) -> u16 {
        self.tag
    }

    /// Cached word.
    #[must_use]
    pub const fn content(&self) -> u16 {
        self.content
    }

    /// Whether the line holds a word.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether either half differs from main memory.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty_lo || self.dirty_hi
    }

    /// Recency counter; higher is more recently used.
    #[must_use]
    pub const fn age(&self) -> u8 {
        self.age
    }

    pub(super) const fn holds(&self, tag: u16) -> bool {
        self.valid && self.tag == tag
    }

    /// Reads the word or the byte at `addr` (low byte at the even address).
    pub(super) const fn read(&self, addr: u16, width: Width) -> u16 {
        match width {
            Width::Word => self.content,
            Width::Byte if addr & 1 == 0 => self.content & 0x00FF,
            Width::Byte => self.content >> 8,
        }
    }

    /// Patches the word or one byte and returns which halves changed.
    pub(super) const fn store(&mut self, addr: u16, width: Width, value: u16) -> (bool, bool) {
        match width {
            Width::Word => {
                self.content = value;
                (true, true)
            }
            Width::Byte if addr & 1 == 0 => {
                self.content = (self.content & 0xFF00) | (value & 0x00FF);
                (true, false)
            }
            Width::Byte => {
                self.content = (self.content & 0x00FF) | ((value & 0x00FF) << 8);
                (false, true)
            }
        }
    }

    pub(super) const fn mark_dirty(&mut self, halves: (bool, bool)) {
        self.dirty_lo |= halves.0;
        self.dirty_hi |= halves.1;
    }

    pub(super) const fn mark_clean(&mut self) {
        self.dirty_lo = false;
        self.dirty_hi = false;
    }
}

/// Console view of one cache line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheLineSnapshot {
    /// Position in the line array.
    pub index: usize,
    /// Even address of the cached word.
    pub address: u16,
    /// Cached word.
    pub content: u16,
    /// Whether the line holds a word.
    pub valid: bool,
    /// Low byte differs from memory.
    pub dirty_lo: bool,
    /// High byte differs from memory.
    pub dirty_hi: bool,
    /// Recency counter.
    pub age: u8,
}

impl CacheLineSnapshot {
    pub(super) const fn capture(index: usize, line: &CacheLine) -> Self {
        Self {
            index,
            address: line.tag,
            content: line.content,
            valid: line.valid,
            dirty_lo: line.dirty_lo,
            dirty_hi: line.dirty_hi,
            age: line.age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CacheLine;
    use crate::memory::Width;

    #[test]
    fn byte_halves_follow_little_endian_layout() {
        let mut line = CacheLine {
            tag: 0x0100,
            content: 0xAABB,
            valid: true,
            ..CacheLine::default()
        };
        assert_eq!(line.read(0x0100, Width::Byte), 0x00BB);
        assert_eq!(line.read(0x0101, Width::Byte), 0x00AA);

        assert_eq!(line.store(0x0101, Width::Byte, 0x1234), (false, true));
        assert_eq!(line.content(), 0x34BB);
        assert_eq!(line.store(0x0100, Width::Byte, 0x0056), (true, false));
        assert_eq!(line.content(), 0x3456);
    }

    #[test]
    fn dirty_halves_accumulate_until_cleaned() {
        let mut line = CacheLine::default();
        line.mark_dirty((false, true));
        assert!(line.is_dirty());
        line.mark_dirty((true, false));
        assert!(line.dirty_lo && line.dirty_hi);
        line.mark_clean();
        assert!(!line.is_dirty());
    }
}

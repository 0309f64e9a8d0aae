//! Data cache replacement and write-policy behaviour.

#![allow(clippy::pedantic, clippy::nursery)]

use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;
use xm23_core::{
    CacheConfig, CacheController, Clock, CoreConfig, CoreState, MainMemory, MappingPolicy,
    MemoryBus, Width, WritePolicy,
};

fn controller(line_count: usize, write_policy: WritePolicy, mapping: MappingPolicy) -> CacheController {
    let config = CacheConfig {
        line_count,
        write_policy,
        mapping,
    };
    config.validate().expect("valid geometry");
    CacheController::new(&config, MainMemory::new())
}

#[test]
fn associative_cache_evicts_least_recently_used() {
    let mut cache = controller(4, WritePolicy::WriteBack, MappingPolicy::Associative);
    let mut clock = Clock::new();

    for addr in [0x0000, 0x0002, 0x0004, 0x0006] {
        cache.read(addr, Width::Word, &mut clock).expect("read");
    }
    // Refresh the oldest line so 0x0002 becomes the victim.
    cache.read(0x0000, Width::Word, &mut clock).expect("read");
    cache.read(0x0008, Width::Word, &mut clock).expect("read");

    assert!(cache.find(0x0000).is_some());
    assert!(cache.find(0x0002).is_none());
    assert!(cache.find(0x0004).is_some());
    assert!(cache.find(0x0006).is_some());
    assert!(cache.find(0x0008).is_some());
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn write_back_defers_memory_until_flush() {
    let mut cache = controller(4, WritePolicy::WriteBack, MappingPolicy::Associative);
    let mut clock = Clock::new();

    cache
        .write(0x0100, Width::Word, 0x1234, &mut clock)
        .expect("write");
    assert_eq!(cache.memory().peek_word(0x0100), 0x0000);
    assert_eq!(cache.read(0x0100, Width::Word, &mut clock), Ok(0x1234));

    let line = cache.lines()[cache.find(0x0100).expect("resident")];
    assert!(line.is_dirty());

    cache.flush_all(&mut clock).expect("flush");
    assert_eq!(cache.memory().peek_word(0x0100), 0x1234);
    assert_eq!(cache.memory().peek_byte(0x0100), 0x34);
}

#[test]
fn write_through_updates_memory_immediately() {
    let mut cache = controller(4, WritePolicy::WriteThrough, MappingPolicy::Associative);
    let mut clock = Clock::new();

    cache
        .write(0x0200, Width::Word, 0xBEEF, &mut clock)
        .expect("write");
    assert_eq!(cache.memory().peek_word(0x0200), 0xBEEF);
    cache
        .write(0x0201, Width::Byte, 0x0012, &mut clock)
        .expect("write");
    assert_eq!(cache.memory().peek_word(0x0200), 0x12EF);

    assert!(cache.lines().iter().all(|line| !line.is_dirty()));
    assert_eq!(cache.read(0x0200, Width::Word, &mut clock), Ok(0x12EF));
}

#[test]
fn read_hit_leaves_memory_untouched() {
    let mut cache = controller(8, WritePolicy::WriteBack, MappingPolicy::Associative);
    cache
        .memory_mut()
        .load(0x0300, &[0x78, 0x56])
        .expect("load");
    let before = cache.memory().clone();
    let mut clock = Clock::new();

    assert_eq!(cache.read(0x0300, Width::Word, &mut clock), Ok(0x5678));
    let after_miss = clock.cycles();
    assert_eq!(cache.read(0x0300, Width::Word, &mut clock), Ok(0x5678));

    assert_eq!(clock.cycles(), after_miss);
    assert_eq!(cache.memory(), &before);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn direct_mapped_conflicting_addresses_evict_each_other() {
    let mut cache = controller(32, WritePolicy::WriteBack, MappingPolicy::DirectMapped);
    let mut clock = Clock::new();

    cache
        .write(0x0000, Width::Word, 0xAAAA, &mut clock)
        .expect("write");
    cache
        .write(0x0040, Width::Word, 0xBBBB, &mut clock)
        .expect("write");

    assert!(cache.find(0x0000).is_none());
    assert_eq!(cache.find(0x0040), Some(0));
    assert_eq!(cache.memory().peek_word(0x0000), 0xAAAA);
    assert_eq!(cache.memory().peek_word(0x0040), 0x0000);

    assert_eq!(cache.read(0x0000, Width::Word, &mut clock), Ok(0xAAAA));
    assert_eq!(cache.memory().peek_word(0x0040), 0xBBBB);
    assert_eq!(cache.stats().write_backs, 2);
}

#[rstest]
#[case(WritePolicy::WriteBack)]
#[case(WritePolicy::WriteThrough)]
fn byte_store_merges_into_resident_word(#[case] policy: WritePolicy) {
    let mut cache = controller(4, policy, MappingPolicy::Associative);
    cache
        .memory_mut()
        .load(0x0400, &[0x11, 0x22])
        .expect("load");
    let mut clock = Clock::new();

    cache
        .write(0x0400, Width::Byte, 0x00CD, &mut clock)
        .expect("write");
    assert_eq!(cache.read(0x0400, Width::Word, &mut clock), Ok(0x22CD));
    assert_eq!(cache.read(0x0401, Width::Byte, &mut clock), Ok(0x0022));

    cache.flush_all(&mut clock).expect("flush");
    assert_eq!(cache.memory().peek_word(0x0400), 0x22CD);
}

#[test]
fn core_reset_discards_unflushed_stores() {
    let mut state = CoreState::with_config(&CoreConfig::default()).expect("valid");
    state
        .cache
        .write(0x0500, Width::Word, 0x4242, &mut state.clock)
        .expect("write");
    state.reset();
    assert_eq!(state.cache.memory().peek_word(0x0500), 0x0000);

    state
        .cache
        .write(0x0500, Width::Word, 0x4242, &mut state.clock)
        .expect("write");
    state.flush_cache().expect("flush");
    state.reset();
    assert_eq!(state.cache.memory().peek_word(0x0500), 0x4242);
}

proptest! {
    #[test]
    fn cache_contents_match_memory_after_flush(
        writes in prop::collection::vec((0u16..0x0100, any::<u16>(), any::<bool>()), 1..64),
        through in any::<bool>(),
        direct in any::<bool>(),
    ) {
        let policy = if through { WritePolicy::WriteThrough } else { WritePolicy::WriteBack };
        let mapping = if direct { MappingPolicy::DirectMapped } else { MappingPolicy::Associative };
        let mut cache = controller(8, policy, mapping);
        let mut shadow = MainMemory::new();
        let mut clock = Clock::new();
        let mut shadow_clock = Clock::new();

        for (addr, value, byte) in writes {
            let width = if byte { Width::Byte } else { Width::Word };
            cache.write(addr, width, value, &mut clock).expect("in range");
            shadow.write(addr, width, value, &mut shadow_clock).expect("in range");
        }

        for addr in (0u16..0x0100).step_by(2) {
            prop_assert_eq!(
                cache.read(addr, Width::Word, &mut clock).expect("in range"),
                shadow.peek_word(addr)
            );
        }
        cache.flush_all(&mut clock).expect("flush");
        prop_assert_eq!(cache.memory(), &shadow);
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use xm23_core::{
    CacheConfig, CoreConfig, CoreState, Decoder, MappingPolicy, StepOutcome, WritePolicy,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let word = u16::from_le_bytes([data[0], data[1]]);
    let _ = Decoder::decode(word);

    let config = CoreConfig {
        cache: CacheConfig {
            line_count: usize::from(data[2] % 64) + 1,
            write_policy: if data[2] & 0x40 == 0 {
                WritePolicy::WriteBack
            } else {
                WritePolicy::WriteThrough
            },
            mapping: if data[2] & 0x80 == 0 {
                MappingPolicy::Associative
            } else {
                MappingPolicy::DirectMapped
            },
        },
        entry_point: 0,
    };
    let Ok(mut state) = CoreState::with_config(&config) else {
        return;
    };
    let image = &data[3..];
    if state.load_image(0, image).is_err() {
        return;
    }

    for _ in 0..image.len().min(256) {
        if let StepOutcome::Fault { cause, .. } = state.step() {
            assert!(!cause.is_fatal(), "in-range program raised {cause}");
        }
    }
    let _ = state.flush_cache();
});

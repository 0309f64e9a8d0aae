use crate::FaultCode;

/// Line count used when no configuration is supplied.
pub const DEFAULT_CACHE_LINES: usize = 32;
/// Largest supported line count; recency ages must fit a byte.
pub const MAX_CACHE_LINES: usize = 256;

/// When a store reaches main memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WritePolicy {
    /// Stores mark the line dirty; memory is updated on eviction.
    #[default]
    WriteBack,
    /// Stores update the line and main memory immediately.
    WriteThrough,
}

/// Where an address may live in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MappingPolicy {
    /// Any line; victims chosen by recency.
    #[default]
    Associative,
    /// Exactly one line, `address % line_count`.
    DirectMapped,
}

/// Cache geometry and policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheConfig {
    /// Number of one-word lines.
    pub line_count: usize,
    /// Store policy.
    pub write_policy: WritePolicy,
    /// Placement policy.
    pub mapping: MappingPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            line_count: DEFAULT_CACHE_LINES,
            write_policy: WritePolicy::default(),
            mapping: MappingPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Checks the configuration is buildable.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidConfiguration`] when `line_count` is zero or
    /// above [`MAX_CACHE_LINES`].
    pub const fn validate(&self) -> Result<(), FaultCode> {
        if self.line_count == 0 || self.line_count > MAX_CACHE_LINES {
            Err(FaultCode::InvalidConfiguration)
        } else {
            Ok(())
        }
    }
}

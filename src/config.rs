//! Configuration Module
//!
//! Handles loading and managing cache engine configuration from environment
//! variables.

use std::env;

/// Cache engine configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. One `CacheConfig` is built per `CacheStore` instance; there is
/// no ambient global state.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries a namespace can hold
    pub max_entries: usize,
    /// Maximum aggregate serialized size of a namespace in bytes
    pub max_size_bytes: usize,
    /// Absolute per-entry size cap in bytes; larger entries are rejected
    pub max_entry_bytes: usize,
    /// Time-to-live in milliseconds; absolute from creation, never refreshed
    pub ttl_ms: i64,
    /// Character count above which textual payloads are compacted
    pub compression_threshold: usize,
    /// Number of oldest entries removed per reactive pruning round
    pub eviction_batch: usize,
    /// Number of oldest entries removed on a quota-exceeded recovery
    pub emergency_batch: usize,
    /// Minimum interval between maintenance sweeps in milliseconds
    pub sweep_interval_ms: i64,
    /// Fraction of entries evicted by a maintenance sweep (0.0..=1.0)
    pub sweep_fraction: f64,
    /// Coalescing window for stats recomputation triggers in milliseconds
    pub stats_debounce_ms: u64,
    /// Minimum interval between stats recomputations in milliseconds
    pub stats_min_interval_ms: u64,
    /// Version string stamped on newly encoded entries
    pub entry_version: Option<String>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum entries per namespace (default: 100)
    /// - `CACHE_MAX_SIZE_BYTES` - Aggregate namespace budget (default: 4 MB)
    /// - `CACHE_MAX_ENTRY_BYTES` - Per-entry cap (default: 1 MB)
    /// - `CACHE_TTL_MS` - Entry time-to-live (default: 7 days)
    /// - `CACHE_COMPRESSION_THRESHOLD` - Compaction threshold (default: 100000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("CACHE_MAX_ENTRIES", defaults.max_entries),
            max_size_bytes: env_or("CACHE_MAX_SIZE_BYTES", defaults.max_size_bytes),
            max_entry_bytes: env_or("CACHE_MAX_ENTRY_BYTES", defaults.max_entry_bytes),
            ttl_ms: env_or("CACHE_TTL_MS", defaults.ttl_ms),
            compression_threshold: env_or(
                "CACHE_COMPRESSION_THRESHOLD",
                defaults.compression_threshold,
            ),
            ..defaults
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_size_bytes: 4 * 1024 * 1024,
            max_entry_bytes: 1024 * 1024,
            ttl_ms: 7 * 24 * 60 * 60 * 1000,
            compression_threshold: 100_000,
            eviction_batch: 3,
            emergency_batch: 8,
            sweep_interval_ms: 7 * 24 * 60 * 60 * 1000,
            sweep_fraction: 0.25,
            stats_debounce_ms: 250,
            stats_min_interval_ms: 1000,
            entry_version: Some("1".to_string()),
        }
    }
}

/// Reads an environment variable, falling back to a default on absence or
/// parse failure.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

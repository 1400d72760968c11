//! Cache Module
//!
//! The bounded content cache engine: deterministic key derivation, TTL
//! expiry, count/size-bounded eviction, quota-exceeded recovery, best-effort
//! compression of oversized payloads, and hit/miss statistics.

mod codec;
mod entry;
mod eviction;
mod key;
mod stats;
mod store;


// Re-export public types
pub use codec::{EncodedEntry, EntryCodec};
pub use entry::{current_timestamp_ms, CacheEntry, Payload};
pub use eviction::{EvictionDemand, EvictionPolicy};
pub use key::{KeyDeriver, Subject};
pub use stats::{CacheStats, StatsTracker};
pub use store::CacheStore;

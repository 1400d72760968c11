//! Content Cache - a bounded client-side content cache engine
//!
//! Avoids re-running expensive, rate-limited, or paid analysis work for
//! content already processed: deterministic key derivation from text or file
//! identity, absolute TTL expiry, count/size-bounded eviction, recovery from
//! storage quota exhaustion, lossy compaction of oversized payloads, and
//! hit/miss statistics.
//!
//! # Example
//!
//! ```
//! use content_cache::{CacheConfig, CacheStore, Payload, Subject};
//! use content_cache::storage::{shared, MemoryBackend};
//!
//! let backend = shared(MemoryBackend::new());
//! let mut cache = CacheStore::new(backend, "analysis:", CacheConfig::default());
//!
//! let subject = Subject::analysis("the document text", "provider-a");
//! if cache.get(&subject).is_none() {
//!     // ... run the expensive analysis ...
//!     cache.set(&subject, Payload::from("analysis result"));
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

pub use cache::{
    CacheEntry, CacheStats, CacheStore, EntryCodec, EvictionDemand, EvictionPolicy, KeyDeriver,
    Payload, StatsTracker, Subject,
};
pub use config::CacheConfig;
pub use error::{CacheError, StorageError};

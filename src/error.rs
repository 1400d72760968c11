//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! None of these errors escape the public `CacheStore` surface: every public
//! operation degrades to a typed "no data" result (`Option`/`bool`/count) and
//! the failure kind is only logged for observability.

use thiserror::Error;

// == Storage Error Enum ==
/// Failures reported by the underlying storage medium.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The medium refused a write because its total capacity is exhausted
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// The medium is inaccessible (disabled or blocked by the host)
    #[error("Storage unavailable")]
    Unavailable,
}

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Stored entry failed to parse; treated as absent and purged
    #[error("Corrupted entry at key: {0}")]
    Corrupted(String),

    /// Encoded entry exceeds the absolute per-entry size cap
    #[error("Entry oversize: {size} bytes exceeds cap of {cap} bytes")]
    Oversize { size: usize, cap: usize },
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        assert_eq!(
            StorageError::QuotaExceeded.to_string(),
            "Storage quota exceeded"
        );
        assert_eq!(StorageError::Unavailable.to_string(), "Storage unavailable");
    }

    #[test]
    fn test_oversize_display() {
        let err = CacheError::Oversize {
            size: 2048,
            cap: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Entry oversize: 2048 bytes exceeds cap of 1024 bytes"
        );
    }
}

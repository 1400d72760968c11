//! In-Memory Backend
//!
//! Quota-limited in-process implementation of [`StorageBackend`].

use std::collections::BTreeMap;

use crate::error::StorageError;
use crate::storage::StorageBackend;

// == Memory Backend ==
/// In-memory storage with an optional global byte quota.
///
/// The quota covers the sum of key and value byte lengths across every
/// namespace sharing the backend. A write that would push usage past the
/// quota fails with [`StorageError::QuotaExceeded`] and leaves the previous
/// value intact.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Key-value storage; BTreeMap keeps enumeration deterministic
    items: BTreeMap<String, String>,
    /// Global byte quota, None = unbounded
    quota_bytes: Option<usize>,
    /// Current usage in bytes (keys + values)
    used_bytes: usize,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates an unbounded in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with a global byte quota.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Returns current usage in bytes.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Returns the number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_len = self.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
        let new_len = key.len() + value.len();
        let projected = self.used_bytes - old_len + new_len;

        if let Some(quota) = self.quota_bytes {
            if projected > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        self.used_bytes = projected;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if let Some(value) = self.items.remove(key) {
            self.used_bytes -= key.len() + value.len();
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.keys().cloned().collect())
    }
}

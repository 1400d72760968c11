//! Storage Module
//!
//! Abstraction over the synchronous key-value medium the cache persists into.
//!
//! All namespaces share one physical backend with a single global quota, so a
//! store can see quota pressure caused by other namespaces writing into the
//! same medium. Backends are shared between `CacheStore` instances via
//! [`SharedBackend`]; the engine is single-threaded throughout, so interior
//! mutability is `RefCell`, not a lock.

mod memory;

pub use memory::MemoryBackend;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::StorageError;

// == Storage Backend Trait ==
/// A synchronous, string-keyed, string-valued storage medium.
///
/// Writes may fail with [`StorageError::QuotaExceeded`] when the medium's
/// total capacity is exhausted, and any operation may fail with
/// [`StorageError::Unavailable`] when the medium is inaccessible.
pub trait StorageBackend {
    /// Reads the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, overwriting any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the value stored under `key`. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Enumerates every key currently present in the medium, across all
    /// namespaces.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

// == Shared Backend Handle ==
/// Shared handle to a backend, allowing multiple namespaced stores to coexist
/// inside one physically bounded medium.
pub type SharedBackend = Rc<RefCell<dyn StorageBackend>>;

/// Wraps a backend into a [`SharedBackend`] handle.
pub fn shared<B: StorageBackend + 'static>(backend: B) -> SharedBackend {
    Rc::new(RefCell::new(backend))
}

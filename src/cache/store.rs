//! Cache Store Module
//!
//! The public cache engine: composes key derivation, the entry codec, the
//! eviction policy, and the stats tracker over a shared storage backend, and
//! handles quota-exceeded recovery.
//!
//! Every public operation is best-effort and total: corruption, quota
//! pressure, and an unavailable medium all degrade to a typed "no data"
//! result. A caller that ignores every return value still behaves correctly;
//! the cache is never allowed to break the feature it accelerates.

use tracing::{debug, info, warn};

use crate::cache::codec::{timestamp_or_zero, EncodedEntry, EntryCodec};
use crate::cache::entry::{current_timestamp_ms, Payload};
use crate::cache::eviction::{EvictionDemand, EvictionPolicy};
use crate::cache::key::{KeyDeriver, Subject};
use crate::cache::stats::{CacheStats, StatsTracker};
use crate::config::CacheConfig;
use crate::error::{CacheError, StorageError};
use crate::storage::SharedBackend;

// == Constants ==
/// Segment marking namespace metadata keys (e.g. the sweep marker), which
/// are excluded from entry enumeration and eviction in every namespace.
const META_SEGMENT: &str = "__meta:";

// == Cache Store ==
/// A namespaced, bounded cache over a shared storage backend.
///
/// Multiple stores with different namespace prefixes coexist inside one
/// physically bounded medium; enumeration, eviction, and `clear` are scoped
/// to this store's prefix, but quota recovery may fall back to evicting the
/// oldest entries across the whole medium when namespace-local pruning is
/// insufficient.
pub struct CacheStore {
    /// Shared storage medium
    backend: SharedBackend,
    /// Key derivation for this namespace
    deriver: KeyDeriver,
    /// Entry serialization and compression
    codec: EntryCodec,
    /// Bound-satisfaction eviction
    policy: EvictionPolicy,
    /// Hit/miss counters and debounced aggregates
    stats: StatsTracker,
    /// Engine configuration
    config: CacheConfig,
    /// Latched false after the medium first reports itself unavailable;
    /// not re-probed within the store's lifetime
    available: bool,
    /// Persisted last-run marker for the maintenance sweep
    sweep_marker_key: String,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store for `namespace` over a shared backend.
    ///
    /// One store is created per namespace at application start and lives for
    /// the session. Construction attempts a maintenance sweep, gated by the
    /// persisted last-run marker.
    pub fn new(backend: SharedBackend, namespace: &str, config: CacheConfig) -> Self {
        let mut store = Self {
            backend,
            deriver: KeyDeriver::new(namespace),
            codec: EntryCodec::new(config.compression_threshold, config.entry_version.clone()),
            policy: EvictionPolicy::new(
                config.eviction_batch,
                config.emergency_batch,
                config.sweep_fraction,
                config.sweep_interval_ms,
            ),
            stats: StatsTracker::new(config.stats_debounce_ms, config.stats_min_interval_ms),
            sweep_marker_key: format!("{}{}last_sweep", namespace, META_SEGMENT),
            config,
            available: true,
        };
        store.run_maintenance();
        store
    }

    /// Derives the storage key this store would use for a subject.
    pub fn key_for(&self, subject: &Subject<'_>) -> String {
        self.deriver.derive(subject)
    }

    // == Get ==
    /// Retrieves the payload cached for a subject.
    ///
    /// Absent, corrupted, and expired entries are all misses; corrupted and
    /// expired entries are purged on the way out. Never panics, never errors.
    pub fn get(&mut self, subject: &Subject<'_>) -> Option<Payload> {
        let key = self.deriver.derive(subject);

        let raw = match self.storage_read(&key) {
            Some(raw) => raw,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        let entry = match self.codec.decode(&key, &raw) {
            Ok(entry) => entry,
            Err(_) => {
                warn!(%key, "purging corrupted entry");
                self.purge(&key);
                self.stats.record_miss();
                return None;
            }
        };

        if entry.is_expired(self.config.ttl_ms, current_timestamp_ms()) {
            debug!(%key, age_ms = entry.age_ms(current_timestamp_ms()), "purging expired entry");
            self.purge(&key);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        Some(entry.payload)
    }

    // == Set ==
    /// Caches a payload for a subject, returning whether it was stored.
    ///
    /// An entry over the per-entry cap is rejected outright with no partial
    /// write and no eviction. Otherwise the namespace is pruned reactively
    /// until the entry fits its bounds, the write is attempted, and a
    /// quota-exceeded write goes through emergency eviction, one retry, and
    /// finally a degraded write before giving up.
    pub fn set(&mut self, subject: &Subject<'_>, payload: Payload) -> bool {
        if !self.available {
            return false;
        }

        let key = self.deriver.derive(subject);
        let encoded = match self.codec.encode(payload) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(%key, %err, "failed to encode entry");
                return false;
            }
        };

        if encoded.size_estimate() > self.config.max_entry_bytes {
            let err = CacheError::Oversize {
                size: encoded.size_estimate(),
                cap: self.config.max_entry_bytes,
            };
            warn!(%key, %err, "rejecting entry");
            return false;
        }

        if !self.prune_until_fits(&key, encoded.size_estimate()) {
            debug!(%key, "entry does not fit even with namespace emptied");
            return false;
        }

        let stored = self.write_with_recovery(&key, &encoded);
        if stored {
            self.stats.note_write(current_timestamp_ms());
            self.poll_stats();
        }
        stored
    }

    // == Delete ==
    /// Removes the entry for a subject; returns whether it existed.
    pub fn delete(&mut self, subject: &Subject<'_>) -> bool {
        let key = self.deriver.derive(subject);
        let existed = self.storage_read(&key).is_some();
        if existed {
            self.purge(&key);
            self.stats.note_write(current_timestamp_ms());
            self.poll_stats();
        }
        existed
    }

    // == Clear ==
    /// Removes every entry under this namespace and resets statistics.
    /// Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        let keys = self.namespace_keys();
        let count = keys.len();
        for key in keys {
            self.purge(&key);
        }
        let marker = self.sweep_marker_key.clone();
        self.purge(&marker);
        self.stats.reset();
        info!(namespace = self.deriver.prefix(), count, "cleared namespace");
        count
    }

    // == Has ==
    /// Pure existence probe for diagnostics: no hit/miss counting, no
    /// TTL-purging side effects.
    pub fn has(&self, subject: &Subject<'_>) -> bool {
        if !self.available {
            return false;
        }
        let key = self.deriver.derive(subject);
        matches!(self.backend.borrow().read(&key), Ok(Some(_)))
    }

    // == Stats ==
    /// Returns current statistics, performing a pending aggregate scan if
    /// one is due.
    pub fn stats(&mut self) -> CacheStats {
        self.poll_stats();
        self.stats.snapshot()
    }

    // == Length ==
    /// Returns the current number of entries in the namespace.
    pub fn len(&self) -> usize {
        self.namespace_keys().len()
    }

    /// Returns true if the namespace holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Maintenance Sweep ==
    /// Runs the bulk maintenance sweep if it is due.
    ///
    /// Time-gated by the persisted last-run marker; when due and the
    /// namespace is more than half full by count or size, evicts the
    /// configured fraction of entries, oldest first. Returns the number of
    /// entries removed.
    pub fn run_maintenance(&mut self) -> usize {
        if !self.available {
            return 0;
        }

        let now = current_timestamp_ms();
        let marker = self.sweep_marker_key.clone();
        let last_run = self
            .storage_read(&marker)
            .and_then(|raw| raw.parse::<i64>().ok());
        if !self.policy.sweep_due(last_run, now) {
            return 0;
        }

        let (count, bytes) = self.usage(None);
        let mut removed = 0;
        if count * 2 > self.config.max_entries || bytes * 2 > self.config.max_size_bytes {
            let candidates = self.candidates(None);
            let victims = self
                .policy
                .select_for_eviction(&candidates, EvictionDemand::Sweep);
            removed = victims.len();
            for key in victims {
                self.purge(&key);
            }
            info!(namespace = self.deriver.prefix(), removed, "maintenance sweep evicted entries");
        }

        self.record_sweep(now);
        if removed > 0 {
            self.stats.note_write(now);
            self.poll_stats();
        }
        removed
    }

    // == Bound Satisfaction ==
    /// Reactively prunes the namespace until `incoming_bytes` fits within
    /// both bounds alongside the existing entries. Returns false when the
    /// namespace is empty and the entry still does not fit.
    fn prune_until_fits(&mut self, incoming_key: &str, incoming_bytes: usize) -> bool {
        loop {
            let (count, bytes) = self.usage(Some(incoming_key));
            let fits = count + 1 <= self.config.max_entries
                && bytes + incoming_bytes <= self.config.max_size_bytes;
            if fits {
                return true;
            }

            let candidates = self.candidates(Some(incoming_key));
            if candidates.is_empty() {
                return false;
            }

            let victims = self
                .policy
                .select_for_eviction(&candidates, EvictionDemand::Reactive);
            if victims.is_empty() {
                return false;
            }
            debug!(
                namespace = self.deriver.prefix(),
                evicting = victims.len(),
                "reactive pre-insert pruning"
            );
            for key in victims {
                self.purge(&key);
            }
        }
    }

    // == Quota Recovery ==
    /// Attempts the write, recovering from quota exhaustion with an
    /// emergency eviction plus one retry, then a degraded write.
    fn write_with_recovery(&mut self, key: &str, encoded: &EncodedEntry) -> bool {
        match self.storage_write(key, &encoded.raw) {
            Ok(()) => return true,
            Err(StorageError::Unavailable) => return false,
            Err(StorageError::QuotaExceeded) => {
                warn!(%key, "write hit storage quota, attempting emergency eviction");
            }
        }

        self.emergency_evict(key);

        match self.storage_write(key, &encoded.raw) {
            Ok(()) => return true,
            Err(StorageError::Unavailable) => return false,
            Err(StorageError::QuotaExceeded) => {
                warn!(%key, "retry after emergency eviction failed, attempting degraded write");
            }
        }

        let degraded = match self.codec.encode_degraded(encoded.entry.payload.clone()) {
            Ok(degraded) => degraded,
            Err(_) => return false,
        };
        match self.storage_write(key, &degraded.raw) {
            Ok(()) => {
                warn!(%key, "stored degraded entry after quota pressure");
                true
            }
            Err(err) => {
                warn!(%key, %err, "all write attempts failed");
                false
            }
        }
    }

    /// Removes a larger batch of oldest entries, namespace-local first; when
    /// the namespace cannot supply the full batch, falls back to the oldest
    /// entries across the whole medium, since quota pressure may come from
    /// other namespaces sharing it.
    fn emergency_evict(&mut self, protect: &str) {
        let local = self.candidates(Some(protect));
        let mut victims = self
            .policy
            .select_for_eviction(&local, EvictionDemand::Emergency);

        let shortfall = self.policy.emergency_batch().saturating_sub(victims.len());
        if shortfall > 0 {
            let foreign: Vec<(String, i64)> = self
                .all_entry_keys()
                .into_iter()
                .filter(|key| key != protect && !victims.contains(key))
                .filter_map(|key| {
                    let raw = self.backend.borrow().read(&key).ok().flatten()?;
                    Some((key, timestamp_or_zero(&raw)))
                })
                .collect();
            let mut cross = self
                .policy
                .select_for_eviction(&foreign, EvictionDemand::Emergency);
            cross.truncate(shortfall);
            warn!(
                namespace = self.deriver.prefix(),
                cross_namespace = cross.len(),
                "emergency eviction reaching across namespaces"
            );
            victims.extend(cross);
        }

        info!(
            namespace = self.deriver.prefix(),
            evicted = victims.len(),
            "emergency eviction"
        );
        for key in victims {
            self.purge(&key);
        }
    }

    // == Namespace Enumeration ==
    /// Keys of this namespace's entries, excluding metadata keys.
    fn namespace_keys(&self) -> Vec<String> {
        let prefix = self.deriver.prefix();
        self.backend
            .borrow()
            .keys()
            .unwrap_or_default()
            .into_iter()
            .filter(|key| key.starts_with(prefix) && !key.contains(META_SEGMENT))
            .collect()
    }

    /// Every entry key in the medium, across all namespaces, excluding
    /// metadata keys.
    fn all_entry_keys(&self) -> Vec<String> {
        self.backend
            .borrow()
            .keys()
            .unwrap_or_default()
            .into_iter()
            .filter(|key| !key.contains(META_SEGMENT))
            .collect()
    }

    /// `(key, createdAt)` pairs for this namespace, excluding `exclude`;
    /// corrupted entries carry timestamp 0.
    fn candidates(&self, exclude: Option<&str>) -> Vec<(String, i64)> {
        self.namespace_keys()
            .into_iter()
            .filter(|key| Some(key.as_str()) != exclude)
            .filter_map(|key| {
                let raw = self.backend.borrow().read(&key).ok().flatten()?;
                Some((key, timestamp_or_zero(&raw)))
            })
            .collect()
    }

    /// Entry count and aggregate serialized bytes for this namespace,
    /// excluding `exclude` (the key about to be overwritten).
    fn usage(&self, exclude: Option<&str>) -> (usize, usize) {
        let mut count = 0;
        let mut bytes = 0;
        for key in self.namespace_keys() {
            if Some(key.as_str()) == exclude {
                continue;
            }
            if let Ok(Some(raw)) = self.backend.borrow().read(&key) {
                count += 1;
                bytes += raw.len();
            }
        }
        (count, bytes)
    }

    // == Storage Access ==
    /// Reads a raw value, latching unavailability on first detection.
    fn storage_read(&mut self, key: &str) -> Option<String> {
        if !self.available {
            return None;
        }
        let result = self.backend.borrow().read(key);
        match result {
            Ok(value) => value,
            Err(err) => {
                self.note_storage_failure(&err);
                None
            }
        }
    }

    fn storage_write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        let result = self.backend.borrow_mut().write(key, value);
        if let Err(err) = &result {
            self.note_storage_failure(err);
        }
        result
    }

    /// Best-effort removal.
    fn purge(&mut self, key: &str) {
        if !self.available {
            return;
        }
        let result = self.backend.borrow_mut().remove(key);
        if let Err(err) = result {
            self.note_storage_failure(&err);
        }
    }

    /// Latches the unavailable state; the medium is not re-probed within
    /// this store's lifetime.
    fn note_storage_failure(&mut self, err: &StorageError) {
        if matches!(err, StorageError::Unavailable) && self.available {
            warn!(namespace = self.deriver.prefix(), "storage medium unavailable, disabling cache");
            self.available = false;
        }
    }

    fn record_sweep(&mut self, now: i64) {
        // The marker is tiny; if even it cannot be written, skip silently
        // and let the next sweep attempt re-run
        let marker = self.sweep_marker_key.clone();
        let _ = self.storage_write(&marker, &now.to_string());
    }

    // == Stats Polling ==
    /// Performs the debounced aggregate scan when the tracker reports one
    /// due.
    fn poll_stats(&mut self) {
        let now = current_timestamp_ms();
        if self.stats.scan_due(now) {
            let (count, bytes) = self.usage(None);
            self.stats.record_scan(count, bytes as u64, now);
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("namespace", &self.deriver.prefix())
            .field("available", &self.available)
            .finish()
    }
}

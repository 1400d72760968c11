//! Cache Statistics Module
//!
//! Tracks hit/miss counters and debounced namespace aggregates.
//!
//! Hit and miss counts are O(1) increments updated synchronously on every
//! `get`. Entry count and approximate size require a full namespace scan, so
//! recomputation is debounced: each write trigger restarts a coalescing
//! window (cancel-and-reschedule), and scans are further rate-limited to at
//! most one per `min_interval`. The engine is synchronous, so the debounce is
//! poll-driven: the store asks [`StatsTracker::scan_due`] after mutations and
//! performs the scan when it reports one due.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Entries currently in the namespace (as of the last scan)
    pub entry_count: usize,
    /// Approximate serialized bytes in the namespace (as of the last scan)
    pub approx_size_bytes: u64,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, corrupted, or expired)
    pub misses: u64,
}

impl CacheStats {
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Tracker ==
/// Debounced aggregation of namespace statistics.
#[derive(Debug)]
pub struct StatsTracker {
    hits: u64,
    misses: u64,
    entry_count: usize,
    approx_size_bytes: u64,
    /// A recomputation is pending
    dirty: bool,
    /// Most recent trigger; each trigger restarts the coalescing window
    last_trigger_ms: Option<i64>,
    /// Most recent completed scan
    last_scan_ms: Option<i64>,
    debounce_ms: i64,
    min_interval_ms: i64,
}

impl StatsTracker {
    // == Constructor ==
    pub fn new(debounce_ms: u64, min_interval_ms: u64) -> Self {
        Self {
            hits: 0,
            misses: 0,
            entry_count: 0,
            approx_size_bytes: 0,
            dirty: false,
            last_trigger_ms: None,
            last_scan_ms: None,
            debounce_ms: debounce_ms as i64,
            min_interval_ms: min_interval_ms as i64,
        }
    }

    // == Counters ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Debounced Recomputation ==
    /// Notes a mutation at `now_ms`, restarting the coalescing window.
    pub fn note_write(&mut self, now_ms: i64) {
        self.dirty = true;
        self.last_trigger_ms = Some(now_ms);
    }

    /// Whether a namespace scan is due at `now_ms`: a trigger is pending,
    /// its coalescing window has elapsed, and the rate limit allows a scan.
    pub fn scan_due(&self, now_ms: i64) -> bool {
        if !self.dirty {
            return false;
        }
        let window_elapsed = self
            .last_trigger_ms
            .is_some_and(|t| now_ms - t >= self.debounce_ms);
        let rate_ok = self
            .last_scan_ms
            .map_or(true, |t| now_ms - t >= self.min_interval_ms);
        window_elapsed && rate_ok
    }

    /// Records the result of a completed namespace scan.
    pub fn record_scan(&mut self, entry_count: usize, approx_size_bytes: u64, now_ms: i64) {
        self.entry_count = entry_count;
        self.approx_size_bytes = approx_size_bytes;
        self.last_scan_ms = Some(now_ms);
        self.dirty = false;
    }

    // == Reset ==
    /// Zeroes every counter and aggregate (used by `clear`). Also forgets
    /// the last scan time, so the first recomputation after a reset is not
    /// rate-limited by a pre-reset scan.
    pub fn reset(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.entry_count = 0;
        self.approx_size_bytes = 0;
        self.dirty = false;
        self.last_trigger_ms = None;
        self.last_scan_ms = None;
    }

    // == Snapshot ==
    /// Returns the current statistics. Aggregates reflect the most recent
    /// completed scan; counters are always current.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entry_count,
            approx_size_bytes: self.approx_size_bytes,
            hits: self.hits,
            misses: self.misses,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut tracker = StatsTracker::new(250, 1000);
        tracker.record_hit();
        tracker.record_hit();
        tracker.record_miss();

        let stats = tracker.snapshot();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);

        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_no_scan_when_clean() {
        let tracker = StatsTracker::new(250, 1000);
        assert!(!tracker.scan_due(1_000_000));
    }

    #[test]
    fn test_scan_waits_for_coalescing_window() {
        let mut tracker = StatsTracker::new(250, 1000);

        tracker.note_write(1000);
        assert!(!tracker.scan_due(1100));
        assert!(tracker.scan_due(1250));
    }

    #[test]
    fn test_trigger_restarts_window() {
        let mut tracker = StatsTracker::new(250, 1000);

        // Repeated triggers within the window coalesce: each restarts it
        tracker.note_write(1000);
        tracker.note_write(1200);
        assert!(!tracker.scan_due(1250));
        assert!(tracker.scan_due(1450));
    }

    #[test]
    fn test_rate_limit_between_scans() {
        let mut tracker = StatsTracker::new(250, 1000);

        tracker.note_write(1000);
        assert!(tracker.scan_due(1250));
        tracker.record_scan(5, 500, 1250);

        // New trigger, window elapsed, but still inside the rate limit
        tracker.note_write(1300);
        assert!(!tracker.scan_due(1600));
        assert!(tracker.scan_due(2250));
    }

    #[test]
    fn test_record_scan_clears_dirty() {
        let mut tracker = StatsTracker::new(250, 1000);

        tracker.note_write(1000);
        tracker.record_scan(7, 700, 1250);
        assert!(!tracker.scan_due(10_000));

        let stats = tracker.snapshot();
        assert_eq!(stats.entry_count, 7);
        assert_eq!(stats.approx_size_bytes, 700);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut tracker = StatsTracker::new(250, 1000);
        tracker.record_hit();
        tracker.record_miss();
        tracker.note_write(1000);
        tracker.record_scan(5, 500, 1250);

        tracker.reset();
        let stats = tracker.snapshot();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.approx_size_bytes, 0);
        assert!(!tracker.scan_due(100_000));
    }

    #[test]
    fn test_reset_clears_rate_limit() {
        let mut tracker = StatsTracker::new(250, 1000);

        tracker.note_write(1000);
        tracker.record_scan(5, 500, 1250);
        tracker.reset();

        // The first scan after a reset must not be held back by the
        // pre-reset scan's rate limit
        tracker.note_write(1300);
        assert!(tracker.scan_due(1550));
    }
}

//! Eviction Policy Module
//!
//! Decides which entries to remove when a namespace exceeds its count or
//! size bounds. Selection is oldest-first by creation timestamp; entries
//! that fail to decode carry timestamp 0 and are therefore always evicted
//! first.

// == Eviction Demand ==
/// Why eviction is being requested, which determines how much to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionDemand {
    /// Pre-insert pruning: a `set` would push the namespace over a bound.
    /// Removes a small fixed batch, repeated by the caller until the new
    /// entry fits.
    Reactive,
    /// Quota-exceeded recovery: the medium refused a write. Removes a larger
    /// batch in one round.
    Emergency,
    /// Bulk maintenance sweep: removes a fraction of all entries.
    Sweep,
}

// == Eviction Policy ==
/// Oldest-first eviction over a namespace's entries.
#[derive(Debug, Clone)]
pub struct EvictionPolicy {
    /// Entries removed per reactive pruning round
    batch: usize,
    /// Entries removed per emergency recovery round
    emergency_batch: usize,
    /// Fraction of entries removed by a maintenance sweep
    sweep_fraction: f64,
    /// Minimum interval between sweeps in milliseconds
    sweep_interval_ms: i64,
}

impl EvictionPolicy {
    // == Constructor ==
    pub fn new(
        batch: usize,
        emergency_batch: usize,
        sweep_fraction: f64,
        sweep_interval_ms: i64,
    ) -> Self {
        Self {
            batch,
            emergency_batch,
            sweep_fraction,
            sweep_interval_ms,
        }
    }

    /// Entries removed per emergency round.
    pub fn emergency_batch(&self) -> usize {
        self.emergency_batch
    }

    // == Select For Eviction ==
    /// Given every `(key, createdAt)` pair in a namespace, returns the keys
    /// to remove for the given demand, oldest first.
    ///
    /// Callers assign timestamp 0 to corrupted entries so they always lead
    /// the selection.
    pub fn select_for_eviction(
        &self,
        candidates: &[(String, i64)],
        demand: EvictionDemand,
    ) -> Vec<String> {
        let count = match demand {
            EvictionDemand::Reactive => self.batch,
            EvictionDemand::Emergency => self.emergency_batch,
            EvictionDemand::Sweep => {
                (candidates.len() as f64 * self.sweep_fraction).ceil() as usize
            }
        };

        let mut sorted: Vec<&(String, i64)> = candidates.iter().collect();
        // Key as tiebreak keeps selection deterministic for equal timestamps
        sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        sorted
            .into_iter()
            .take(count)
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Sweep Gating ==
    /// Whether a maintenance sweep is due, given the persisted last-run
    /// marker. A namespace with no marker has never swept and is due.
    pub fn sweep_due(&self, last_run_ms: Option<i64>, now_ms: i64) -> bool {
        match last_run_ms {
            Some(last) => now_ms - last >= self.sweep_interval_ms,
            None => true,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> EvictionPolicy {
        EvictionPolicy::new(3, 8, 0.25, 1000)
    }

    fn candidates(timestamps: &[i64]) -> Vec<(String, i64)> {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| (format!("k{}", i), ts))
            .collect()
    }

    #[test]
    fn test_reactive_selects_oldest_batch() {
        let entries = candidates(&[50, 10, 30, 40, 20]);

        let selected = policy().select_for_eviction(&entries, EvictionDemand::Reactive);
        assert_eq!(selected, vec!["k1", "k4", "k2"]);
    }

    #[test]
    fn test_reactive_fewer_entries_than_batch() {
        let entries = candidates(&[20, 10]);

        let selected = policy().select_for_eviction(&entries, EvictionDemand::Reactive);
        assert_eq!(selected, vec!["k1", "k0"]);
    }

    #[test]
    fn test_corrupted_timestamp_zero_goes_first() {
        let entries = vec![
            ("fresh".to_string(), 1_000_000),
            ("corrupted".to_string(), 0),
            ("old".to_string(), 500),
        ];

        let selected = policy().select_for_eviction(&entries, EvictionDemand::Reactive);
        assert_eq!(selected[0], "corrupted");
        assert_eq!(selected[1], "old");
    }

    #[test]
    fn test_emergency_selects_larger_batch() {
        let entries = candidates(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        let selected = policy().select_for_eviction(&entries, EvictionDemand::Emergency);
        assert_eq!(selected.len(), 8);
        assert_eq!(selected[0], "k0");
    }

    #[test]
    fn test_sweep_selects_fraction_rounded_up() {
        let entries = candidates(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        // 25% of 10 entries
        let selected = policy().select_for_eviction(&entries, EvictionDemand::Sweep);
        assert_eq!(selected.len(), 3);

        // 25% of 2 entries rounds up to 1
        let selected = policy().select_for_eviction(&candidates(&[1, 2]), EvictionDemand::Sweep);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_empty_candidates_select_nothing() {
        let selected = policy().select_for_eviction(&[], EvictionDemand::Reactive);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_deterministic_tiebreak_on_equal_timestamps() {
        let entries = vec![
            ("b".to_string(), 5),
            ("a".to_string(), 5),
            ("c".to_string(), 5),
        ];

        let selected = policy().select_for_eviction(&entries, EvictionDemand::Reactive);
        assert_eq!(selected, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sweep_gating() {
        let policy = policy();

        // Never swept: due
        assert!(policy.sweep_due(None, 10_000));
        // Swept recently: not due
        assert!(!policy.sweep_due(Some(9_500), 10_000));
        // Interval elapsed exactly: due
        assert!(policy.sweep_due(Some(9_000), 10_000));
    }
}

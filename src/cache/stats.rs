//! Dedup Statistics Module
//!
//! Tracks how often the cache allowed a notification through, suppressed
//! one, or evicted a stale window.

use serde::Serialize;

// == Dedup Stats ==
/// Counters for dedup cache activity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupStats {
    /// Checks that returned true (notification allowed, window armed)
    pub allowed: u64,
    /// Checks that returned false (notification suppressed)
    pub suppressed: u64,
    /// Entries removed by the cleaner loop
    pub evictions: u64,
    /// Current number of live entries
    pub total_entries: usize,
}

impl DedupStats {
    // == Constructor ==
    /// Creates a new DedupStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Suppression Rate ==
    /// Calculates the fraction of checks that were suppressed.
    ///
    /// Returns suppressed / (allowed + suppressed), or 0.0 if no checks
    /// have been made.
    pub fn suppression_rate(&self) -> f64 {
        let total = self.allowed + self.suppressed;
        if total == 0 {
            0.0
        } else {
            self.suppressed as f64 / total as f64
        }
    }

    // == Record Allowed ==
    /// Increments the allowed counter.
    pub fn record_allowed(&mut self) {
        self.allowed += 1;
    }

    // == Record Suppressed ==
    /// Increments the suppressed counter.
    pub fn record_suppressed(&mut self) {
        self.suppressed += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

//! Dedup Store Module
//!
//! In-memory map from notification key to its suppression window. The store
//! itself is single-threaded; the facade wraps it in the one lock that
//! serializes every reader and writer.

use std::collections::HashMap;

use crate::cache::{DedupEntry, DedupStats};
use crate::error::{NotifierError, Result};

// == Check Outcome ==
/// Result of a single dedup check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutcome {
    /// True when the caller may notify (window was absent or had elapsed)
    pub expired: bool,
    /// True when the check inserted or refreshed an entry
    pub state_changed: bool,
}

// == Dedup Store ==
/// Key-to-suppression-window storage with time-based expiry.
#[derive(Debug, Default)]
pub struct DedupStore {
    /// Live suppression windows
    entries: HashMap<String, DedupEntry>,
    /// Activity counters
    stats: DedupStats,
}

impl DedupStore {
    // == Constructors ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a loaded snapshot.
    pub fn from_entries(entries: HashMap<String, DedupEntry>) -> Self {
        let mut stats = DedupStats::new();
        stats.set_total_entries(entries.len());
        Self { entries, stats }
    }

    // == Check And Arm ==
    /// The core dedup primitive, evaluated at `now`.
    ///
    /// Rolling-window semantics:
    /// - Absent key: arm a window of `ttl_secs` and report expired (the
    ///   caller has not notified recently and may proceed).
    /// - Present key whose stored window has elapsed: refresh the window
    ///   start to `now`, re-arm with the caller's `ttl_secs`, report
    ///   expired.
    /// - Present key inside its window: report not expired (suppress).
    ///
    /// # Arguments
    /// * `key` - Condition identifier
    /// * `ttl_secs` - Window to arm on insert or refresh, must be positive
    /// * `now` - Current Unix timestamp in seconds
    pub fn check_and_arm(&mut self, key: &str, ttl_secs: i64, now: i64) -> Result<CheckOutcome> {
        if ttl_secs <= 0 {
            return Err(NotifierError::InvalidTtl(ttl_secs));
        }

        let outcome = match self.entries.get_mut(key) {
            Some(entry) if entry.has_elapsed(now) => {
                *entry = DedupEntry::new(ttl_secs, now);
                CheckOutcome {
                    expired: true,
                    state_changed: true,
                }
            }
            Some(_) => CheckOutcome {
                expired: false,
                state_changed: false,
            },
            None => {
                self.entries
                    .insert(key.to_string(), DedupEntry::new(ttl_secs, now));
                CheckOutcome {
                    expired: true,
                    state_changed: true,
                }
            }
        };

        if outcome.expired {
            self.stats.record_allowed();
        } else {
            self.stats.record_suppressed();
        }
        self.stats.set_total_entries(self.entries.len());

        Ok(outcome)
    }

    // == Evict Expired ==
    /// Removes every entry whose age at `now` exceeds its TTL plus
    /// `grace_secs`. Returns the number of entries removed.
    pub fn evict_expired(&mut self, now: i64, grace_secs: i64) -> usize {
        let stale_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_evictable(now, grace_secs))
            .map(|(key, _)| key.clone())
            .collect();

        let count = stale_keys.len();

        for key in stale_keys {
            self.entries.remove(&key);
            self.stats.record_eviction();
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Snapshot View ==
    /// Borrows the live entries for serialization.
    pub fn entries(&self) -> &HashMap<String, DedupEntry> {
        &self.entries
    }

    /// Looks up a single entry.
    pub fn get(&self, key: &str) -> Option<&DedupEntry> {
        self.entries.get(key)
    }

    /// Returns true if `key` currently has a window armed.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Stats ==
    /// Returns current dedup statistics.
    pub fn stats(&self) -> DedupStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Dedup Entry Module
//!
//! Defines the record stored per notification key: when the suppression
//! window was armed and how long it holds.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Dedup Entry ==
/// One suppression record: a condition was last notified at `created_at`
/// and further notifications are held back for `ttl_secs`.
///
/// Serialized field names match the on-disk snapshot format
/// (`createtime` / `ttl`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupEntry {
    /// When the window was armed (Unix seconds)
    #[serde(rename = "createtime")]
    pub created_at: i64,
    /// Length of the suppression window in seconds
    #[serde(rename = "ttl")]
    pub ttl_secs: i64,
}

impl DedupEntry {
    // == Constructor ==
    /// Creates an entry whose window starts at `now`.
    pub fn new(ttl_secs: i64, now: i64) -> Self {
        Self {
            created_at: now,
            ttl_secs,
        }
    }

    // == Has Elapsed ==
    /// Checks whether the suppression window has elapsed at `now`.
    ///
    /// Boundary condition: the window is considered elapsed when the age of
    /// the entry is greater than or equal to its TTL, so a window re-arms
    /// the instant the full TTL has passed.
    pub fn has_elapsed(&self, now: i64) -> bool {
        now - self.created_at >= self.ttl_secs
    }

    // == Is Evictable ==
    /// Checks whether the cleaner may drop this entry at `now`.
    ///
    /// Eviction waits for `grace_secs` beyond the TTL so a caller that is
    /// about to refresh the window never races the sweep.
    pub fn is_evictable(&self, now: i64, grace_secs: i64) -> bool {
        now - self.created_at >= self.ttl_secs + grace_secs
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

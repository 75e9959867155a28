//! Dedup Cache Module
//!
//! Process-wide key-to-expiry store that suppresses repeated notifications for
//! the same condition within a time window and survives restarts through an
//! on-disk snapshot.

mod entry;
mod facade;
mod snapshot;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp, DedupEntry};
pub use facade::DedupCache;
pub use snapshot::SnapshotFile;
pub use stats::DedupStats;
pub use store::{CheckOutcome, DedupStore};

// == Public Constants ==
/// Default snapshot file name in the working directory
pub const CACHE_FILE_NAME: &str = "cache.db";

/// Extra seconds past an entry's TTL before the cleaner may evict it, so an
/// in-flight refresh never races the sweep
pub const CLEAN_GRACE_SECS: i64 = 10;

/// Default seconds between cleaner sweeps
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 10;

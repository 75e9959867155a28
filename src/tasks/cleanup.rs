//! Dedup Cleanup Task
//!
//! Background task that periodically evicts elapsed suppression windows and
//! re-persists the snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{current_timestamp, DedupStore, SnapshotFile};

/// Spawns the cleaner loop for a dedup store.
///
/// Each sweep acquires the store lock, drops every entry older than its TTL
/// plus `grace_secs`, and rewrites the snapshot while still holding the
/// lock so file writes stay serialized with in-memory mutation. A snapshot
/// write failure is logged and the loop keeps ticking; in-memory state is
/// still correct and the next sweep retries the write.
///
/// The task runs until `stop` flips to true (or its sender is dropped) and
/// releases its timer on the way out.
///
/// # Arguments
/// * `store` - Shared store, guarded by the facade's lock
/// * `snapshot` - Snapshot file rewritten after each sweep
/// * `interval_secs` - Seconds between sweeps
/// * `grace_secs` - Extra age beyond the TTL required before eviction
/// * `stop` - Shutdown signal from the facade's destroy
pub fn spawn_cleanup_task(
    store: Arc<Mutex<DedupStore>>,
    snapshot: Arc<SnapshotFile>,
    interval_secs: u64,
    grace_secs: i64,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "starting dedup cleanup task with interval of {} seconds",
            interval_secs
        );
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));

        loop {
            tokio::select! {
                // A closed channel means the facade is gone; stop either way
                _ = stop.changed() => {
                    info!("cleanup task stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = {
                        let mut store = store.lock().await;
                        let removed = store.evict_expired(current_timestamp(), grace_secs);
                        if let Err(err) = snapshot.save(store.entries()) {
                            error!("cleanup sweep could not persist snapshot: {}", err);
                        }
                        removed
                    };

                    if removed > 0 {
                        info!("cleanup sweep removed {} elapsed entries", removed);
                    } else {
                        debug!("cleanup sweep found no elapsed entries");
                    }
                }
            }
        }

        info!("cleanup task stopped");
    })
}

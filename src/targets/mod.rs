//! Targets Module
//!
//! Polling workers. Each target queries one status endpoint on its own
//! ticker, consults the dedup cache before raising an alert, and pushes
//! notifications into the shared channel drained by the dispatch loop.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::bot::TextMessage;
use crate::cache::DedupCache;
use crate::config::Config;

mod climate;
mod documents;
mod sync_queue;

pub use climate::{ClimateConfig, ClimateTarget};
pub use documents::{DocumentsConfig, DocumentsTarget};
pub use sync_queue::{SyncQueueConfig, SyncQueueTarget};

// == Constants ==
/// Floor for poll intervals; shorter configured values are clamped up
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;

// == Target Message ==
/// A notification produced by a target worker, tagged with its origin.
#[derive(Debug, Clone)]
pub struct TargetMessage {
    pub target: &'static str,
    pub message: TextMessage,
}

// == Spawn All ==
/// Starts a worker for every target named in the config.
///
/// Each worker polls immediately, then on its ticker, until `shutdown`
/// flips. Returned handles are awaited during graceful shutdown.
pub fn spawn_targets(
    config: &Config,
    cache: DedupCache,
    tx: mpsc::Sender<TargetMessage>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let mut workers = Vec::new();

    if let Some(climate) = &config.targets.climate {
        workers.push(ClimateTarget::spawn(
            climate.clone(),
            cache.clone(),
            tx.clone(),
            shutdown.clone(),
        ));
    }
    if let Some(sync_queue) = &config.targets.sync_queue {
        workers.push(SyncQueueTarget::spawn(
            sync_queue.clone(),
            cache.clone(),
            tx.clone(),
            shutdown.clone(),
        ));
    }
    if let Some(documents) = &config.targets.documents {
        workers.push(DocumentsTarget::spawn(
            documents.clone(),
            cache.clone(),
            tx.clone(),
            shutdown.clone(),
        ));
    }

    info!("started {} target workers", workers.len());
    workers
}

// == Helpers ==
/// Clamps a configured poll interval to the floor.
pub(crate) fn effective_poll_interval(poll_interval_secs: u64) -> std::time::Duration {
    std::time::Duration::from_secs(poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_clamped_to_floor() {
        assert_eq!(
            effective_poll_interval(5),
            std::time::Duration::from_secs(MIN_POLL_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_poll_interval_above_floor_kept() {
        assert_eq!(
            effective_poll_interval(120),
            std::time::Duration::from_secs(120)
        );
    }
}

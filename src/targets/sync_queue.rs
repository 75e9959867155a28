//! Sync Queue Target
//!
//! Watches the order-sync daemon. Transitions between running and stopped
//! notify immediately (edge-triggered); a daemon that stays down produces a
//! deduplicated reminder, and a growing backlog produces a deduplicated
//! queue-length alert.

use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bot::TextMessage;
use crate::cache::DedupCache;
use crate::error::{NotifierError, Result};
use crate::models::SyncQueueStatus;
use crate::targets::{effective_poll_interval, TargetMessage};

const TARGET_NAME: &str = "sync-queue";

/// Dedup key for the daemon-still-down reminder
pub const SYNC_DOWN_KEY: &str = "sync-queue-down";
/// Dedup key for the backlog alert
pub const SYNC_BACKLOG_KEY: &str = "sync-queue-backlog";

// == Sync Queue Config ==
/// Configuration for the sync-queue target.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncQueueConfig {
    /// Status endpoint URL
    pub api: String,
    /// Seconds between polls (clamped to the global floor)
    pub poll_interval_secs: u64,
    /// Suppression window between still-down reminders
    pub down_ttl_secs: i64,
    /// Alert when the pending-order queue reaches this length
    pub queue_threshold: i64,
    /// Suppression window after a backlog alert
    pub queue_ttl_secs: i64,
    /// Mobile number mentioned in alerts
    pub receiver: String,
    /// Free-form label prefixed to every alert
    #[serde(default)]
    pub memo: String,
}

impl SyncQueueConfig {
    /// Checks the invariants a running target relies on.
    pub fn validate(&self) -> Result<()> {
        if self.api.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'sync_queue.api'".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'sync_queue.poll_interval_secs'".to_string(),
            ));
        }
        if self.down_ttl_secs <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'sync_queue.down_ttl_secs'".to_string(),
            ));
        }
        if self.queue_threshold <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'sync_queue.queue_threshold'".to_string(),
            ));
        }
        if self.queue_ttl_secs <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'sync_queue.queue_ttl_secs'".to_string(),
            ));
        }
        if self.receiver.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'sync_queue.receiver'".to_string(),
            ));
        }
        Ok(())
    }
}

// == Sync Queue Target ==
/// Worker polling the order-sync daemon.
pub struct SyncQueueTarget {
    config: SyncQueueConfig,
    client: reqwest::Client,
    cache: DedupCache,
    tx: mpsc::Sender<TargetMessage>,
}

impl SyncQueueTarget {
    /// Spawns the worker task.
    pub fn spawn(
        config: SyncQueueConfig,
        cache: DedupCache,
        tx: mpsc::Sender<TargetMessage>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let target = Self {
            config,
            client: reqwest::Client::new(),
            cache,
            tx,
        };
        tokio::spawn(target.worker(shutdown))
    }

    async fn worker(self, mut shutdown: watch::Receiver<bool>) {
        info!("target worker started: {}", TARGET_NAME);
        let mut ticker =
            tokio::time::interval(effective_poll_interval(self.config.poll_interval_secs));
        // Assume the daemon was healthy before we started watching, so a
        // first poll that finds it down is treated as a fresh transition
        let mut was_running = true;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("target worker stopping: {}", TARGET_NAME);
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once(&mut was_running).await {
                        warn!("{}: poll failed: {}", TARGET_NAME, err);
                    }
                }
            }
        }
        info!("target worker stopped: {}", TARGET_NAME);
    }

    async fn poll_once(&self, was_running: &mut bool) -> Result<()> {
        debug!("query target status: {}", TARGET_NAME);

        let status: SyncQueueStatus = self
            .client
            .get(&self.config.api)
            .send()
            .await?
            .json()
            .await?;
        let reading = status.parse()?;

        if !reading.is_running {
            let content = format!(
                "{}: stopped working, pending orders: {}",
                self.config.memo, reading.queue_len
            );
            if *was_running {
                // Fresh transition, always notify
                *was_running = false;
                self.notify(content).await;
            } else if self
                .cache
                .is_expired(SYNC_DOWN_KEY, self.config.down_ttl_secs)
                .await?
            {
                self.notify(content).await;
            }
            return Ok(());
        }

        if !*was_running {
            *was_running = true;
            self.notify(format!(
                "{}: back to normal, pending orders: {}",
                self.config.memo, reading.queue_len
            ))
            .await;
            return Ok(());
        }

        if reading.queue_len >= self.config.queue_threshold
            && self
                .cache
                .is_expired(SYNC_BACKLOG_KEY, self.config.queue_ttl_secs)
                .await?
        {
            self.notify(format!(
                "{}: sync queue length above alert threshold, pending orders: {}",
                self.config.memo, reading.queue_len
            ))
            .await;
        }

        Ok(())
    }

    async fn notify(&self, content: String) {
        let message = TextMessage::new(content).at_mobile(self.config.receiver.clone());
        if self
            .tx
            .send(TargetMessage {
                target: TARGET_NAME,
                message,
            })
            .await
            .is_err()
        {
            debug!("{}: dispatcher gone, dropping message", TARGET_NAME);
        }
    }
}

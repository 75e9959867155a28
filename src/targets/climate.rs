//! Climate Target
//!
//! Watches a machine-room temperature endpoint and raises a deduplicated
//! alert when the real or average temperature crosses its threshold.

use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bot::TextMessage;
use crate::cache::DedupCache;
use crate::error::{NotifierError, Result};
use crate::models::ClimateStatus;
use crate::targets::{effective_poll_interval, TargetMessage};

const TARGET_NAME: &str = "climate";

/// Dedup key for the over-temperature alert
pub const CLIMATE_ALERT_KEY: &str = "climate-temp-alert";

// == Climate Config ==
/// Configuration for the climate target.
#[derive(Debug, Clone, Deserialize)]
pub struct ClimateConfig {
    /// Status endpoint URL
    pub api: String,
    /// Seconds between polls (clamped to the global floor)
    pub poll_interval_secs: u64,
    /// Alert when the real temperature reaches this value
    pub real_threshold: f64,
    /// Suppression window after a real-temperature alert
    pub real_ttl_secs: i64,
    /// Alert when the average temperature reaches this value
    pub avg_threshold: f64,
    /// Suppression window after an average-temperature alert
    pub avg_ttl_secs: i64,
    /// Mobile number mentioned in alerts
    pub receiver: String,
    /// Free-form label prefixed to every alert
    #[serde(default)]
    pub memo: String,
}

impl ClimateConfig {
    /// Checks the invariants a running target relies on.
    pub fn validate(&self) -> Result<()> {
        if self.api.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'climate.api'".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'climate.poll_interval_secs'".to_string(),
            ));
        }
        if self.real_threshold <= 0.0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'climate.real_threshold'".to_string(),
            ));
        }
        if self.real_ttl_secs <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'climate.real_ttl_secs'".to_string(),
            ));
        }
        if self.avg_threshold <= 0.0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'climate.avg_threshold'".to_string(),
            ));
        }
        if self.avg_ttl_secs <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'climate.avg_ttl_secs'".to_string(),
            ));
        }
        if self.receiver.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'climate.receiver'".to_string(),
            ));
        }
        Ok(())
    }
}

// == Climate Target ==
/// Worker polling one temperature endpoint.
pub struct ClimateTarget {
    config: ClimateConfig,
    client: reqwest::Client,
    cache: DedupCache,
    tx: mpsc::Sender<TargetMessage>,
}

impl ClimateTarget {
    /// Spawns the worker task.
    pub fn spawn(
        config: ClimateConfig,
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

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("target worker stopping: {}", TARGET_NAME);
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once().await {
                        warn!("{}: poll failed: {}", TARGET_NAME, err);
                    }
                }
            }
        }
        info!("target worker stopped: {}", TARGET_NAME);
    }

    async fn poll_once(&self) -> Result<()> {
        debug!("query target status: {}", TARGET_NAME);

        let status: ClimateStatus = self
            .client
            .get(&self.config.api)
            .send()
            .await?
            .json()
            .await?;
        let reading = status.parse()?;

        if !reading.is_alive {
            warn!("{}: sensor reports not alive", TARGET_NAME);
        }

        let real_tripped = reading.real_temp >= self.config.real_threshold;
        let avg_tripped = reading.avg_temp >= self.config.avg_threshold;
        if !real_tripped && !avg_tripped {
            return Ok(());
        }

        // A real-temperature spike re-alerts on its own, shorter window
        let ttl = if real_tripped {
            self.config.real_ttl_secs
        } else {
            self.config.avg_ttl_secs
        };

        if self.cache.is_expired(CLIMATE_ALERT_KEY, ttl).await? {
            let content = format!(
                "{}: temperature above alert threshold, current {:.1}, average {:.1}",
                self.config.memo, reading.real_temp, reading.avg_temp
            );
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

        Ok(())
    }
}

//! Documents Target
//!
//! Watches a dashboard of problem-document counters. The returned-documents
//! row is drilled into and deduplicated per document number; the unapproved
//! row alerts once per window when its count crosses a threshold; remaining
//! non-zero counters are folded into one deduplicated summary line.

use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bot::TextMessage;
use crate::cache::DedupCache;
use crate::error::{NotifierError, Result};
use crate::models::{DashboardCounter, DetailReport};
use crate::targets::{effective_poll_interval, TargetMessage};

const TARGET_NAME: &str = "documents";

/// Dedup key for the unapproved-count alert
pub const DOCUMENTS_UNAPPROVED_KEY: &str = "documents-unapproved";
/// Dedup key for the leftover-counters summary
pub const DOCUMENTS_SUMMARY_KEY: &str = "documents-summary";

// == Documents Config ==
/// Configuration for the documents target.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    /// Query endpoint; the dashboard and drill-down keys are passed as
    /// `?key=...`
    pub api: String,
    /// Seconds between polls (clamped to the global floor)
    pub poll_interval_secs: u64,
    /// Dashboard key listing the counters
    #[serde(default = "default_dashboard_key")]
    pub dashboard_key: String,
    /// Counter row holding returned documents
    #[serde(default = "default_returned_row")]
    pub returned_row_name: String,
    /// Free-form label appended to the returned-documents alert
    #[serde(default)]
    pub returned_memo: String,
    /// Per-document suppression window for returned documents
    pub returned_ttl_secs: i64,
    /// Mobile number mentioned in returned-document alerts
    pub returned_receiver: String,
    /// Counter row holding unapproved documents
    #[serde(default = "default_unapproved_row")]
    pub unapproved_row_name: String,
    /// Alert when the unapproved count reaches this value
    pub unapproved_threshold: i64,
    /// Suppression window after an unapproved-count alert
    pub unapproved_ttl_secs: i64,
    /// Mobile number mentioned in unapproved-count alerts
    pub unapproved_receiver: String,
    /// Suppression window after a summary message
    pub summary_ttl_secs: i64,
    /// Mobile number mentioned in summary messages
    pub summary_receiver: String,
}

fn default_dashboard_key() -> String {
    "dashboard:documents".to_string()
}

fn default_returned_row() -> String {
    "returned".to_string()
}

fn default_unapproved_row() -> String {
    "unapproved".to_string()
}

impl DocumentsConfig {
    /// Checks the invariants a running target relies on.
    pub fn validate(&self) -> Result<()> {
        if self.api.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'documents.api'".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'documents.poll_interval_secs'".to_string(),
            ));
        }
        if self.returned_ttl_secs <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'documents.returned_ttl_secs'".to_string(),
            ));
        }
        if self.returned_receiver.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'documents.returned_receiver'".to_string(),
            ));
        }
        if self.unapproved_threshold <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'documents.unapproved_threshold'".to_string(),
            ));
        }
        if self.unapproved_ttl_secs <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'documents.unapproved_ttl_secs'".to_string(),
            ));
        }
        if self.unapproved_receiver.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'documents.unapproved_receiver'".to_string(),
            ));
        }
        if self.summary_ttl_secs <= 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'documents.summary_ttl_secs'".to_string(),
            ));
        }
        if self.summary_receiver.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'documents.summary_receiver'".to_string(),
            ));
        }
        Ok(())
    }
}

// == Documents Target ==
/// Worker polling the document dashboard.
pub struct DocumentsTarget {
    config: DocumentsConfig,
    client: reqwest::Client,
    cache: DedupCache,
    tx: mpsc::Sender<TargetMessage>,
}

impl DocumentsTarget {
    /// Spawns the worker task.
    pub fn spawn(
        config: DocumentsConfig,
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

        let counters: Vec<DashboardCounter> = self
            .query(&self.config.dashboard_key)
            .await?;

        let mut summary = String::new();
        for counter in counters.iter().filter(|counter| counter.value > 0) {
            if counter.name == self.config.returned_row_name {
                if let Err(err) = self.process_returned(counter).await {
                    warn!("{}: row {:?}: {}", TARGET_NAME, counter.name, err);
                }
            } else if counter.name == self.config.unapproved_row_name {
                if counter.value < self.config.unapproved_threshold {
                    continue;
                }
                if let Err(err) = self.process_unapproved(counter).await {
                    warn!("{}: row {:?}: {}", TARGET_NAME, counter.name, err);
                }
            } else {
                if !summary.is_empty() {
                    summary.push_str(", ");
                }
                summary.push_str(&format!("{}:{}", counter.name, counter.value));
            }
        }

        if !summary.is_empty()
            && self
                .cache
                .is_expired(DOCUMENTS_SUMMARY_KEY, self.config.summary_ttl_secs)
                .await?
        {
            self.notify(summary, &self.config.summary_receiver).await;
        }

        Ok(())
    }

    /// Drills into the returned-documents row and alerts once per document
    /// number per window.
    async fn process_returned(&self, counter: &DashboardCounter) -> Result<()> {
        let report: DetailReport = self.query(&counter.drill_key).await?;

        let mut fresh = Vec::new();
        for doc_no in report.doc_numbers() {
            if self
                .cache
                .is_expired(&doc_no, self.config.returned_ttl_secs)
                .await?
            {
                fresh.push(doc_no);
            }
        }
        if fresh.is_empty() {
            return Ok(());
        }

        let content = format!("{} {}", fresh.join(","), self.config.returned_memo);
        self.notify(content, &self.config.returned_receiver).await;
        Ok(())
    }

    /// Drills into the unapproved row and alerts with per-owner counts.
    async fn process_unapproved(&self, counter: &DashboardCounter) -> Result<()> {
        if !self
            .cache
            .is_expired(DOCUMENTS_UNAPPROVED_KEY, self.config.unapproved_ttl_secs)
            .await?
        {
            return Ok(());
        }

        let report: DetailReport = self.query(&counter.drill_key).await?;

        let mut content = format!("{} total: {}", counter.name, counter.value);
        for (doc_no, detail) in report.rows() {
            content.push_str(&format!(", {}: {}", doc_no, detail));
        }

        self.notify(content, &self.config.unapproved_receiver).await;
        Ok(())
    }

    async fn query<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T> {
        let url = format!("{}?key={}", self.config.api, key);
        Ok(self.client.get(&url).send().await?.json().await?)
    }

    async fn notify(&self, content: String, receiver: &str) {
        let message = TextMessage::new(content).at_mobile(receiver.to_string());
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

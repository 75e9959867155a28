//! Notifier - a status-endpoint watcher with restart-safe deduplication
//!
//! Polls external status endpoints on timers and pushes chat-webhook
//! notifications when thresholds are crossed, suppressing repeats through a
//! persistent dedup cache.

pub mod bot;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod targets;
pub mod tasks;

pub use cache::DedupCache;
pub use config::Config;
pub use error::{NotifierError, Result};

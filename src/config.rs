//! Configuration Module
//!
//! Loads runtime configuration from a JSON file. The file location comes
//! from the `CONFIG_FILE` environment variable, falling back to
//! `config.json` in the working directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::{CACHE_FILE_NAME, DEFAULT_CLEANUP_INTERVAL_SECS};
use crate::error::{NotifierError, Result};
use crate::targets::{ClimateConfig, DocumentsConfig, SyncQueueConfig};

/// Default config file name in the working directory
pub const CONFIG_FILE_NAME: &str = "config.json";

// == Config ==
/// Top-level runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chat-webhook endpoint that receives all notifications
    pub webhook_url: String,
    /// Dedup cache tuning
    #[serde(default)]
    pub cache: CacheConfig,
    /// Polling targets; absent sections are simply not started
    #[serde(default)]
    pub targets: TargetsConfig,
}

// == Cache Config ==
/// Dedup cache tuning parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Snapshot file location
    #[serde(default = "default_cache_file")]
    pub file: PathBuf,
    /// Seconds between cleaner sweeps
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

// == Targets Config ==
/// One optional section per polling target.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsConfig {
    pub climate: Option<ClimateConfig>,
    pub sync_queue: Option<SyncQueueConfig>,
    pub documents: Option<DocumentsConfig>,
}

impl Config {
    /// Loads and validates configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| {
            NotifierError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Config = serde_json::from_str(&data).map_err(|err| {
            NotifierError::Config(format!("cannot parse {}: {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the config file location from the environment.
    ///
    /// # Environment Variables
    /// - `CONFIG_FILE` - Path to the config file (default: `config.json`)
    pub fn path_from_env() -> PathBuf {
        env::var("CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME))
    }

    fn validate(&self) -> Result<()> {
        if self.webhook_url.is_empty() {
            return Err(NotifierError::Config(
                "need string value for config key 'webhook_url'".to_string(),
            ));
        }
        if self.cache.cleanup_interval_secs == 0 {
            return Err(NotifierError::Config(
                "need positive value for config key 'cache.cleanup_interval_secs'".to_string(),
            ));
        }
        if let Some(climate) = &self.targets.climate {
            climate.validate()?;
        }
        if let Some(sync_queue) = &self.targets.sync_queue {
            sync_queue.validate()?;
        }
        if let Some(documents) = &self.targets.documents {
            documents.validate()?;
        }
        Ok(())
    }

    /// Number of targets this config enables.
    pub fn target_count(&self) -> usize {
        [
            self.targets.climate.is_some(),
            self.targets.sync_queue.is_some(),
            self.targets.documents.is_some(),
        ]
        .iter()
        .filter(|enabled| **enabled)
        .count()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file: default_cache_file(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_cache_file() -> PathBuf {
    PathBuf::from(CACHE_FILE_NAME)
}

fn default_cleanup_interval() -> u64 {
    DEFAULT_CLEANUP_INTERVAL_SECS
}

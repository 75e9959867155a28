//! Cache Facade Module
//!
//! The single surface every other component talks to. Owns the store behind
//! one lock, restores the snapshot at startup, runs the cleaner loop, and
//! hands out a process-wide singleton.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, OnceLock, PoisonError};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::{current_timestamp, DedupStats, DedupStore, SnapshotFile, CLEAN_GRACE_SECS};
use crate::config::CacheConfig;
use crate::error::{NotifierError, Result};
use crate::tasks::spawn_cleanup_task;

static INSTANCE: OnceLock<DedupCache> = OnceLock::new();
static INIT_LOCK: StdMutex<()> = StdMutex::new(());

// == Dedup Cache ==
/// Shared handle to the dedup cache. Clones are cheap and refer to the same
/// store, snapshot file and cleaner task.
#[derive(Clone)]
pub struct DedupCache {
    /// The one lock that serializes every read and write, including the
    /// snapshot writes taken while it is held
    store: Arc<Mutex<DedupStore>>,
    /// On-disk snapshot location
    snapshot: Arc<SnapshotFile>,
    /// Stop signal for the cleaner loop
    stop: watch::Sender<bool>,
    /// Cleaner task handle, taken exactly once by destroy
    cleaner: Arc<StdMutex<Option<JoinHandle<()>>>>,
    /// Set by destroy; all later calls fail loudly
    destroyed: Arc<AtomicBool>,
}

impl DedupCache {
    // == Open ==
    /// Builds a cache backed by the snapshot file named in `config` and
    /// starts the cleaner loop.
    ///
    /// A missing snapshot file is a fresh start: the store begins empty and
    /// the file is established immediately. A present-but-corrupt file is
    /// an error; starting with wrong dedup state risks a notification storm
    /// or permanent suppression, so the caller must not proceed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(config: &CacheConfig) -> Result<Self> {
        let snapshot = SnapshotFile::new(&config.file);

        let store = match snapshot.load()? {
            Some(entries) => {
                info!(
                    "restored {} dedup entries from {}",
                    entries.len(),
                    snapshot.path().display()
                );
                DedupStore::from_entries(entries)
            }
            None => {
                warn!(
                    "no snapshot at {}, dedup state starts empty",
                    snapshot.path().display()
                );
                let store = DedupStore::new();
                snapshot.save(store.entries())?;
                store
            }
        };

        let store = Arc::new(Mutex::new(store));
        let snapshot = Arc::new(snapshot);
        let (stop_tx, stop_rx) = watch::channel(false);

        let cleaner = spawn_cleanup_task(
            store.clone(),
            snapshot.clone(),
            config.cleanup_interval_secs,
            CLEAN_GRACE_SECS,
            stop_rx,
        );

        Ok(Self {
            store,
            snapshot,
            stop: stop_tx,
            cleaner: Arc::new(StdMutex::new(Some(cleaner))),
            destroyed: Arc::new(AtomicBool::new(false)),
        })
    }

    // == Instance ==
    /// Returns the process-wide cache, creating it on first call.
    ///
    /// Lazy double-checked initialization: the fast path reads the
    /// `OnceLock`; concurrent first callers serialize on an init lock so
    /// the cache (and its cleaner loop) is constructed exactly once.
    pub fn instance(config: &CacheConfig) -> Result<Self> {
        if let Some(cache) = INSTANCE.get() {
            return Ok(cache.clone());
        }

        let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cache) = INSTANCE.get() {
            return Ok(cache.clone());
        }

        let cache = Self::open(config)?;
        let _ = INSTANCE.set(cache.clone());
        info!("cachedb initiated");
        Ok(cache)
    }

    // == Is Expired ==
    /// The core dedup primitive.
    ///
    /// Returns `Ok(true)` when the condition has not been notified within
    /// its window (the window is armed or re-armed as a side effect) and
    /// `Ok(false)` when the notification should be suppressed. Any state
    /// change is persisted synchronously before the lock is released.
    ///
    /// # Arguments
    /// * `key` - Condition identifier
    /// * `ttl_secs` - Suppression window in seconds, must be positive
    pub async fn is_expired(&self, key: &str, ttl_secs: i64) -> Result<bool> {
        self.ensure_live()?;

        let mut store = self.store.lock().await;
        let outcome = store.check_and_arm(key, ttl_secs, current_timestamp())?;
        if outcome.state_changed {
            self.snapshot.save(store.entries())?;
        }

        Ok(outcome.expired)
    }

    // == Persist ==
    /// Snapshots the entire store to disk.
    pub async fn persist(&self) -> Result<()> {
        self.ensure_live()?;

        let store = self.store.lock().await;
        self.snapshot.save(store.entries())
    }

    // == Stats ==
    /// Returns current dedup statistics.
    pub async fn stats(&self) -> Result<DedupStats> {
        self.ensure_live()?;

        let store = self.store.lock().await;
        Ok(store.stats())
    }

    // == Destroy ==
    /// Stops the cleaner loop, waits for it to release its timer, and
    /// writes a final snapshot. Exactly one call succeeds; any later use of
    /// the cache, including a second destroy, fails with `Destroyed`.
    pub async fn destroy(&self) -> Result<()> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Err(NotifierError::Destroyed);
        }

        let _ = self.stop.send(true);

        let handle = self
            .cleaner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        let store = self.store.lock().await;
        self.snapshot.save(store.entries())?;

        let stats = store.stats();
        info!(
            "cache destroyed: {} entries persisted, {} allowed / {} suppressed this run",
            stats.total_entries, stats.allowed, stats.suppressed
        );
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(NotifierError::Destroyed);
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicU64;

    fn scratch_config(tag: &str) -> CacheConfig {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        CacheConfig {
            file: std::env::temp_dir().join(format!(
                "notifier-facade-{}-{}-{}.db",
                tag,
                std::process::id(),
                seq
            )),
            cleanup_interval_secs: 10,
        }
    }

    fn cleanup(path: &PathBuf) {
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_open_establishes_snapshot_file() {
        let config = scratch_config("establish");
        let cache = DedupCache::open(&config).unwrap();

        assert!(config.file.exists());

        cache.destroy().await.unwrap();
        cleanup(&config.file);
    }

    #[tokio::test]
    async fn test_first_check_allows_then_suppresses() {
        let config = scratch_config("basic");
        let cache = DedupCache::open(&config).unwrap();

        assert!(cache.is_expired("cond", 300).await.unwrap());
        assert!(!cache.is_expired("cond", 300).await.unwrap());

        cache.destroy().await.unwrap();
        cleanup(&config.file);
    }

    #[tokio::test]
    async fn test_invalid_ttl_fails_fast() {
        let config = scratch_config("badttl");
        let cache = DedupCache::open(&config).unwrap();

        let result = cache.is_expired("cond", 0).await;
        assert!(matches!(result, Err(NotifierError::InvalidTtl(0))));

        cache.destroy().await.unwrap();
        cleanup(&config.file);
    }

    #[tokio::test]
    async fn test_mutation_is_persisted_synchronously() {
        let config = scratch_config("syncpersist");
        let cache = DedupCache::open(&config).unwrap();

        cache.is_expired("cond", 300).await.unwrap();

        let on_disk = SnapshotFile::new(&config.file).load().unwrap().unwrap();
        assert!(on_disk.contains_key("cond"));

        cache.destroy().await.unwrap();
        cleanup(&config.file);
    }

    #[tokio::test]
    async fn test_stats_reflect_checks() {
        let config = scratch_config("stats");
        let cache = DedupCache::open(&config).unwrap();

        cache.is_expired("cond", 300).await.unwrap();
        cache.is_expired("cond", 300).await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.allowed, 1);
        assert_eq!(stats.suppressed, 1);
        assert_eq!(stats.total_entries, 1);

        cache.destroy().await.unwrap();
        cleanup(&config.file);
    }

    #[tokio::test]
    async fn test_use_after_destroy_fails_loudly() {
        let config = scratch_config("destroyed");
        let cache = DedupCache::open(&config).unwrap();
        cache.destroy().await.unwrap();

        assert!(matches!(
            cache.is_expired("cond", 300).await,
            Err(NotifierError::Destroyed)
        ));
        assert!(matches!(
            cache.persist().await,
            Err(NotifierError::Destroyed)
        ));
        assert!(matches!(
            cache.destroy().await,
            Err(NotifierError::Destroyed)
        ));
        cleanup(&config.file);
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_snapshot() {
        let config = scratch_config("corrupt");
        std::fs::write(&config.file, b"][").unwrap();

        let result = DedupCache::open(&config);
        assert!(matches!(
            result,
            Err(NotifierError::CorruptSnapshot { .. })
        ));
        cleanup(&config.file);
    }

    #[tokio::test]
    async fn test_restart_restores_state() {
        let config = scratch_config("restart");
        {
            let cache = DedupCache::open(&config).unwrap();
            cache.is_expired("cond", 3_600).await.unwrap();
            cache.destroy().await.unwrap();
        }

        // Second process lifetime: the window is still armed
        let cache = DedupCache::open(&config).unwrap();
        assert!(!cache.is_expired("cond", 3_600).await.unwrap());

        cache.destroy().await.unwrap();
        cleanup(&config.file);
    }
}

//! Integration Tests for the Dedup Cache
//!
//! Exercises the facade end to end against real snapshot files: concurrent
//! callers, restart recovery, window re-arming on the real clock, and the
//! cleaner loop persisting evictions.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use notifier::cache::{current_timestamp, DedupCache, DedupStore, SnapshotFile};
use notifier::config::CacheConfig;
use notifier::tasks::spawn_cleanup_task;

// == Helper Functions ==

fn scratch_config(tag: &str) -> CacheConfig {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    CacheConfig {
        file: std::env::temp_dir().join(format!(
            "notifier-it-{}-{}-{}.db",
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

// == Concurrency ==

#[tokio::test]
async fn test_concurrent_same_key_allows_exactly_once() {
    let config = scratch_config("concurrent");
    let cache = DedupCache::open(&config).unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.is_expired("same-key", 5).await.unwrap()
        }));
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }

    assert_eq!(allowed, 1, "exactly one caller may notify");

    cache.destroy().await.unwrap();
    cleanup(&config.file);
}

#[tokio::test]
async fn test_concurrent_distinct_keys_all_allowed() {
    let config = scratch_config("distinct");
    let cache = DedupCache::open(&config).unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache.is_expired(&format!("key-{}", i), 60).await.unwrap()
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }

    cache.destroy().await.unwrap();
    cleanup(&config.file);
}

// == Lifecycle ==

#[tokio::test]
async fn test_destroy_leaves_loadable_snapshot() {
    let config = scratch_config("lifecycle");

    {
        let cache = DedupCache::open(&config).unwrap();
        assert!(cache.is_expired("climate-temp-alert", 3_600).await.unwrap());
        assert!(cache.is_expired("sync-queue-down", 900).await.unwrap());
        cache.destroy().await.unwrap();
    }

    // The file is valid on its own ...
    let entries = SnapshotFile::new(&config.file).load().unwrap().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.contains_key("climate-temp-alert"));
    assert!(entries.contains_key("sync-queue-down"));

    // ... and a restarted cache keeps suppressing
    let cache = DedupCache::open(&config).unwrap();
    assert!(!cache.is_expired("climate-temp-alert", 3_600).await.unwrap());
    cache.destroy().await.unwrap();
    cleanup(&config.file);
}

#[tokio::test]
async fn test_window_rearms_on_real_clock() {
    let config = scratch_config("rearm");
    let cache = DedupCache::open(&config).unwrap();

    assert!(cache.is_expired("blip", 1).await.unwrap());

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    assert!(
        cache.is_expired("blip", 1).await.unwrap(),
        "window should re-arm after its ttl elapses"
    );

    cache.destroy().await.unwrap();
    cleanup(&config.file);
}

// == Cleaner Loop ==

#[tokio::test]
async fn test_cleaner_eviction_reaches_the_snapshot() {
    let config = scratch_config("cleaner");
    let store = Arc::new(Mutex::new(DedupStore::new()));
    let snapshot = Arc::new(SnapshotFile::new(&config.file));
    let (_stop_tx, stop_rx) = watch::channel(false);

    {
        let mut store = store.lock().await;
        store
            .check_and_arm("short-lived", 1, current_timestamp())
            .unwrap();
    }

    // Zero grace: the entry is evictable one cleaning interval after its
    // ttl elapses
    let handle = spawn_cleanup_task(store.clone(), snapshot.clone(), 1, 0, stop_rx);
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let on_disk = snapshot.load().unwrap().unwrap();
    assert!(
        !on_disk.contains_key("short-lived"),
        "fresh persisted snapshot should not hold the evicted key"
    );

    handle.abort();
    cleanup(&config.file);
}

#[tokio::test]
async fn test_snapshot_format_stays_stable_across_operations() {
    let config = scratch_config("format");
    let cache = DedupCache::open(&config).unwrap();

    for i in 0..10 {
        cache
            .is_expired(&format!("doc-{:04}", i), 480)
            .await
            .unwrap();
    }
    cache.persist().await.unwrap();
    cache.destroy().await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&config.file).unwrap()).unwrap();
    let map = raw.as_object().unwrap();
    assert_eq!(map.len(), 10);
    for entry in map.values() {
        assert!(entry["createtime"].is_i64());
        assert!(entry["ttl"].is_i64());
    }
    cleanup(&config.file);
}

//! Notifier entry point
//!
//! Wires the pieces together: tracing, config, the dedup cache singleton,
//! the webhook bot, and one worker per configured target, then runs the
//! dispatch loop until a shutdown signal arrives.

use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notifier::bot::WebhookBot;
use notifier::targets::{spawn_targets, TargetMessage};
use notifier::{Config, DedupCache};

/// Startup sequence:
/// 1. Initialize the tracing subscriber
/// 2. Load and validate configuration
/// 3. Initialize the dedup cache singleton (fatal on a corrupt snapshot)
/// 4. Spawn a worker per configured target
/// 5. Dispatch notifications until Ctrl+C / SIGTERM
/// 6. Stop workers, destroy the cache (final snapshot), exit
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notifier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting notifier");

    let config_path = Config::path_from_env();
    info!("load config {} ...", config_path.display());
    let config = Config::load(&config_path)?;
    info!(
        "Configuration loaded: webhook={}, cache file={}, cleanup interval={}s, targets={}",
        config.webhook_url,
        config.cache.file.display(),
        config.cache.cleanup_interval_secs,
        config.target_count()
    );
    if config.target_count() == 0 {
        warn!("no targets configured, nothing to watch");
    }

    let cache = DedupCache::instance(&config.cache)?;
    let bot = WebhookBot::new(config.webhook_url.clone());

    let (tx, mut rx) = mpsc::channel::<TargetMessage>(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = spawn_targets(&config, cache.clone(), tx, shutdown_rx);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            maybe_msg = rx.recv() => match maybe_msg {
                Some(notification) => {
                    if let Err(err) = bot.send(&notification.message).await {
                        error!(
                            "could not deliver notification from {}: {}",
                            notification.target, err
                        );
                    }
                }
                // All workers gone; with zero targets this exits immediately
                None => break,
            }
        }
    }

    info!("stopping target workers ...");
    let _ = shutdown_tx.send(true);
    for worker in workers {
        let _ = worker.await;
    }

    cache.destroy().await?;
    info!("shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

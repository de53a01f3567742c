//! Predictive analyzer preloading
//!
//! Long-running task that periodically looks at which analyzers dominate
//! the current hour's usage (per the statistics collector's hourly buckets)
//! and instantiates them ahead of demand, so the first request of a busy
//! period does not pay the load cost.
//!
//! # Design
//!
//! - Runs on a configurable interval
//! - Loads analyzers whose hour-of-day usage share meets the threshold
//! - Never retries loads that already failed; the failure is permanent
//! - Gracefully shuts down when signalled
//! - Provides handle for task management

use crate::config::PreloaderConfig;
use crate::error::{HarmoniaError, Result};
use crate::registry::AnalyzerRegistry;
use crate::stats::Statistics;
use chrono::Timelike;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::interval;

/// Preloader task handle for controlling the background task
pub struct PreloaderHandle {
    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    /// Task handle
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl PreloaderHandle {
    /// Create and spawn a new preloader task
    pub fn spawn(
        registry: AnalyzerRegistry,
        stats: Arc<Statistics>,
        config: PreloaderConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task_handle = tokio::spawn(async move {
            run_preload_loop(registry, stats, config, shutdown_rx).await;
        });

        Self {
            shutdown_tx,
            task_handle: Some(task_handle),
        }
    }

    /// Stop the preloader task gracefully
    pub async fn stop(&mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.task_handle.take() {
            handle.await.map_err(|e| {
                HarmoniaError::Task(format!("Failed to stop preloader task: {}", e))
            })?;
        }

        tracing::info!("Preloader task stopped");
        Ok(())
    }

    /// Check if task is running
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

/// Run the preload loop
async fn run_preload_loop(
    registry: AnalyzerRegistry,
    stats: Arc<Statistics>,
    config: PreloaderConfig,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut timer = interval(config.interval());

    tracing::info!(
        "Starting preloader task with {}s interval (share threshold {:.2})",
        config.interval_secs,
        config.share_threshold
    );

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let hour = chrono::Local::now().hour();
                preload_for_hour(&registry, &stats, config.share_threshold, hour).await;
            }

            _ = shutdown_rx.recv() => {
                tracing::info!("Preloader task received shutdown signal");
                break;
            }
        }
    }
}

/// One preload pass: load analyzers at or above the usage-share threshold
///
/// Returns the number of analyzers newly loaded. Analyzers already loaded,
/// already failed, or since unregistered are skipped; a load failure is
/// logged and swallowed so one broken analyzer cannot stall the pass.
pub(crate) async fn preload_for_hour(
    registry: &AnalyzerRegistry,
    stats: &Statistics,
    threshold: f64,
    hour: u32,
) -> usize {
    let mut shares: Vec<(String, f64)> = stats.usage_shares(hour).into_iter().collect();
    shares.sort_by(|a, b| a.0.cmp(&b.0));

    let mut loaded = 0;
    for (id, share) in shares {
        if share < threshold {
            continue;
        }
        let descriptor = match registry.get(&id).await {
            Some(descriptor) => descriptor,
            None => continue,
        };
        if descriptor.is_loaded() || descriptor.load_failed() {
            continue;
        }
        match descriptor.instance().await {
            Ok(_) => {
                tracing::info!(
                    "Preloaded analyzer '{}' (usage share {:.2} at hour {})",
                    id,
                    share,
                    hour
                );
                loaded += 1;
            }
            Err(e) => {
                tracing::warn!("Preload of analyzer '{}' failed: {}", id, e);
            }
        }
    }
    loaded
}

//! Background eviction of expired progress records and published files.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vid2audio_core::metrics::{FILE_EVICTIONS, PROGRESS_EVICTIONS};
use vid2audio_core::{ProgressStore, RetentionConfig, Workspace};

/// Result of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub progress_evicted: usize,
    pub files_evicted: usize,
}

/// Periodically evicts finished progress records and old workspace files.
pub struct RetentionSweeper {
    progress: ProgressStore,
    workspace: Workspace,
    config: RetentionConfig,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RetentionSweeper {
    pub fn new(progress: ProgressStore, workspace: Workspace, config: RetentionConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            progress,
            workspace,
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handle: Mutex::new(None),
        }
    }

    /// Runs a single sweep now.
    pub async fn sweep_once(&self) -> SweepReport {
        sweep(&self.progress, &self.workspace, &self.config).await
    }

    /// Spawns the sweep loop.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Retention sweeper already running");
            return;
        }

        let progress = self.progress.clone();
        let workspace = self.workspace.clone();
        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = Duration::from_secs(config.sweep_interval_secs);

        let handle = tokio::spawn(async move {
            info!(interval_secs = config.sweep_interval_secs, "Retention sweeper started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Retention sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        sweep(&progress, &workspace, &config).await;
                    }
                }
            }
            info!("Retention sweeper stopped");
        });

        *self.handle.lock().await = Some(handle);
    }

    /// Stops the sweep loop and waits for it to exit.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn sweep(
    progress: &ProgressStore,
    workspace: &Workspace,
    config: &RetentionConfig,
) -> SweepReport {
    let progress_evicted = progress
        .evict_finished(Duration::from_secs(config.progress_ttl_secs))
        .await;

    let files_evicted = match workspace
        .evict_older_than(Duration::from_secs(config.file_ttl_secs))
        .await
    {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Workspace eviction failed");
            0
        }
    };

    PROGRESS_EVICTIONS.inc_by(progress_evicted as u64);
    FILE_EVICTIONS.inc_by(files_evicted as u64);
    debug!(progress_evicted, files_evicted, "Retention sweep complete");

    SweepReport {
        progress_evicted,
        files_evicted,
    }
}

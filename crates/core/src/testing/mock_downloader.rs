//! Mock downloader for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::MockFailure;
use crate::tools::{DownloadedVideo, Downloader, ToolError};

/// A recorded download call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDownload {
    pub url: String,
    pub output_dir: PathBuf,
    pub base_name: String,
}

/// Mock implementation of the Downloader trait.
///
/// Writes `<output_dir>/<base_name>.<extension>` and reports it, unless a
/// failure has been queued.
#[derive(Debug, Clone)]
pub struct MockDownloader {
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
    next_failure: Arc<RwLock<Option<MockFailure>>>,
    extension: Arc<RwLock<String>>,
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    /// Create a new mock downloader producing `.mp4` files.
    pub fn new() -> Self {
        Self {
            downloads: Arc::new(RwLock::new(Vec::new())),
            next_failure: Arc::new(RwLock::new(None)),
            extension: Arc::new(RwLock::new("mp4".to_string())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Make the next download fail.
    pub async fn set_failure(&self, failure: MockFailure) {
        *self.next_failure.write().await = Some(failure);
    }

    /// Extension of produced files, without the dot.
    pub async fn set_extension(&self, extension: impl Into<String>) {
        *self.extension.write().await = extension.into();
    }

    /// Simulated download duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Downloads requested so far.
    pub async fn recorded_downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_video(
        &self,
        url: &str,
        output_dir: &Path,
        base_name: &str,
    ) -> Result<DownloadedVideo, ToolError> {
        self.downloads.write().await.push(RecordedDownload {
            url: url.to_string(),
            output_dir: output_dir.to_path_buf(),
            base_name: base_name.to_string(),
        });

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.next_failure.write().await.take() {
            return Err(failure.into_error("mock-downloader", output_dir, base_name));
        }

        let extension = self.extension.read().await.clone();
        let path = output_dir.join(format!("{}.{}", base_name, extension));
        tokio::fs::write(&path, format!("video from {}", url)).await?;

        Ok(DownloadedVideo {
            path,
            extension: format!(".{}", extension),
        })
    }

    async fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

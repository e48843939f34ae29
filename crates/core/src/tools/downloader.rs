//! Command-line downloader implementation (you-get or yt-dlp).

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::config::{DownloaderConfig, DownloaderFlavor};
use super::error::ToolError;
use super::process::run_tool;
use super::resolve::resolve_output;
use super::traits::Downloader;
use super::types::DownloadedVideo;

/// Timeout for `--version` probes.
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(15);

/// Downloader that shells out to an external command-line tool.
pub struct CommandDownloader {
    config: DownloaderConfig,
}

impl CommandDownloader {
    /// Creates a new downloader with the given configuration.
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Creates a downloader with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(DownloaderConfig::default())
    }

    /// Builds the argument vector for a download.
    fn build_args(&self, url: &str, output_dir: &Path, base_name: &str) -> Vec<String> {
        let dir = output_dir.to_string_lossy().to_string();
        let mut args = match self.config.flavor {
            DownloaderFlavor::YouGet => vec![
                "-o".to_string(),
                dir,
                "-O".to_string(),
                base_name.to_string(),
            ],
            DownloaderFlavor::YtDlp => vec![
                "--no-playlist".to_string(),
                "--no-progress".to_string(),
                "--no-mtime".to_string(),
                "-P".to_string(),
                dir,
                "-o".to_string(),
                format!("{}.%(ext)s", base_name),
            ],
        };

        args.extend(self.config.extra_args.iter().cloned());

        // Keep a URL starting with '-' from being read as an option
        if url.starts_with('-') {
            args.push("--".to_string());
        }
        args.push(url.to_string());

        args
    }
}

#[async_trait]
impl Downloader for CommandDownloader {
    fn name(&self) -> &str {
        self.config.flavor.default_binary()
    }

    async fn fetch_video(
        &self,
        url: &str,
        output_dir: &Path,
        base_name: &str,
    ) -> Result<DownloadedVideo, ToolError> {
        let args = self.build_args(url, output_dir, base_name);
        let output = run_tool(
            self.config.flavor.default_binary(),
            &self.config.binary(),
            &args,
            Duration::from_secs(self.config.timeout_secs),
        )
        .await?;
        debug!(stdout = %output.stdout.trim_end(), "Downloader output");

        let (path, extension) = resolve_output(output_dir, base_name).await?;
        Ok(DownloadedVideo { path, extension })
    }

    async fn validate(&self) -> Result<(), ToolError> {
        run_tool(
            self.config.flavor.default_binary(),
            &self.config.binary(),
            &["--version".to_string()],
            VALIDATE_TIMEOUT,
        )
        .await
        .map(|_| ())
    }
}

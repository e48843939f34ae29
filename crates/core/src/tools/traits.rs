//! Trait definitions for the external tools.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ToolError;
use super::types::{DownloadedVideo, EncodeJob};

/// A downloader that fetches a video from a URL into a directory.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Downloads `url` into `output_dir`, naming the file after `base_name`.
    ///
    /// The tool picks the extension, so the returned path is discovered
    /// by prefix after the tool exits.
    async fn fetch_video(
        &self,
        url: &str,
        output_dir: &Path,
        base_name: &str,
    ) -> Result<DownloadedVideo, ToolError>;

    /// Validates that the downloader is installed and runnable.
    async fn validate(&self) -> Result<(), ToolError>;
}

/// A transcoder that extracts the audio track of a video.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Encodes the job's input into its target format and returns the output path.
    async fn encode_audio(&self, job: EncodeJob) -> Result<PathBuf, ToolError>;

    /// Validates that the transcoder is installed and runnable.
    async fn validate(&self) -> Result<(), ToolError>;
}

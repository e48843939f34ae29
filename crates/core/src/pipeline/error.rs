//! Error taxonomy for conversion tasks.

use thiserror::Error;

use crate::tools::UnsupportedFormat;
use crate::workspace::WorkspaceError;

/// Terminal failure of a conversion task.
///
/// The display text is what the client sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// No URL supplied.
    #[error("please provide a video URL")]
    MissingInput,

    /// Downloader failed or produced no file.
    #[error("download failed: {0}")]
    DownloadFailure(String),

    /// Requested audio format is not supported.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Transcoder failed or produced no file.
    #[error("conversion failed: {0}")]
    EncodeFailure(String),

    /// Another conversion with the same task id is still running.
    #[error("task already running: {0}")]
    TaskInProgress(String),

    /// Anything else that went wrong during the pipeline.
    #[error("unexpected error: {0}")]
    UnexpectedFailure(String),
}

impl PipelineError {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::DownloadFailure(_) => "download_failed",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::EncodeFailure(_) => "encode_failed",
            Self::TaskInProgress(_) => "task_in_progress",
            Self::UnexpectedFailure(_) => "unexpected",
        }
    }
}

impl From<UnsupportedFormat> for PipelineError {
    fn from(err: UnsupportedFormat) -> Self {
        Self::UnsupportedFormat(err.0)
    }
}

impl From<WorkspaceError> for PipelineError {
    fn from(err: WorkspaceError) -> Self {
        Self::UnexpectedFailure(err.to_string())
    }
}

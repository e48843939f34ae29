//! Testing utilities and mock implementations of the external tools.
//!
//! The mocks write real files into the directories they are given, so the
//! pipeline's discovery and publishing steps run unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use vid2audio_core::testing::{MockDownloader, MockTranscoder};
//!
//! let downloader = MockDownloader::new();
//! downloader.set_failure(MockFailure::Exit { stderr: "geoblocked".into() }).await;
//!
//! let transcoder = MockTranscoder::new();
//! // ... run the pipeline ...
//! assert!(transcoder.recorded_jobs().await.is_empty());
//! ```

mod mock_downloader;
mod mock_transcoder;

pub use mock_downloader::{MockDownloader, RecordedDownload};
pub use mock_transcoder::MockTranscoder;

use crate::tools::ToolError;

/// Failure a mock tool should simulate on its next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Non-zero exit with the given diagnostic output.
    Exit { stderr: String },
    /// Deadline exceeded.
    Timeout,
    /// Exit 0 but no output file written.
    NoOutput,
}

impl MockFailure {
    pub(crate) fn into_error(self, tool: &'static str, dir: &std::path::Path, prefix: &str) -> ToolError {
        match self {
            MockFailure::Exit { stderr } => ToolError::Exited {
                tool,
                code: Some(1),
                stderr,
            },
            MockFailure::Timeout => ToolError::Timeout {
                tool,
                timeout_secs: 1,
            },
            MockFailure::NoOutput => ToolError::OutputNotFound {
                dir: dir.to_path_buf(),
                prefix: prefix.to_string(),
            },
        }
    }
}

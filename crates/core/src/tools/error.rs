//! Error types for external tool invocation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool binary not found.
    #[error("{tool} not found at path: {path}")]
    BinaryNotFound { tool: &'static str, path: PathBuf },

    /// Tool ran but exited unsuccessfully.
    #[error("{tool} exited with code {code:?}: {stderr}")]
    Exited {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    /// Tool exceeded its deadline and was killed.
    #[error("{tool} timed out after {timeout_secs} seconds")]
    Timeout {
        tool: &'static str,
        timeout_secs: u64,
    },

    /// Tool reported success but no matching output file exists.
    #[error("no output file starting with '{prefix}' in {dir}")]
    OutputNotFound { dir: PathBuf, prefix: String },

    /// I/O error while spawning or scanning.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Human-facing detail for this error.
    ///
    /// A failed exit yields the tool's diagnostic stream unchanged.
    pub fn detail(&self) -> String {
        match self {
            Self::Exited { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BinaryNotFound { .. } => "binary_not_found",
            Self::Exited { .. } => "exited",
            Self::Timeout { .. } => "timeout",
            Self::OutputNotFound { .. } => "output_not_found",
            Self::Io(_) => "io",
        }
    }
}

use thiserror::Error;

/// Errors from workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Name is empty, hidden, or would escape the workspace.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// No published file with this name.
    #[error("file not found: {0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Scratch workspace holding downloaded videos and encoded audio.
//!
//! Layout:
//!
//! ```text
//! <root>/                 published files, served for download
//! <root>/.tasks/<id>/     per-task staging directory the tools write into
//! ```
//!
//! Tools only ever see their own staging directory, so output discovery by
//! prefix cannot pick up another task's file.

mod error;
mod manager;

pub use error::WorkspaceError;
pub use manager::{is_safe_file_name, Workspace};

//! In-memory task progress tracking.
//!
//! The pipeline writes a record per task as it moves through its stages;
//! pollers read the same record concurrently. Finished records are evicted
//! once they are older than the retention window.

mod store;
mod types;

pub use store::ProgressStore;
pub use types::{ProgressRecord, Stage};

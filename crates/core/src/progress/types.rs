use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage of a task.
///
/// Stages advance strictly in declaration order; `Failed` may follow any
/// non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Preparing,
    Downloading,
    Downloaded,
    Encoding,
    Encoded,
    Done,
    Failed,
}

impl Stage {
    /// All stages, for metrics.
    pub const ALL: [Stage; 7] = [
        Stage::Preparing,
        Stage::Downloading,
        Stage::Downloaded,
        Stage::Encoding,
        Stage::Encoded,
        Stage::Done,
        Stage::Failed,
    ];

    /// Percent reported on entering this stage. `Failed` keeps the last value.
    pub fn percent(&self) -> Option<u8> {
        match self {
            Stage::Preparing => Some(0),
            Stage::Downloading => Some(10),
            Stage::Downloaded => Some(40),
            Stage::Encoding => Some(60),
            Stage::Encoded => Some(90),
            Stage::Done => Some(100),
            Stage::Failed => None,
        }
    }

    /// Status message shown to the user on entering this stage.
    pub fn message(&self) -> &'static str {
        match self {
            Stage::Preparing => "preparing",
            Stage::Downloading => "downloading video...",
            Stage::Downloaded => "video downloaded, preparing audio conversion...",
            Stage::Encoding => "converting audio...",
            Stage::Encoded => "audio conversion complete...",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    /// Whether no further updates follow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preparing => "preparing",
            Stage::Downloading => "downloading",
            Stage::Downloaded => "downloaded",
            Stage::Encoding => "encoding",
            Stage::Encoded => "encoded",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one task as reported to pollers.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressRecord {
    /// 0-100, never decreases within a task.
    pub percent: u8,
    /// Human-readable status.
    pub message: String,
    pub stage: Stage,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Record for entering `stage` with its standard percent and message.
    pub fn at_stage(stage: Stage) -> Self {
        Self {
            percent: stage.percent().unwrap_or(0),
            message: stage.message().to_string(),
            stage,
            updated_at: Utc::now(),
        }
    }

    /// Record for a task nobody has started yet.
    pub fn not_started() -> Self {
        Self::at_stage(Stage::Preparing)
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::not_started()
    }
}

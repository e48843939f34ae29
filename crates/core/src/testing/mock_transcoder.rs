//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::MockFailure;
use crate::tools::{EncodeJob, ToolError, Transcoder};

/// Mock implementation of the Transcoder trait.
///
/// Writes the job's output path and records the job, unless a failure
/// has been queued.
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    jobs: Arc<RwLock<Vec<EncodeJob>>>,
    next_failure: Arc<RwLock<Option<MockFailure>>>,
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next encode fail.
    pub async fn set_failure(&self, failure: MockFailure) {
        *self.next_failure.write().await = Some(failure);
    }

    /// Jobs submitted so far.
    pub async fn recorded_jobs(&self) -> Vec<EncodeJob> {
        self.jobs.read().await.clone()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encode_audio(&self, job: EncodeJob) -> Result<PathBuf, ToolError> {
        self.jobs.write().await.push(job.clone());

        if let Some(failure) = self.next_failure.write().await.take() {
            return Err(failure.into_error("mock-transcoder", &job.output_dir, &job.base_name));
        }

        let output = job.output_path();
        tokio::fs::write(&output, format!("{} audio", job.format)).await?;
        Ok(output)
    }

    async fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

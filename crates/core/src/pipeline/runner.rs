//! The conversion pipeline: download, then encode, with progress tracking.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::WorkspaceConfig;
use crate::metrics::{CONVERSIONS_TOTAL, CONVERSION_DURATION};
use crate::progress::{ProgressStore, Stage};
use crate::tools::{AudioFormat, Downloader, EncodeJob, Transcoder};
use crate::workspace::Workspace;

use super::error::PipelineError;
use super::types::{
    clamp_quality, default_video_base_name, sanitize_base_name, ConversionOutcome,
    ConversionRequest,
};

/// Default number of conversions allowed to run at once.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Runs conversions and records their progress.
///
/// Stages advance strictly in order:
/// preparing (0%) -> downloading (10%) -> downloaded (40%) ->
/// encoding (60%) -> encoded (90%) -> done (100%).
/// Any failure ends the task in `failed` with the error message.
pub struct ConversionPipeline {
    workspace: Workspace,
    progress: ProgressStore,
    downloader: Arc<dyn Downloader>,
    transcoder: Arc<dyn Transcoder>,
    reset_on_new_task: bool,
    permits: Arc<Semaphore>,
    active: Arc<Mutex<HashSet<String>>>,
}

/// Claim on a task id while its conversion runs. Released on drop.
struct ActiveTask {
    active: Arc<Mutex<HashSet<String>>>,
    task_id: String,
}

impl Drop for ActiveTask {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.task_id);
    }
}

impl ConversionPipeline {
    /// Creates a pipeline over the given workspace, store and tools.
    pub fn new(
        workspace: Workspace,
        progress: ProgressStore,
        downloader: Arc<dyn Downloader>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            workspace,
            progress,
            downloader,
            transcoder,
            reset_on_new_task: false,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Applies workspace policy: concurrency limit and reset-per-task.
    ///
    /// Resetting per task wipes every other task's files, so it forces
    /// conversions to run one at a time.
    pub fn with_workspace_config(mut self, config: &WorkspaceConfig) -> Self {
        let limit = if config.reset_on_new_task {
            1
        } else {
            config.max_concurrent_tasks.max(1)
        };
        self.reset_on_new_task = config.reset_on_new_task;
        self.permits = Arc::new(Semaphore::new(limit));
        self
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Number of conversions that may start right now.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Whether a conversion with this task id is running.
    pub fn is_running(&self, task_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(task_id)
    }

    /// Runs one conversion to completion.
    ///
    /// A task id can only be in flight once; a second run with the same id
    /// fails with [`PipelineError::TaskInProgress`] and leaves the running
    /// task's record and files alone.
    pub async fn run(
        &self,
        task_id: &str,
        request: ConversionRequest,
    ) -> Result<ConversionOutcome, PipelineError> {
        let start = Instant::now();
        // Held until the outcome is recorded below
        let active = self.claim(task_id);
        let result = match &active {
            Ok(_) => self.execute(task_id, &request).await,
            Err(e) => Err(e.clone()),
        };

        let label = match &result {
            Ok(outcome) => {
                info!(
                    task_id,
                    video = %outcome.video_file,
                    audio = %outcome.audio_file,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Conversion finished"
                );
                "success"
            }
            Err(PipelineError::MissingInput) => {
                info!(task_id, "Conversion rejected: no URL");
                PipelineError::MissingInput.label()
            }
            Err(e @ PipelineError::TaskInProgress(_)) => {
                warn!(task_id, "Conversion rejected: task id already in flight");
                e.label()
            }
            Err(e) => {
                warn!(task_id, error = %e, "Conversion failed");
                self.progress.fail(task_id, e.to_string()).await;
                e.label()
            }
        };

        CONVERSIONS_TOTAL.with_label_values(&[label]).inc();
        CONVERSION_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    async fn execute(
        &self,
        task_id: &str,
        request: &ConversionRequest,
    ) -> Result<ConversionOutcome, PipelineError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(PipelineError::MissingInput);
        }

        // Validated before any download so a bad format costs nothing
        let format: AudioFormat = request.format.parse()?;
        let quality = clamp_quality(request.quality);

        self.progress.advance(task_id, Stage::Preparing).await;
        info!(task_id, url, format = %format, quality, "Starting conversion");

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PipelineError::UnexpectedFailure("pipeline is shut down".to_string()))?;

        if self.reset_on_new_task {
            self.workspace.reset().await?;
        }

        let task_dir = self.workspace.create_task_dir(task_id).await?;
        let result = self
            .process(task_id, url, format, quality, request, &task_dir)
            .await;
        self.workspace.discard_task_dir(task_id).await;

        result
    }

    fn claim(&self, task_id: &str) -> Result<ActiveTask, PipelineError> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(task_id.to_string()) {
            return Err(PipelineError::TaskInProgress(task_id.to_string()));
        }
        Ok(ActiveTask {
            active: Arc::clone(&self.active),
            task_id: task_id.to_string(),
        })
    }

    async fn process(
        &self,
        task_id: &str,
        url: &str,
        format: AudioFormat,
        quality: u8,
        request: &ConversionRequest,
        task_dir: &Path,
    ) -> Result<ConversionOutcome, PipelineError> {
        // Download
        self.progress.advance(task_id, Stage::Downloading).await;
        let video_base = request
            .video_base_name
            .as_deref()
            .and_then(sanitize_base_name)
            .unwrap_or_else(default_video_base_name);

        debug!(task_id, downloader = self.downloader.name(), base = %video_base, "Fetching video");
        let video = self
            .downloader
            .fetch_video(url, task_dir, &video_base)
            .await
            .map_err(|e| PipelineError::DownloadFailure(e.detail()))?;
        info!(
            task_id,
            downloader = self.downloader.name(),
            file = %video.path.display(),
            "Video downloaded"
        );
        self.progress.advance(task_id, Stage::Downloaded).await;

        // Encode
        self.progress.advance(task_id, Stage::Encoding).await;
        let audio_base = request
            .audio_base_name
            .as_deref()
            .and_then(sanitize_base_name)
            .unwrap_or_else(|| {
                let stem = video
                    .path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| video_base.clone());
                format!("{}_audio", stem)
            });

        let audio_path = self
            .transcoder
            .encode_audio(EncodeJob {
                input: video.path.clone(),
                output_dir: task_dir.to_path_buf(),
                format,
                quality,
                base_name: audio_base,
            })
            .await
            .map_err(|e| PipelineError::EncodeFailure(e.detail()))?;
        info!(
            task_id,
            transcoder = self.transcoder.name(),
            file = %audio_path.display(),
            "Audio encoded"
        );
        self.progress.advance(task_id, Stage::Encoded).await;

        // Publish
        let video_file = self.workspace.publish(&video.path).await?;
        let audio_file = self.workspace.publish(&audio_path).await?;
        self.progress.advance(task_id, Stage::Done).await;

        Ok(ConversionOutcome {
            video_file,
            audio_file,
            video_ext: video.extension,
        })
    }
}

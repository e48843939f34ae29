use std::path::Path;
use std::sync::Arc;
use vid2audio_core::{Config, ConversionPipeline, ProgressStore, Workspace};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<ConversionPipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<ConversionPipeline>) -> Self {
        Self { config, pipeline }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<ConversionPipeline> {
        &self.pipeline
    }

    pub fn progress(&self) -> &ProgressStore {
        self.pipeline.progress()
    }

    pub fn workspace(&self) -> &Workspace {
        self.pipeline.workspace()
    }

    /// Directory holding the page shell and its assets.
    pub fn static_dir(&self) -> &Path {
        &self.config.server.static_dir
    }
}

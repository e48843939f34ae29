pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod testing;
pub mod tools;
pub mod workspace;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LoggingConfig, RetentionConfig, ServerConfig, WorkspaceConfig,
};
pub use pipeline::{
    ConversionOutcome, ConversionPipeline, ConversionRequest, PipelineError,
};
pub use progress::{ProgressRecord, ProgressStore, Stage};
pub use tools::{
    AudioFormat, CommandDownloader, Downloader, DownloaderConfig, DownloaderFlavor,
    FfmpegTranscoder, ToolError, Transcoder, TranscoderConfig,
};
pub use workspace::{Workspace, WorkspaceError};

//! Conversion pipeline orchestration.
//!
//! [`ConversionPipeline`] sequences a conversion:
//! - Validate the request (URL present, format supported)
//! - Stage a per-task directory in the workspace
//! - Download the video and discover its file
//! - Encode the audio track
//! - Publish both files for download
//!
//! Each milestone is written to the [`ProgressStore`](crate::progress::ProgressStore)
//! so a poller can follow along.
//!
//! # Example
//!
//! ```ignore
//! use vid2audio_core::pipeline::{ConversionPipeline, ConversionRequest, new_task_id};
//!
//! let pipeline = ConversionPipeline::new(workspace, progress, downloader, transcoder);
//! let task_id = new_task_id();
//! let outcome = pipeline
//!     .run(&task_id, ConversionRequest::new("https://example.test/v").with_format("flac"))
//!     .await?;
//! println!("{}", outcome.audio_url());
//! ```

mod error;
mod runner;
mod types;

pub use error::PipelineError;
pub use runner::ConversionPipeline;
pub use types::{
    clamp_quality, default_video_base_name, download_url, is_valid_task_id, new_task_id,
    sanitize_base_name, ConversionOutcome, ConversionRequest, DEFAULT_FORMAT, DEFAULT_QUALITY,
};

//! External tool invocation: the video downloader and the audio transcoder.
//!
//! Both tools are black boxes invoked by path with an argument vector.
//! Every invocation runs under a deadline and the child process is killed
//! when it expires.
//!
//! # Example
//!
//! ```ignore
//! use vid2audio_core::tools::{CommandDownloader, Downloader, FfmpegTranscoder, Transcoder};
//!
//! let downloader = CommandDownloader::with_defaults();
//! let video = downloader
//!     .fetch_video("https://example.test/watch?v=1", dir, "video_ab12cd34")
//!     .await?;
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! let audio = transcoder
//!     .encode_audio(EncodeJob {
//!         input: video.path,
//!         output_dir: dir.to_path_buf(),
//!         format: AudioFormat::Mp3,
//!         quality: 4,
//!         base_name: "video_ab12cd34_audio".to_string(),
//!     })
//!     .await?;
//! ```

mod config;
mod downloader;
mod error;
mod ffmpeg;
mod process;
mod resolve;
mod traits;
mod types;

pub use config::{DownloaderConfig, DownloaderFlavor, TranscoderConfig};
pub use downloader::CommandDownloader;
pub use error::ToolError;
pub use ffmpeg::FfmpegTranscoder;
pub use resolve::{extension_of, resolve_output, resolve_output_excluding};
pub use traits::{Downloader, Transcoder};
pub use types::{
    m4a_bitrate_kbps, AudioFormat, DownloadedVideo, EncodeJob, EncodeSettings, UnsupportedFormat,
    MAX_QUALITY,
};

//! Configuration for the external tools.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command-line conventions of the supported downloaders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloaderFlavor {
    /// `you-get -o <dir> -O <name> <url>`
    #[default]
    YouGet,
    /// `yt-dlp -P <dir> -o <name>.%(ext)s <url>`
    YtDlp,
}

impl DownloaderFlavor {
    /// Binary name used when no explicit path is configured.
    pub fn default_binary(&self) -> &'static str {
        match self {
            Self::YouGet => "you-get",
            Self::YtDlp => "yt-dlp",
        }
    }
}

/// Configuration for the video downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Path to the downloader binary. Defaults to the flavor's binary name.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Which downloader's argument conventions to use.
    #[serde(default)]
    pub flavor: DownloaderFlavor,

    /// Timeout for a single download in seconds.
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,

    /// Additional arguments inserted before the URL.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_download_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            path: None,
            flavor: DownloaderFlavor::default(),
            timeout_secs: default_download_timeout(),
            extra_args: Vec::new(),
        }
    }
}

impl DownloaderConfig {
    /// Creates a config for the given flavor and binary path.
    pub fn with_path(flavor: DownloaderFlavor, path: PathBuf) -> Self {
        Self {
            path: Some(path),
            flavor,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Resolved binary path.
    pub fn binary(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.flavor.default_binary()))
    }
}

/// Configuration for the FFmpeg-based transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Timeout for a single encode in seconds.
    #[serde(default = "default_encode_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Additional ffmpeg arguments inserted before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_encode_timeout() -> u64 {
    900 // 15 minutes
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_encode_timeout(),
            log_level: default_log_level(),
            extra_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a config with a custom ffmpeg path.
    pub fn with_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_downloader_config() {
        let config = DownloaderConfig::default();
        assert_eq!(config.flavor, DownloaderFlavor::YouGet);
        assert_eq!(config.binary(), PathBuf::from("you-get"));
        assert_eq!(config.timeout_secs, 1800);
    }

    #[test]
    fn test_downloader_binary_follows_flavor() {
        let config = DownloaderConfig {
            flavor: DownloaderFlavor::YtDlp,
            ..Default::default()
        };
        assert_eq!(config.binary(), PathBuf::from("yt-dlp"));

        let config =
            DownloaderConfig::with_path(DownloaderFlavor::YtDlp, PathBuf::from("/opt/yt-dlp"))
                .with_timeout(10);
        assert_eq!(config.binary(), PathBuf::from("/opt/yt-dlp"));
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_transcoder_config_builder() {
        let config = TranscoderConfig::with_path(PathBuf::from("/usr/local/bin/ffmpeg"))
            .with_timeout(120);
        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.log_level, "error");
    }
}

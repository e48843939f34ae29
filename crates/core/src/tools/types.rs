//! Types shared by the downloader and transcoder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Highest value on the quality scale accepted by the encoders.
pub const MAX_QUALITY: u8 = 8;

/// WAV output is uncompressed 16-bit PCM at CD rate.
const WAV_BITRATE: &str = "1411k";

/// Requested audio format is not one of the supported outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported format: {0}")]
pub struct UnsupportedFormat(pub String);

/// Supported audio output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    M4a,
    Flac,
}

impl AudioFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::M4a => "m4a",
            Self::Flac => "flac",
        }
    }

    /// FFmpeg audio codec name.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Wav => "pcm_s16le",
            Self::M4a => "aac",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            "m4a" => Ok(Self::M4a),
            "flac" => Ok(Self::Flac),
            _ => Err(UnsupportedFormat(s.to_string())),
        }
    }
}

/// Encoder settings derived from a format and a quality level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub codec: &'static str,
    pub quality_flag: &'static str,
    pub quality_value: String,
}

impl EncodeSettings {
    /// Maps a format and quality (0-8) to codec and quality arguments.
    ///
    /// - mp3: VBR quality passed through (`-q:a`, lower is better)
    /// - wav: fixed PCM bitrate, quality ignored
    /// - m4a: `128 + 32 * quality` kbps
    /// - flac: compression level passed through
    pub fn for_format(format: AudioFormat, quality: u8) -> Self {
        let quality = quality.min(MAX_QUALITY);
        let (quality_flag, quality_value) = match format {
            AudioFormat::Mp3 => ("-q:a", quality.to_string()),
            AudioFormat::Wav => ("-b:a", WAV_BITRATE.to_string()),
            AudioFormat::M4a => ("-b:a", format!("{}k", m4a_bitrate_kbps(quality))),
            AudioFormat::Flac => ("-compression_level", quality.to_string()),
        };

        Self {
            codec: format.ffmpeg_codec(),
            quality_flag,
            quality_value,
        }
    }
}

/// AAC bitrate for a quality level.
pub fn m4a_bitrate_kbps(quality: u8) -> u32 {
    128 + u32::from(quality) * 32
}

/// A video fetched by the downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedVideo {
    /// Path of the discovered file.
    pub path: PathBuf,
    /// Extension with leading dot (e.g. ".mp4"), empty if none.
    pub extension: String,
}

/// An audio extraction job.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    /// Input video file.
    pub input: PathBuf,
    /// Directory the output is written to.
    pub output_dir: PathBuf,
    /// Target format.
    pub format: AudioFormat,
    /// Quality level on the 0-8 scale.
    pub quality: u8,
    /// Output file name without extension.
    pub base_name: String,
}

impl EncodeJob {
    /// Full output path: `<output_dir>/<base_name>.<ext>`.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.base_name, self.format.extension()))
    }
}

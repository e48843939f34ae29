//! Request, outcome and naming helpers for conversions.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::tools::MAX_QUALITY;

/// Default output format when the client does not choose one.
pub const DEFAULT_FORMAT: &str = "mp3";

/// Default quality when the client does not choose one.
pub const DEFAULT_QUALITY: i64 = 4;

/// Longest accepted client-supplied task id.
const MAX_TASK_ID_LEN: usize = 128;

/// Longest base name kept after sanitizing, in characters.
const MAX_BASE_NAME_CHARS: usize = 150;

static TASK_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).unwrap());

/// Input for one conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Source video URL.
    pub url: String,
    /// Requested audio format (validated by the pipeline).
    pub format: String,
    /// Quality on the 0-8 scale; out-of-range values are clamped.
    pub quality: i64,
    /// Custom base name for the downloaded video.
    pub video_base_name: Option<String>,
    /// Custom base name for the encoded audio.
    pub audio_base_name: Option<String>,
}

impl ConversionRequest {
    /// Request with default format and quality.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: DEFAULT_FORMAT.to_string(),
            quality: DEFAULT_QUALITY,
            video_base_name: None,
            audio_base_name: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_quality(mut self, quality: i64) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_video_base_name(mut self, name: impl Into<String>) -> Self {
        self.video_base_name = Some(name.into());
        self
    }

    pub fn with_audio_base_name(mut self, name: impl Into<String>) -> Self {
        self.audio_base_name = Some(name.into());
        self
    }
}

/// Files produced by a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    /// Published video file name.
    pub video_file: String,
    /// Published audio file name.
    pub audio_file: String,
    /// Video extension with leading dot.
    pub video_ext: String,
}

impl ConversionOutcome {
    pub fn video_url(&self) -> String {
        download_url(&self.video_file)
    }

    pub fn audio_url(&self) -> String {
        download_url(&self.audio_file)
    }
}

/// Download link for a published file.
pub fn download_url(file_name: &str) -> String {
    format!("/download/{}", urlencoding::encode(file_name))
}

/// Fresh opaque task id.
pub fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Whether a client-supplied task id is acceptable.
pub fn is_valid_task_id(id: &str) -> bool {
    id.len() <= MAX_TASK_ID_LEN && TASK_ID_RE.is_match(id)
}

/// Base name for a downloaded video when the client gives none.
pub fn default_video_base_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("video_{}", &id[..8])
}

/// Makes a client-supplied base name safe to use as a file name.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_base_name(name: &str) -> Option<String> {
    let replaced = UNSAFE_NAME_CHARS.replace_all(name, "_");
    let cleaned: String = replaced
        .trim()
        .trim_start_matches('.')
        .trim()
        .chars()
        .take(MAX_BASE_NAME_CHARS)
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Clamps a requested quality into the encoder scale.
pub fn clamp_quality(quality: i64) -> u8 {
    let clamped = quality.clamp(0, i64::from(MAX_QUALITY));
    if clamped != quality {
        warn!(requested = quality, used = clamped, "Quality out of range, clamped");
    }
    clamped as u8
}

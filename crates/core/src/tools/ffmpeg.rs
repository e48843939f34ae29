//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::config::TranscoderConfig;
use super::error::ToolError;
use super::process::run_tool;
use super::resolve::resolve_output_excluding;
use super::traits::Transcoder;
use super::types::{EncodeJob, EncodeSettings};

const TOOL: &str = "ffmpeg";

/// Timeout for `-version` probes.
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(15);

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds ffmpeg arguments for audio extraction.
    fn build_args(&self, input_path: &Path, output_path: &Path, settings: &EncodeSettings) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-vn".to_string(), // Drop video stream
            "-acodec".to_string(),
            settings.codec.to_string(),
            settings.quality_flag.to_string(),
            settings.quality_value.clone(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
        ];

        args.extend(self.config.extra_args.iter().cloned());

        args.push(output_path.to_string_lossy().to_string());

        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        TOOL
    }

    async fn encode_audio(&self, job: EncodeJob) -> Result<PathBuf, ToolError> {
        let output_path = job.output_path();
        let settings = EncodeSettings::for_format(job.format, job.quality);
        let args = self.build_args(&job.input, &output_path, &settings);

        let output = run_tool(
            TOOL,
            &self.config.ffmpeg_path,
            &args,
            Duration::from_secs(self.config.timeout_secs),
        )
        .await?;
        if !output.stderr.is_empty() {
            debug!(stderr = %output.stderr, "FFmpeg diagnostics");
        }

        if tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Ok(output_path);
        }

        warn!(
            expected = %output_path.display(),
            "FFmpeg output missing at expected path, scanning by prefix"
        );
        // The input video may share the prefix when the names are user-chosen
        let (path, _) =
            resolve_output_excluding(&job.output_dir, &job.base_name, &job.input).await?;
        Ok(path)
    }

    async fn validate(&self) -> Result<(), ToolError> {
        run_tool(
            TOOL,
            &self.config.ffmpeg_path,
            &["-version".to_string()],
            VALIDATE_TIMEOUT,
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::AudioFormat;

    fn args_for(format: AudioFormat, quality: u8) -> Vec<String> {
        let transcoder = FfmpegTranscoder::with_defaults();
        let settings = EncodeSettings::for_format(format, quality);
        transcoder.build_args(
            Path::new("/work/video_1.mp4"),
            Path::new("/work/video_1_audio.out"),
            &settings,
        )
    }

    #[test]
    fn test_build_args_mp3() {
        let args = args_for(AudioFormat::Mp3, 4);
        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/work/video_1.mp4",
                "-vn",
                "-acodec",
                "libmp3lame",
                "-q:a",
                "4",
                "-loglevel",
                "error",
                "/work/video_1_audio.out"
            ]
        );
    }

    #[test]
    fn test_build_args_m4a_bitrate() {
        let args = args_for(AudioFormat::M4a, 3);
        assert!(args.contains(&"aac".to_string()));
        let pos = args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(args[pos + 1], "224k");
    }

    #[test]
    fn test_build_args_flac() {
        let args = args_for(AudioFormat::Flac, 8);
        assert!(args.contains(&"flac".to_string()));
        let pos = args.iter().position(|a| a == "-compression_level").unwrap();
        assert_eq!(args[pos + 1], "8");
        // Should not have bitrate for lossless
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_build_args_wav() {
        let args = args_for(AudioFormat::Wav, 1);
        assert!(args.contains(&"pcm_s16le".to_string()));
        assert!(args.contains(&"1411k".to_string()));
    }

    #[test]
    fn test_build_args_extra_args_before_output() {
        let config = TranscoderConfig {
            extra_args: vec!["-ar".to_string(), "44100".to_string()],
            ..Default::default()
        };
        let transcoder = FfmpegTranscoder::new(config);
        let settings = EncodeSettings::for_format(AudioFormat::Mp3, 0);
        let args = transcoder.build_args(Path::new("in.mp4"), Path::new("out.mp3"), &settings);
        let n = args.len();
        assert_eq!(args[n - 3..], ["-ar", "44100", "out.mp3"]);
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_reported() {
        let transcoder =
            FfmpegTranscoder::new(TranscoderConfig::with_path(PathBuf::from("/nonexistent/ffmpeg")));
        let job = EncodeJob {
            input: PathBuf::from("/nonexistent/in.mp4"),
            output_dir: std::env::temp_dir(),
            format: AudioFormat::Mp3,
            quality: 4,
            base_name: "never".to_string(),
        };
        let err = transcoder.encode_audio(job).await.unwrap_err();
        assert!(matches!(err, ToolError::BinaryNotFound { tool: "ffmpeg", .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_output_does_not_fall_back_to_input() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        // Exits cleanly without writing anything
        let ffmpeg = dir.path().join("ffmpeg");
        std::fs::write(&ffmpeg, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&ffmpeg, std::fs::Permissions::from_mode(0o755)).unwrap();

        let work = dir.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let input = work.join("video_ab12.mp4");
        std::fs::write(&input, b"video").unwrap();

        let transcoder = FfmpegTranscoder::new(TranscoderConfig::with_path(ffmpeg));
        let job = EncodeJob {
            input,
            output_dir: work,
            format: AudioFormat::Mp3,
            quality: 4,
            base_name: "video".to_string(),
        };
        let err = transcoder.encode_audio(job).await.unwrap_err();
        assert!(matches!(err, ToolError::OutputNotFound { .. }));
    }
}

//! Common test utilities for end-to-end API tests.
//!
//! The fixture builds the real router and pipeline in-process, with small
//! shell scripts standing in for the downloader and ffmpeg. Each script
//! appends its arguments to `<bin>/<name>.calls` so tests can assert which
//! tools ran and how.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vid2audio_core::{
    CommandDownloader, Config, ConversionPipeline, DownloaderConfig, DownloaderFlavor,
    FfmpegTranscoder, ProgressStore, TranscoderConfig, Workspace,
};
use vid2audio_server::{api::create_router, state::AppState};

/// you-get stand-in: writes `<dir>/<base>.mp4` containing the URL.
pub const DOWNLOADER_OK: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/downloader.calls"
while [ $# -gt 0 ]; do
  case "$1" in
    -o) dir="$2"; shift 2 ;;
    -O) base="$2"; shift 2 ;;
    *) url="$1"; shift ;;
  esac
done
printf 'video from %s' "$url" > "$dir/$base.mp4"
"#;

/// you-get stand-in that takes a while before writing its file.
pub const DOWNLOADER_SLOW: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/downloader.calls"
while [ $# -gt 0 ]; do
  case "$1" in
    -o) dir="$2"; shift 2 ;;
    -O) base="$2"; shift 2 ;;
    *) url="$1"; shift ;;
  esac
done
sleep 1
printf 'video from %s' "$url" > "$dir/$base.mp4"
"#;

/// you-get stand-in that refuses the URL.
pub const DOWNLOADER_GEOBLOCKED: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/downloader.calls"
echo "geoblocked" >&2
exit 1
"#;

/// ffmpeg stand-in: writes its last argument.
pub const FFMPEG_OK: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/ffmpeg.calls"
for last; do :; done
printf 'audio' > "$last"
"#;

/// ffmpeg stand-in that rejects its input.
pub const FFMPEG_BROKEN: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/ffmpeg.calls"
echo "Invalid data found when processing input" >&2
exit 1
"#;

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub downloader_script: &'static str,
    pub ffmpeg_script: &'static str,
    pub reset_on_new_task: bool,
    /// Contents of `static/index.html`, if any.
    pub index_html: Option<&'static str>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            downloader_script: DOWNLOADER_OK,
            ffmpeg_script: FFMPEG_OK,
            reset_on_new_task: false,
            index_html: None,
        }
    }
}

/// Test fixture with the real router and stubbed tools.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Directory holding the stub tools and their call logs
    pub bin_dir: PathBuf,
    /// Workspace root
    pub workspace_root: PathBuf,
    /// Temporary directory for everything above
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Vec<u8>,
}

impl TestFixture {
    /// Create a new test fixture with working tools.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let bin_dir = temp_dir.path().join("bin");
        std::fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");
        let downloader_path = write_script(&bin_dir, "you-get", test_config.downloader_script);
        let ffmpeg_path = write_script(&bin_dir, "ffmpeg", test_config.ffmpeg_script);

        let static_dir = temp_dir.path().join("static");
        if let Some(html) = test_config.index_html {
            std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");
            std::fs::write(static_dir.join("index.html"), html).expect("Failed to write index");
        }

        let workspace_root = temp_dir.path().join("tmp");

        let mut config = Config::default();
        config.server.static_dir = static_dir;
        config.workspace.root = workspace_root.clone();
        config.workspace.reset_on_new_task = test_config.reset_on_new_task;
        config.downloader = DownloaderConfig::with_path(DownloaderFlavor::YouGet, downloader_path)
            .with_timeout(30);
        config.transcoder = TranscoderConfig::with_path(ffmpeg_path).with_timeout(30);

        let workspace = Workspace::open(&workspace_root)
            .await
            .expect("Failed to open workspace");
        let pipeline = ConversionPipeline::new(
            workspace,
            ProgressStore::new(),
            Arc::new(CommandDownloader::new(config.downloader.clone())),
            Arc::new(FfmpegTranscoder::new(config.transcoder.clone())),
        )
        .with_workspace_config(&config.workspace);

        let state = Arc::new(AppState::new(config, Arc::new(pipeline)));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            bin_dir,
            workspace_root,
            temp_dir,
        }
    }

    /// Argument lines the named stub tool was called with.
    pub fn calls(&self, tool: &str) -> Vec<String> {
        std::fs::read_to_string(self.bin_dir.join(format!("{}.calls", tool)))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Sorted names in the workspace root.
    pub fn workspace_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.workspace_root)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &serde_json::to_string(&body).unwrap())
            .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.post_with_content_type(path, body, "application/json")
            .await
    }

    /// Send a POST request with custom content type.
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write stub script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make stub executable");
    path
}

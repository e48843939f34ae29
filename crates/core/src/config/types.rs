use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

pub use crate::tools::{DownloaderConfig, DownloaderFlavor, TranscoderConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the page shell (`index.html`) and its assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Scratch workspace configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Root directory for downloaded and encoded files.
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
    /// Purge the whole workspace before every conversion.
    ///
    /// Forces conversions to run one at a time.
    #[serde(default)]
    pub reset_on_new_task: bool,
    /// Maximum number of conversions running at once.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            reset_on_new_task: false,
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_max_concurrent_tasks() -> usize {
    4
}

/// Retention of finished progress records and published files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Seconds a finished progress record is kept after its last update.
    #[serde(default = "default_progress_ttl")]
    pub progress_ttl_secs: u64,
    /// Seconds a published file is kept after it was written.
    #[serde(default = "default_file_ttl")]
    pub file_ttl_secs: u64,
    /// Seconds between sweeper runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            progress_ttl_secs: default_progress_ttl(),
            file_ttl_secs: default_file_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_progress_ttl() -> u64 {
    1800
}

fn default_file_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

/// Logging output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

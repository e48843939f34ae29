use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vid2audio_core::{
    load_config, load_config_or_default, validate_config, CommandDownloader, Config,
    ConversionPipeline, Downloader, FfmpegTranscoder, ProgressStore, Transcoder, Workspace,
};
use vid2audio_server::{api::create_router, state::AppState, sweeper::RetentionSweeper};

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "VID2AUDIO_CONFIG";

/// Config file used when `VID2AUDIO_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load configuration before logging so the log format can be configured
    let config = load_configuration()?;
    init_logging(&config);

    info!(
        workspace = %config.workspace.root.display(),
        downloader = ?config.downloader.flavor,
        reset_on_new_task = config.workspace.reset_on_new_task,
        "Configuration loaded"
    );

    // Prepare the workspace
    let workspace = Workspace::open(&config.workspace.root)
        .await
        .with_context(|| format!("Failed to open workspace {:?}", config.workspace.root))?;
    let removed = workspace
        .reset()
        .await
        .context("Failed to clean workspace")?;
    info!(removed, "Workspace ready");

    // External tools
    let downloader = Arc::new(CommandDownloader::new(config.downloader.clone()));
    if let Err(e) = downloader.validate().await {
        warn!(error = %e, "Downloader unavailable; conversions will fail until it is installed");
    }
    let transcoder = Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    if let Err(e) = transcoder.validate().await {
        warn!(error = %e, "Transcoder unavailable; conversions will fail until it is installed");
    }

    let progress = ProgressStore::new();
    let pipeline = Arc::new(
        ConversionPipeline::new(workspace.clone(), progress.clone(), downloader, transcoder)
            .with_workspace_config(&config.workspace),
    );

    // Retention
    let sweeper = RetentionSweeper::new(progress, workspace, config.retention.clone());
    sweeper.start().await;

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, pipeline));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    sweeper.stop().await;

    Ok(())
}

/// Reads the config file named by `VID2AUDIO_CONFIG`, or `config.toml`.
///
/// An explicitly named file must exist; the default file is optional.
fn load_configuration() -> Result<Config> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let path = PathBuf::from(path);
            load_config(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
        Err(_) => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            load_config_or_default(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

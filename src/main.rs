use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipshare::{
    create_router, AnalyticsStore, AppState, Artifact, Config, TrimRequest, Trimmer, VideoStore,
};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "clipshare", version, about = "Share and trim screen recordings")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/clipshare")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the upload / playback / analytics server (default)
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Cut a local recording to a time range
    Trim {
        input: PathBuf,
        /// Start time in seconds
        #[arg(long)]
        start: f64,
        /// End time in seconds
        #[arg(long)]
        end: f64,
        /// Source duration in seconds (probed with ffprobe when omitted)
        #[arg(long)]
        duration: Option<f64>,
        /// Output path (default: <input>-trimmed.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;

    info!("Loaded config: {}", cfg.service.name);

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                cfg.service.http.port = port;
            }
            serve(cfg).await
        }
        Command::Trim {
            input,
            start,
            end,
            duration,
            output,
        } => trim(cfg, input, start, end, duration, output).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let videos = VideoStore::init(cfg.storage.videos_dir())
        .await
        .context("Failed to open video store")?;
    let analytics = AnalyticsStore::new(cfg.storage.analytics_file());

    info!("Analytics file: {}", analytics.path().display());

    let state = AppState::new(
        videos,
        analytics,
        cfg.service.http.public_url.clone(),
        cfg.service.http.max_upload_bytes,
    );
    let router = create_router(state);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn trim(
    cfg: Config,
    input: PathBuf,
    start: f64,
    end: f64,
    duration: Option<f64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let engine = cfg.trim.engine();

    let duration = match duration {
        Some(d) => d,
        None => engine
            .probe_duration(&input)
            .await
            .context("Failed to determine video duration; pass --duration")?,
    };

    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    let source = Artifact::new(bytes, mime_for_path(&input));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling trim");
            on_interrupt.cancel();
        }
    });

    let trimmer = Trimmer::new(engine, cfg.trim.reencode_settings());
    let clip = trimmer
        .trim(&source, TrimRequest::new(start, end, duration), &cancel)
        .await?;

    let output = output.unwrap_or_else(|| default_output(&input, clip.artifact.extension()));
    tokio::fs::write(&output, clip.artifact.bytes())
        .await
        .with_context(|| format!("Failed to write {:?}", output))?;

    info!(
        "Wrote {:.2}s clip ({} bytes, {}) to {}",
        clip.range.duration(),
        clip.artifact.len(),
        clip.strategy.as_str(),
        output.display()
    );

    Ok(())
}

fn mime_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        _ => "video/webm",
    }
}

fn default_output(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording");
    input.with_file_name(format!("{}-trimmed.{}", stem, extension))
}

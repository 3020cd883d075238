use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::recording::SessionConfig;
use crate::trim::{FfmpegEngine, ReencodeSettings};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub recording: RecordingConfig,
    pub trim: TrimConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Base of share links handed back on upload
    pub public_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

/// Settings for an embedded `RecordingSession`.
///
/// Library-facing: the `serve` / `trim` binary never records, so only hosts that
/// build a session read this section (via `session_config`).
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingConfig {
    pub mime_type: String,
    pub timeslice_ms: u64,
    pub flush_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrimConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub video_codec: String,
    pub video_bitrate: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Config {
    /// Load `path` (any format the `config` crate understands, extension optional)
    /// over built-in defaults, then apply `CLIPSHARE`-prefixed environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "clipshare")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3000_i64)?
            .set_default("service.http.public_url", "http://localhost:3000")?
            .set_default("service.http.max_upload_bytes", 500_i64 * 1024 * 1024)?
            .set_default("storage.data_dir", "./data")?
            .set_default("recording.mime_type", "video/webm")?
            .set_default("recording.timeslice_ms", 1000_i64)?
            .set_default("recording.flush_timeout_ms", 5000_i64)?
            .set_default("trim.ffmpeg_path", "ffmpeg")?
            .set_default("trim.ffprobe_path", "ffprobe")?
            .set_default("trim.video_codec", "libvpx")?
            .set_default("trim.video_bitrate", "2M")?
            .set_default("trim.audio_codec", "libopus")?
            .set_default("trim.audio_bitrate", "128k")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CLIPSHARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}

impl StorageConfig {
    /// Data directory with `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).into_owned())
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.data_dir().join("videos")
    }

    pub fn analytics_file(&self) -> PathBuf {
        self.data_dir().join("analytics.json")
    }
}

impl RecordingConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            mime_type: self.mime_type.clone(),
            timeslice: Duration::from_millis(self.timeslice_ms),
            flush_timeout: Duration::from_millis(self.flush_timeout_ms),
        }
    }
}

impl TrimConfig {
    pub fn engine(&self) -> FfmpegEngine {
        FfmpegEngine::new(&self.ffmpeg_path, &self.ffprobe_path)
    }

    pub fn reencode_settings(&self) -> ReencodeSettings {
        ReencodeSettings {
            video_codec: self.video_codec.clone(),
            video_bitrate: self.video_bitrate.clone(),
            audio_codec: self.audio_codec.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
        }
    }
}

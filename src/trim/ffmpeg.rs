//! FFmpeg-backed media engine
//!
//! Each call gets its own temporary directory; inputs and outputs are plain
//! files inside it and ffmpeg runs with that directory as its working dir.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::engine::MediaEngine;
use crate::error::EngineError;

/// Workspace for one trim call
#[derive(Debug)]
pub struct FfmpegWorkspace {
    dir: TempDir,
}

impl FfmpegWorkspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn file(&self, name: &str) -> Result<PathBuf, EngineError> {
        // Only bare file names; nothing may escape the workspace
        if name.is_empty() || Path::new(name).file_name() != Some(OsStr::new(name)) {
            return Err(EngineError::Execution(format!(
                "invalid workspace file name: {:?}",
                name
            )));
        }
        Ok(self.dir.path().join(name))
    }
}

/// Media engine that shells out to the `ffmpeg` / `ffprobe` binaries
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Container duration of a media file in seconds
    pub async fn probe_duration(&self, path: &Path) -> Result<f64, EngineError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::Init(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Execution(format!(
                "ffprobe failed: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.trim().parse::<f64>().map_err(|_| {
            EngineError::Execution(format!("Unexpected ffprobe output: {}", stdout.trim()))
        })
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait::async_trait]
impl MediaEngine for FfmpegEngine {
    type Handle = FfmpegWorkspace;

    async fn load(&self) -> Result<FfmpegWorkspace, EngineError> {
        let status = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                EngineError::Init(format!("ffmpeg not found at {:?}: {}", self.ffmpeg_path, e))
            })?;

        if !status.success() {
            return Err(EngineError::Init(format!(
                "ffmpeg at {:?} exited with {}",
                self.ffmpeg_path, status
            )));
        }

        let dir = tempfile::Builder::new()
            .prefix("clipshare-trim-")
            .tempdir()
            .map_err(|e| EngineError::Init(format!("Failed to create workspace: {}", e)))?;

        debug!("Created ffmpeg workspace {}", dir.path().display());

        Ok(FfmpegWorkspace { dir })
    }

    async fn write_input(
        &self,
        handle: &FfmpegWorkspace,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), EngineError> {
        let path = handle.file(name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn execute(&self, handle: &FfmpegWorkspace, args: &[String]) -> Result<(), EngineError> {
        debug!("ffmpeg {}", args.join(" "));

        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(args)
            .current_dir(handle.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let message = tail.into_iter().rev().collect::<Vec<_>>().join("\n");

            return Err(EngineError::Execution(format!(
                "ffmpeg exited with {}: {}",
                output.status, message
            )));
        }

        Ok(())
    }

    async fn read_output(
        &self,
        handle: &FfmpegWorkspace,
        name: &str,
    ) -> Result<Vec<u8>, EngineError> {
        let path = handle.file(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            // ffmpeg can succeed without writing anything for an empty range
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn cleanup(&self, handle: FfmpegWorkspace) {
        let path = handle.path().to_path_buf();
        match handle.dir.close() {
            Ok(()) => info!("Cleaned up ffmpeg workspace {}", path.display()),
            Err(e) => warn!("Failed to remove ffmpeg workspace {}: {}", path.display(), e),
        }
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

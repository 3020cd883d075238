use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::engine::MediaEngine;
use super::request::{TrimRange, TrimRequest};
use crate::error::{EngineError, TrimError};
use crate::recording::Artifact;

/// How a clip was extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimStrategy {
    /// Lossless stream copy, no re-encoding
    StreamCopy,
    /// Full re-encode with the fixed target codecs
    ReEncode,
}

impl TrimStrategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StreamCopy => "copy",
            Self::ReEncode => "reencode",
        }
    }
}

/// Target codecs and bitrates for the re-encode fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReencodeSettings {
    pub video_codec: String,
    pub video_bitrate: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for ReencodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libvpx".to_string(),
            video_bitrate: "2M".to_string(),
            audio_codec: "libopus".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

/// A successfully trimmed clip
#[derive(Debug, Clone)]
pub struct TrimmedClip {
    pub artifact: Artifact,
    pub strategy: TrimStrategy,
    pub range: TrimRange,
}

/// Owns a loaded engine handle until it has been cleaned up.
///
/// If the trim future is dropped before `release`, cleanup is handed to the
/// current runtime instead of being skipped.
struct WorkspaceGuard<E: MediaEngine + 'static> {
    engine: Arc<E>,
    handle: Option<E::Handle>,
}

impl<E: MediaEngine + 'static> WorkspaceGuard<E> {
    fn new(engine: Arc<E>, handle: E::Handle) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    fn handle(&self) -> Result<&E::Handle, EngineError> {
        self.handle
            .as_ref()
            .ok_or_else(|| EngineError::Init("engine workspace already released".to_string()))
    }

    async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.cleanup(handle).await;
        }
    }
}

impl<E: MediaEngine + 'static> Drop for WorkspaceGuard<E> {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!("Trim abandoned; scheduling {} cleanup", self.engine.name());
                let engine = Arc::clone(&self.engine);
                runtime.spawn(async move { engine.cleanup(handle).await });
            }
            Err(_) => warn!(
                "No runtime to clean up {} workspace; dropping it",
                self.engine.name()
            ),
        }
    }
}

/// Validates trim requests and drives the media engine.
///
/// Stream copy is tried first; if the engine rejects it (typically keyframe
/// alignment) or yields nothing, the same range is re-encoded. The engine
/// workspace is cleaned up on every path once it has been loaded, including
/// when the `trim` future is dropped mid-call.
pub struct Trimmer<E: MediaEngine + 'static> {
    engine: Arc<E>,
    settings: ReencodeSettings,
}

impl<E: MediaEngine + 'static> Trimmer<E> {
    pub fn new(engine: E, settings: ReencodeSettings) -> Self {
        Self {
            engine: Arc::new(engine),
            settings,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Extract `request`'s range from `source` into a new artifact.
    ///
    /// Validation happens before any engine resource is allocated. The source
    /// artifact is never modified.
    pub async fn trim(
        &self,
        source: &Artifact,
        request: TrimRequest,
        cancel: &CancellationToken,
    ) -> Result<TrimmedClip, TrimError> {
        let range = request.validate()?;

        info!(
            "Trimming {} bytes to {:.2}s - {:.2}s via {}",
            source.len(),
            range.start(),
            range.end(),
            self.engine.name()
        );

        let handle = self.engine.load().await?;
        let workspace = WorkspaceGuard::new(Arc::clone(&self.engine), handle);
        let result = match workspace.handle() {
            Ok(handle) => self.run(handle, source, range, cancel).await,
            Err(e) => Err(e),
        };
        workspace.release().await;

        let (bytes, strategy) = result?;

        info!(
            "Trim complete: {} bytes ({})",
            bytes.len(),
            strategy.as_str()
        );

        Ok(TrimmedClip {
            artifact: Artifact::new(bytes, source.mime_type()),
            strategy,
            range,
        })
    }

    async fn run(
        &self,
        handle: &E::Handle,
        source: &Artifact,
        range: TrimRange,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, TrimStrategy), EngineError> {
        let extension = source.extension();
        let input = format!("input.{}", extension);

        self.engine.write_input(handle, &input, source.bytes()).await?;

        match self
            .attempt(handle, &input, extension, range, TrimStrategy::StreamCopy, cancel)
            .await
        {
            Ok(bytes) => return Ok((bytes, TrimStrategy::StreamCopy)),
            Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
            Err(e) => warn!("Stream copy trim failed, re-encoding instead: {}", e),
        }

        let bytes = self
            .attempt(handle, &input, extension, range, TrimStrategy::ReEncode, cancel)
            .await?;

        Ok((bytes, TrimStrategy::ReEncode))
    }

    async fn attempt(
        &self,
        handle: &E::Handle,
        input: &str,
        extension: &str,
        range: TrimRange,
        strategy: TrimStrategy,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, EngineError> {
        let output = format!("output-{}.{}", strategy.as_str(), extension);
        let args = self.build_args(input, &output, range, strategy);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            result = self.engine.execute(handle, &args) => result?,
        }

        let bytes = self.engine.read_output(handle, &output).await?;
        if bytes.is_empty() {
            return Err(EngineError::EmptyOutput);
        }

        Ok(bytes)
    }

    fn build_args(
        &self,
        input: &str,
        output: &str,
        range: TrimRange,
        strategy: TrimStrategy,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-i".into(),
            input.into(),
            "-ss".into(),
            format!("{:.3}", range.start()),
            "-to".into(),
            format!("{:.3}", range.end()),
        ];

        match strategy {
            TrimStrategy::StreamCopy => {
                args.extend(["-c".into(), "copy".into()]);
            }
            TrimStrategy::ReEncode => {
                let s = &self.settings;
                args.extend([
                    "-c:v".into(),
                    s.video_codec.clone(),
                    "-b:v".into(),
                    s.video_bitrate.clone(),
                    "-c:a".into(),
                    s.audio_codec.clone(),
                    "-b:a".into(),
                    s.audio_bitrate.clone(),
                ]);
            }
        }

        args.push(output.into());
        args
    }
}

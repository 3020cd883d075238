use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Finalized binary media object produced by a recording or a trim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Vec<u8>,
    mime_type: String,
    created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            created_at: Utc::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension for the container (`video/webm;codecs=vp9` -> `webm`)
    pub fn extension(&self) -> &str {
        extension_for(&self.mime_type)
    }

    /// Default download name, e.g. `recording-2025-03-01T10-15-00Z.webm`
    pub fn suggested_file_name(&self) -> String {
        format!(
            "recording-{}.{}",
            self.created_at.format("%Y-%m-%dT%H-%M-%SZ"),
            self.extension()
        )
    }

    /// Write the artifact into `dir` under its suggested name
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).context("Failed to create download directory")?;

        let path = dir.join(self.suggested_file_name());
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("Failed to write recording: {:?}", path))?;

        info!("Saved recording ({} bytes) to {}", self.bytes.len(), path.display());
        Ok(path)
    }
}

fn extension_for(mime_type: &str) -> &str {
    let container = mime_type.split(';').next().unwrap_or_default().trim();
    match container {
        "video/mp4" => "mp4",
        "video/x-matroska" => "mkv",
        "video/quicktime" => "mov",
        _ => "webm",
    }
}

/// Collects encoded segments in arrival order and assembles the artifact.
#[derive(Debug)]
pub struct SegmentAccumulator {
    mime_type: String,
    segments: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl SegmentAccumulator {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            segments: Vec::new(),
            total_bytes: 0,
        }
    }

    /// Append a segment. Zero-length segments are dropped and `false` is returned.
    pub fn append(&mut self, segment: Vec<u8>) -> bool {
        if segment.is_empty() {
            debug!("Dropping empty segment");
            return false;
        }

        self.total_bytes += segment.len();
        self.segments.push(segment);
        true
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Concatenate all segments in append order and clear the buffer.
    ///
    /// A second call without new appends yields an empty artifact.
    pub fn finalize(&mut self) -> Artifact {
        let mut bytes = Vec::with_capacity(self.total_bytes);
        for segment in self.segments.drain(..) {
            bytes.extend_from_slice(&segment);
        }
        self.total_bytes = 0;

        Artifact::new(bytes, self.mime_type.clone())
    }

    /// Discard everything collected so far
    pub fn clear(&mut self) {
        self.segments.clear();
        self.total_bytes = 0;
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StorageError;

/// Progress at or above which a watch session counts as completed
pub const COMPLETION_THRESHOLD: f64 = 0.95;

/// Persisted analytics for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub watch_completions: u64,
    /// Latest progress (0..=1) per watch session
    #[serde(default, deserialize_with = "numeric_entries")]
    pub watch_progress: BTreeMap<String, f64>,
    /// Sessions that have already been counted as completions
    #[serde(default)]
    pub completed_sessions: BTreeSet<String>,
}

/// Older files mixed completion flags into the progress map; keep numbers only.
fn numeric_entries<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(session, value)| value.as_f64().map(|p| (session, p)))
        .collect())
}

impl VideoRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            view_count: 0,
            watch_completions: 0,
            watch_progress: BTreeMap::new(),
            completed_sessions: BTreeSet::new(),
        }
    }

    /// Store `progress` for `session_id`. Returns `true` if this update completed the session.
    ///
    /// A session is counted at most once, however often it crosses the threshold.
    pub fn record_progress(&mut self, session_id: &str, progress: f64) -> bool {
        let previous = self
            .watch_progress
            .insert(session_id.to_string(), progress)
            .unwrap_or(0.0);

        let crossed = previous < COMPLETION_THRESHOLD && progress >= COMPLETION_THRESHOLD;
        if crossed && self.completed_sessions.insert(session_id.to_string()) {
            self.watch_completions += 1;
            return true;
        }

        false
    }

    /// Mean of the per-session progress values, 0 when nobody has watched
    pub fn average_watch_progress(&self) -> f64 {
        if self.watch_progress.is_empty() {
            return 0.0;
        }
        self.watch_progress.values().sum::<f64>() / self.watch_progress.len() as f64
    }

    pub fn summary(&self) -> AnalyticsSummary {
        AnalyticsSummary {
            video_id: self.id.clone(),
            view_count: self.view_count,
            watch_completions: self.watch_completions,
            average_watch_progress: self.average_watch_progress(),
            created_at: self.created_at,
        }
    }
}

/// Public analytics view of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub video_id: String,
    pub view_count: u64,
    pub watch_completions: u64,
    pub average_watch_progress: f64,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a progress update
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub record: VideoRecord,
    pub completed_now: bool,
}

type Records = BTreeMap<String, VideoRecord>;

/// JSON-file analytics store.
///
/// Every mutation reads the whole file, changes one record and writes the whole
/// file back. The mutex serialises mutations within the process; there is no
/// cross-process locking.
#[derive(Debug)]
pub struct AnalyticsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AnalyticsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a record for a freshly uploaded video (no-op if it exists)
    pub async fn register(&self, video_id: &str) -> Result<VideoRecord, StorageError> {
        self.update(video_id, |_| ()).await.map(|(record, _)| record)
    }

    /// Increment the view counter, creating the record if absent
    pub async fn record_view(&self, video_id: &str) -> Result<VideoRecord, StorageError> {
        let (record, _) = self
            .update(video_id, |record| record.view_count += 1)
            .await?;

        debug!("View recorded for {} (total {})", video_id, record.view_count);
        Ok(record)
    }

    /// Upsert a session's watch progress, creating the record if absent
    pub async fn record_progress(
        &self,
        video_id: &str,
        session_id: &str,
        progress: f64,
    ) -> Result<ProgressUpdate, StorageError> {
        let (record, completed_now) = self
            .update(video_id, |record| record.record_progress(session_id, progress))
            .await?;

        if completed_now {
            info!("Watch session {} completed video {}", session_id, video_id);
        }

        Ok(ProgressUpdate {
            record,
            completed_now,
        })
    }

    pub async fn get(&self, video_id: &str) -> Result<Option<VideoRecord>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        Ok(records.remove(video_id))
    }

    pub async fn summary(&self, video_id: &str) -> Result<AnalyticsSummary, StorageError> {
        self.get(video_id)
            .await?
            .map(|record| record.summary())
            .ok_or_else(|| StorageError::NotFound(video_id.to_string()))
    }

    async fn update<T>(
        &self,
        video_id: &str,
        apply: impl FnOnce(&mut VideoRecord) -> T,
    ) -> Result<(VideoRecord, T), StorageError> {
        let _guard = self.lock.lock().await;

        let mut records = self.load().await?;
        let record = records
            .entry(video_id.to_string())
            .or_insert_with(|| VideoRecord::new(video_id));
        let outcome = apply(record);
        let record = record.clone();

        self.save(&records).await?;
        Ok((record, outcome))
    }

    async fn load(&self) -> Result<Records, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Records::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Records::new()),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    async fn save(&self, records: &Records) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;

        Ok(())
    }
}

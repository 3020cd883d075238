use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::track::{MediaTrack, TrackKind};

/// Union of the video track(s) and optional audio track(s) recorded as one source.
///
/// Video tracks always come first. Membership is fixed once built.
#[derive(Debug)]
pub struct CombinedStream {
    id: Uuid,
    tracks: Vec<MediaTrack>,
}

impl CombinedStream {
    pub fn new(video: Vec<MediaTrack>, audio: Vec<MediaTrack>) -> Self {
        let mut tracks = video;
        tracks.extend(audio);

        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_tracks().next().is_some()
    }

    /// Ended signal of the primary video track
    pub fn video_ended(&self) -> Option<watch::Receiver<bool>> {
        self.video_tracks().next().map(MediaTrack::ended)
    }

    /// Whether any track still holds a live device
    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_stopped())
    }

    /// Stop every track, releasing all capture devices
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
        info!("Released {} capture track(s) for stream {}", self.tracks.len(), self.id);
    }
}

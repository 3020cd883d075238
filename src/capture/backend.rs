use tracing::{info, warn};

use super::stream::CombinedStream;
use super::track::{MediaTrack, TrackKind, WeakTrack};
use crate::error::CaptureError;

/// Capture device provider trait
///
/// Implementations wrap the platform's display and microphone pickers.
/// Each request resolves once the user grants or refuses access.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Request a display capture (screen, window or tab)
    async fn request_display(&self) -> Result<Vec<MediaTrack>, CaptureError>;

    /// Request a microphone capture
    async fn request_microphone(&self) -> Result<Vec<MediaTrack>, CaptureError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// What happened to the optional microphone request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioStatus {
    /// Microphone was not asked for
    NotRequested,
    /// Microphone track is part of the stream
    Captured,
    /// Microphone was asked for but refused or missing; recording is video-only
    Unavailable(CaptureError),
}

/// Result of a successful acquisition
#[derive(Debug)]
pub struct Acquisition {
    pub stream: CombinedStream,
    pub audio: AudioStatus,
    /// Microphone track used for mute / unmute
    pub microphone: Option<WeakTrack>,
}

impl Acquisition {
    /// The microphone was requested but the session records video only
    pub fn is_video_only(&self) -> bool {
        matches!(self.audio, AudioStatus::Unavailable(_))
    }
}

/// Acquire the display and, optionally, the microphone, and merge them into one stream.
///
/// Display failure fails the whole acquisition. Microphone failure only degrades it.
pub async fn acquire(
    backend: &dyn CaptureBackend,
    want_microphone: bool,
) -> Result<Acquisition, CaptureError> {
    info!(
        "Acquiring capture via {} (microphone requested: {})",
        backend.name(),
        want_microphone
    );

    let display = backend.request_display().await?;
    if !display.iter().any(|t| t.kind() == TrackKind::Video) {
        return Err(CaptureError::DeviceUnavailable(
            "display capture returned no video track".to_string(),
        ));
    }

    // Display capture may carry system audio alongside the video
    let (video, mut audio): (Vec<_>, Vec<_>) = display
        .into_iter()
        .partition(|t| t.kind() == TrackKind::Video);

    let (audio_status, microphone) = if want_microphone {
        match backend.request_microphone().await {
            Ok(tracks) => {
                let mic: Vec<MediaTrack> = tracks
                    .into_iter()
                    .filter(|t| t.kind() == TrackKind::Audio)
                    .collect();

                match mic.first().map(MediaTrack::downgrade) {
                    Some(weak) => {
                        audio.extend(mic);
                        (AudioStatus::Captured, Some(weak))
                    }
                    None => {
                        warn!("Microphone request returned no audio track; recording video only");
                        (
                            AudioStatus::Unavailable(CaptureError::DeviceUnavailable(
                                "no microphone track".to_string(),
                            )),
                            None,
                        )
                    }
                }
            }
            Err(e) => {
                warn!("Microphone unavailable, recording video only: {}", e);
                (AudioStatus::Unavailable(e), None)
            }
        }
    } else {
        (AudioStatus::NotRequested, None)
    };

    let stream = CombinedStream::new(video, audio);

    info!(
        "Capture acquired: stream {} with {} track(s)",
        stream.id(),
        stream.tracks().len()
    );

    Ok(Acquisition {
        stream,
        audio: audio_status,
        microphone,
    })
}

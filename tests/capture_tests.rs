mod common;

use clipshare::{acquire, AudioStatus, CaptureError, TrackKind};
use common::{DisplayBehavior, MicBehavior, ScriptedCapture};

#[tokio::test]
async fn test_acquire_merges_video_then_audio() -> anyhow::Result<()> {
    let capture = ScriptedCapture::new(DisplayBehavior::GrantWithSystemAudio, MicBehavior::Grant);

    let acquisition = acquire(capture.as_ref(), true).await?;

    let kinds: Vec<TrackKind> = acquisition
        .stream
        .tracks()
        .iter()
        .map(|t| t.kind())
        .collect();
    assert_eq!(kinds, vec![TrackKind::Video, TrackKind::Audio, TrackKind::Audio]);
    assert_eq!(acquisition.audio, AudioStatus::Captured);
    assert!(!acquisition.is_video_only());

    // Mute affects the microphone, never the system audio
    let mic = acquisition.microphone.as_ref().unwrap();
    assert!(mic.set_enabled(false));

    let labels: Vec<(&str, bool)> = acquisition
        .stream
        .audio_tracks()
        .map(|t| (t.label(), t.is_enabled()))
        .collect();
    assert_eq!(
        labels,
        vec![("System Audio", true), ("Built-in Microphone", false)]
    );
    Ok(())
}

#[tokio::test]
async fn test_acquire_without_microphone_request() -> anyhow::Result<()> {
    let capture = ScriptedCapture::granting();

    let acquisition = acquire(capture.as_ref(), false).await?;

    assert_eq!(acquisition.audio, AudioStatus::NotRequested);
    assert!(acquisition.microphone.is_none());
    assert!(!acquisition.stream.has_audio());
    assert_eq!(capture.microphone_requests(), 0);
    Ok(())
}

#[tokio::test]
async fn test_microphone_denial_degrades_to_video_only() -> anyhow::Result<()> {
    let capture = ScriptedCapture::new(DisplayBehavior::Grant, MicBehavior::Deny);

    let acquisition = acquire(capture.as_ref(), true).await?;

    assert!(acquisition.is_video_only());
    assert!(matches!(
        acquisition.audio,
        AudioStatus::Unavailable(CaptureError::PermissionDenied(_))
    ));
    assert_eq!(acquisition.stream.tracks().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_microphone_without_tracks_degrades_to_video_only() -> anyhow::Result<()> {
    let capture = ScriptedCapture::new(DisplayBehavior::Grant, MicBehavior::Empty);

    let acquisition = acquire(capture.as_ref(), true).await?;

    assert!(matches!(
        acquisition.audio,
        AudioStatus::Unavailable(CaptureError::DeviceUnavailable(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_display_failure_skips_microphone() {
    let capture = ScriptedCapture::new(DisplayBehavior::Unavailable, MicBehavior::Grant);

    let err = acquire(capture.as_ref(), true).await.unwrap_err();

    assert_eq!(err, CaptureError::DeviceUnavailable("no display".to_string()));
    assert_eq!(capture.microphone_requests(), 0);
    assert!(capture.devices().is_empty());
}

#[tokio::test]
async fn test_stream_drop_releases_every_track() -> anyhow::Result<()> {
    let capture = ScriptedCapture::granting();

    let acquisition = acquire(capture.as_ref(), true).await?;
    assert_eq!(capture.devices().len(), 2);
    assert!(!capture.all_released());

    drop(acquisition);
    assert!(capture.all_released());
    Ok(())
}

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::encoder::{Encoder, EncoderEvent};
use super::segments::{Artifact, SegmentAccumulator};
use super::state::{SessionPhase, SessionState};
use super::stats::SessionStatus;
use super::timer::ElapsedTimer;
use crate::capture::{acquire, AudioStatus, CaptureBackend, CombinedStream, WeakTrack};
use crate::error::RecordingError;

/// Result of a `start` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Session was not idle; nothing happened
    Ignored,
    /// Recording is running
    Started { audio: AudioStatus },
    /// Acquisition was abandoned through the cancellation token; session is idle again
    Cancelled,
    /// Acquisition or encoder start failed; session is `Failed`
    Failed(RecordingError),
}

/// Something the event pump applied to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A segment was appended
    SegmentReceived { bytes: usize },
    /// The user ended the capture outside the app; the session went through the stop path
    DeviceEnded,
    /// An interrupted stop was resumed and completed
    Stopped,
    /// The encoder failed; the session is `Failed`
    Failed(RecordingError),
}

enum Wake {
    Encoder(Option<EncoderEvent>),
    DeviceEnded,
}

/// A recording session: owns the combined stream while live, drives the encoder,
/// accounts active time, and releases every capture device on each exit path.
///
/// One instance per client context. `start` is only honoured from `Idle`, so a
/// second live session can never be created; call `reset` after a terminal state.
pub struct RecordingSession {
    config: SessionConfig,
    capture: Arc<dyn CaptureBackend>,
    encoder: Box<dyn Encoder>,

    state: SessionState,
    phase_tx: watch::Sender<SessionPhase>,

    /// Present only while Recording / Paused / Stopping
    stream: Option<CombinedStream>,

    /// Microphone track inside `stream`, used only to flip its enabled flag
    microphone: Option<WeakTrack>,
    microphone_requested: bool,
    microphone_enabled: bool,
    microphone_preference: bool,
    video_only: bool,

    segments: SegmentAccumulator,
    timer: ElapsedTimer,
    events: Option<mpsc::Receiver<EncoderEvent>>,
    device_ended: Option<watch::Receiver<bool>>,
    started_at: Option<DateTime<Utc>>,

    /// Set on entering `Stopping`; a resumed flush keeps the original bound
    flush_deadline: Option<Instant>,
    device_initiated_stop: bool,
}

impl RecordingSession {
    pub fn new(
        config: SessionConfig,
        capture: Arc<dyn CaptureBackend>,
        encoder: Box<dyn Encoder>,
    ) -> Self {
        info!(
            "Creating recording session (capture: {}, encoder: {}, {})",
            capture.name(),
            encoder.name(),
            config.mime_type
        );

        let (phase_tx, _) = watch::channel(SessionPhase::Idle);
        let segments = SegmentAccumulator::new(config.mime_type.clone());

        Self {
            config,
            capture,
            encoder,
            state: SessionState::Idle,
            phase_tx,
            stream: None,
            microphone: None,
            microphone_requested: false,
            microphone_enabled: false,
            microphone_preference: true,
            video_only: false,
            segments,
            timer: ElapsedTimer::new(),
            events: None,
            device_ended: None,
            started_at: None,
            flush_deadline: None,
            device_initiated_stop: false,
        }
    }

    /// Acquire capture devices and start encoding.
    ///
    /// Only valid from `Idle`. Cancelling `cancel` while devices are being
    /// requested abandons the acquisition and returns the session to `Idle`.
    pub async fn start(
        &mut self,
        want_microphone: bool,
        cancel: &CancellationToken,
    ) -> StartOutcome {
        let phase = self.phase();
        if phase != SessionPhase::Idle {
            warn!("Ignoring start while session is {}", phase);
            return StartOutcome::Ignored;
        }

        self.microphone_requested = want_microphone;
        self.set_state(SessionState::Acquiring);

        let capture = Arc::clone(&self.capture);
        let acquired = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = acquire(capture.as_ref(), want_microphone) => Some(result),
        };

        let acquisition = match acquired {
            None => {
                info!("Capture acquisition cancelled");
                self.microphone_requested = false;
                self.set_state(SessionState::Idle);
                return StartOutcome::Cancelled;
            }
            Some(Err(e)) => {
                let err = RecordingError::from(e);
                error!("Failed to acquire capture: {}", err);
                self.set_state(SessionState::Failed(err.clone()));
                return StartOutcome::Failed(err);
            }
            Some(Ok(acquisition)) => acquisition,
        };

        let events = match self
            .encoder
            .start(&acquisition.stream, &self.config.encoder_config())
        {
            Ok(events) => events,
            Err(err) => {
                error!("Failed to start encoder: {}", err);
                acquisition.stream.stop_all();
                self.set_state(SessionState::Failed(err.clone()));
                return StartOutcome::Failed(err);
            }
        };

        self.segments.clear();
        self.timer.start();
        self.started_at = Some(Utc::now());
        self.device_ended = acquisition.stream.video_ended();
        self.video_only = acquisition.is_video_only();
        self.microphone_enabled = acquisition
            .microphone
            .as_ref()
            .and_then(WeakTrack::is_enabled)
            .unwrap_or(false);
        self.microphone = acquisition.microphone;
        self.stream = Some(acquisition.stream);
        self.events = Some(events);

        if self.video_only {
            warn!("Microphone unavailable; this session records video only");
        }

        self.set_state(SessionState::Recording);

        StartOutcome::Started {
            audio: acquisition.audio,
        }
    }

    /// `start` with the current microphone preference
    pub async fn start_with_preference(&mut self, cancel: &CancellationToken) -> StartOutcome {
        let want_microphone = self.microphone_preference;
        self.start(want_microphone, cancel).await
    }

    /// Freeze the timer and suspend the encoder. Only valid while recording.
    pub fn pause(&mut self) -> bool {
        if self.phase() != SessionPhase::Recording {
            debug!("Ignoring pause while session is {}", self.phase());
            return false;
        }

        self.encoder.pause();
        self.timer.pause();
        self.set_state(SessionState::Paused);
        true
    }

    /// Continue from the frozen elapsed time. Only valid while paused.
    pub fn resume(&mut self) -> bool {
        if self.phase() != SessionPhase::Paused {
            debug!("Ignoring resume while session is {}", self.phase());
            return false;
        }

        self.encoder.resume();
        self.timer.resume();
        self.set_state(SessionState::Recording);
        true
    }

    /// Flush the encoder, assemble the artifact and release every capture device.
    ///
    /// Valid while recording or paused, and while `Stopping` if an earlier stop
    /// was dropped mid-flush (the flush is picked up again). Returns `false` otherwise.
    pub async fn stop(&mut self) -> bool {
        let phase = self.phase();
        if !phase.is_live() && phase != SessionPhase::Stopping {
            debug!("Ignoring stop while session is {}", phase);
            return false;
        }

        self.finish().await;
        true
    }

    /// Flip the microphone's enabled flag. Returns the resulting flag.
    ///
    /// Silent no-op without a microphone track or outside Recording / Paused.
    pub fn toggle_microphone(&mut self) -> bool {
        if !self.phase().is_live() {
            return self.microphone_enabled;
        }

        let Some(track) = &self.microphone else {
            debug!("No microphone track; toggle ignored");
            return self.microphone_enabled;
        };

        let enabled = !self.microphone_enabled;
        if track.set_enabled(enabled) {
            self.microphone_enabled = enabled;
            info!("Microphone {}", if enabled { "unmuted" } else { "muted" });
        }

        self.microphone_enabled
    }

    /// Return to a fresh `Idle` session, discarding any recording in progress.
    pub fn reset(&mut self) {
        let phase = self.phase();
        if phase.is_live() || phase == SessionPhase::Stopping {
            warn!("Discarding active recording");
            self.encoder.discard();
        }

        self.release_stream();
        self.events = None;
        self.device_ended = None;
        self.timer.reset();
        self.segments.clear();
        self.microphone_requested = false;
        self.microphone_preference = true;
        self.video_only = false;
        self.started_at = None;
        self.flush_deadline = None;
        self.device_initiated_stop = false;

        self.set_state(SessionState::Idle);
    }

    /// Wait for the next encoder event or device-initiated end and apply it.
    ///
    /// Returns `None` when the session holds no live stream. If a previous call
    /// was dropped while the stop path was flushing, the flush is resumed first.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            match self.phase() {
                SessionPhase::Stopping => {
                    self.finish().await;
                    return Some(if self.device_initiated_stop {
                        SessionEvent::DeviceEnded
                    } else {
                        SessionEvent::Stopped
                    });
                }
                phase if !phase.is_live() => return None,
                _ => {}
            }

            let wake = {
                let events = self.events.as_mut()?;
                match self.device_ended.as_mut() {
                    Some(ended) => tokio::select! {
                        biased;
                        _ = ended.wait_for(|done| *done) => Wake::DeviceEnded,
                        event = events.recv() => Wake::Encoder(event),
                    },
                    None => Wake::Encoder(events.recv().await),
                }
            };

            match wake {
                Wake::DeviceEnded => {
                    info!("Display capture ended by the user");
                    self.device_initiated_stop = true;
                    self.finish().await;
                    return Some(SessionEvent::DeviceEnded);
                }
                Wake::Encoder(Some(EncoderEvent::Segment(bytes))) => {
                    let len = bytes.len();
                    if self.segments.append(bytes) {
                        return Some(SessionEvent::SegmentReceived { bytes: len });
                    }
                }
                Wake::Encoder(Some(EncoderEvent::FlushComplete)) => {
                    debug!("Unrequested flush acknowledgement ignored");
                }
                Wake::Encoder(Some(EncoderEvent::Error(message))) => {
                    let err = RecordingError::Encoder(message);
                    self.fail(err.clone());
                    return Some(SessionEvent::Failed(err));
                }
                Wake::Encoder(None) => {
                    let err = RecordingError::Encoder("encoder stopped unexpectedly".to_string());
                    self.fail(err.clone());
                    return Some(SessionEvent::Failed(err));
                }
            }
        }
    }

    /// Subscribe to phase changes
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase_tx.subscribe()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Finalized artifact, once stopped
    pub fn artifact(&self) -> Option<&Artifact> {
        match &self.state {
            SessionState::Stopped(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Failure cause, once failed
    pub fn last_error(&self) -> Option<&RecordingError> {
        match &self.state {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn stream(&self) -> Option<&CombinedStream> {
        self.stream.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    /// Active recording time in whole seconds
    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn microphone_requested(&self) -> bool {
        self.microphone_requested
    }

    pub fn is_microphone_enabled(&self) -> bool {
        self.microphone_enabled
    }

    pub fn has_microphone(&self) -> bool {
        self.microphone.is_some()
    }

    pub fn is_video_only(&self) -> bool {
        self.video_only
    }

    /// Microphone choice for the next recording. The UI owns it (a checkbox
    /// shown while idle); `start_with_preference` feeds it to `start`.
    pub fn microphone_preference(&self) -> bool {
        self.microphone_preference
    }

    /// Only honoured while idle
    pub fn set_microphone_preference(&mut self, enabled: bool) -> bool {
        if self.phase() != SessionPhase::Idle {
            return false;
        }
        self.microphone_preference = enabled;
        true
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase(),
            started_at: self.started_at,
            elapsed_secs: self.timer.elapsed_secs(),
            segments_count: self.segments.len(),
            bytes_recorded: self.segments.total_bytes(),
            artifact_bytes: self.artifact().map(Artifact::len),
            microphone_requested: self.microphone_requested,
            microphone_enabled: self.microphone_enabled,
            video_only: self.video_only,
            error: self.last_error().map(ToString::to_string),
        }
    }

    /// Stop path. Safe to drop at the await: the receiver stays in `self.events`,
    /// so calling it again from `Stopping` resumes draining.
    async fn finish(&mut self) {
        if self.phase() != SessionPhase::Stopping {
            info!("Stopping recording after {}s", self.timer.elapsed_secs());

            self.timer.pause();
            self.device_ended = None;
            self.flush_deadline = Some(Instant::now() + self.config.flush_timeout);
            self.set_state(SessionState::Stopping);
            self.encoder.request_flush();
        } else {
            debug!("Resuming interrupted flush");
        }

        let deadline = self
            .flush_deadline
            .unwrap_or_else(|| Instant::now() + self.config.flush_timeout);
        let timeout_ms = self.config.flush_timeout.as_millis() as u64;

        let flushed = match self.events.as_mut() {
            Some(events) => match tokio::time::timeout_at(
                deadline,
                drain_until_flushed(events, &mut self.segments),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(RecordingError::FlushTimeout(timeout_ms)),
            },
            None => Err(RecordingError::Encoder("encoder channel missing".to_string())),
        };

        self.events = None;
        self.flush_deadline = None;

        // Devices are released whatever the flush outcome
        self.release_stream();

        match flushed {
            Ok(()) => {
                let artifact = self.segments.finalize();
                info!(
                    "Recording finalized: {} bytes ({})",
                    artifact.len(),
                    artifact.mime_type()
                );
                self.set_state(SessionState::Stopped(artifact));
            }
            Err(err) => {
                error!("Recording failed during stop: {}", err);
                self.segments.clear();
                self.set_state(SessionState::Failed(err));
            }
        }
    }

    fn fail(&mut self, err: RecordingError) {
        error!("Recording failed: {}", err);
        self.timer.pause();
        self.events = None;
        self.device_ended = None;
        self.release_stream();
        self.segments.clear();
        self.set_state(SessionState::Failed(err));
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop_all();
        }
        self.microphone = None;
        self.microphone_enabled = false;
    }

    fn set_state(&mut self, state: SessionState) {
        let from = self.state.phase();
        let to = state.phase();
        if from != to {
            info!("Recording session: {} -> {}", from, to);
        }
        self.state = state;
        self.phase_tx.send_replace(to);
    }
}

async fn drain_until_flushed(
    events: &mut mpsc::Receiver<EncoderEvent>,
    segments: &mut SegmentAccumulator,
) -> Result<(), RecordingError> {
    while let Some(event) = events.recv().await {
        match event {
            EncoderEvent::Segment(bytes) => {
                segments.append(bytes);
            }
            EncoderEvent::FlushComplete => return Ok(()),
            EncoderEvent::Error(message) => return Err(RecordingError::Encoder(message)),
        }
    }

    Err(RecordingError::Encoder(
        "encoder closed before acknowledging the flush".to_string(),
    ))
}

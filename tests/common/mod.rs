// Shared test doubles for the capture backend and the encoder.
//
// Both are scripted: tests decide up front how each device request and the
// final flush behave, then drive the session and inspect what was recorded.

#![allow(dead_code)]

use clipshare::{
    CaptureBackend, CaptureError, CombinedStream, DeviceHandle, Encoder, EncoderConfig,
    EncoderEvent, MediaTrack, RecordingError, TrackKind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// ============================================================================
// Capture
// ============================================================================

#[derive(Debug, Clone)]
pub enum DisplayBehavior {
    /// One video track
    Grant,
    /// Video track plus a system-audio track
    GrantWithSystemAudio,
    Deny,
    Unavailable,
    /// Resolves with no tracks at all
    Empty,
    /// Never resolves (picker left open)
    Hang,
}

#[derive(Debug, Clone)]
pub enum MicBehavior {
    Grant,
    Deny,
    Empty,
    Hang,
}

pub struct ScriptedCapture {
    display: DisplayBehavior,
    microphone: MicBehavior,
    devices: Mutex<Vec<DeviceHandle>>,
    display_requests: AtomicUsize,
    microphone_requests: AtomicUsize,
}

impl ScriptedCapture {
    pub fn new(display: DisplayBehavior, microphone: MicBehavior) -> Arc<Self> {
        Arc::new(Self {
            display,
            microphone,
            devices: Mutex::new(Vec::new()),
            display_requests: AtomicUsize::new(0),
            microphone_requests: AtomicUsize::new(0),
        })
    }

    pub fn granting() -> Arc<Self> {
        Self::new(DisplayBehavior::Grant, MicBehavior::Grant)
    }

    /// Every track handed out so far, device side
    pub fn devices(&self) -> Vec<DeviceHandle> {
        self.devices.lock().unwrap().clone()
    }

    pub fn display_device(&self) -> DeviceHandle {
        self.devices()
            .into_iter()
            .find(|d| d.kind() == TrackKind::Video)
            .expect("no display track was granted")
    }

    pub fn microphone_device(&self) -> Option<DeviceHandle> {
        self.devices()
            .into_iter()
            .filter(|d| d.kind() == TrackKind::Audio)
            .last()
    }

    pub fn all_released(&self) -> bool {
        self.devices().iter().all(DeviceHandle::is_stopped)
    }

    pub fn display_requests(&self) -> usize {
        self.display_requests.load(Ordering::SeqCst)
    }

    pub fn microphone_requests(&self) -> usize {
        self.microphone_requests.load(Ordering::SeqCst)
    }

    fn hand_out(&self, kind: TrackKind, label: &str) -> MediaTrack {
        let track = MediaTrack::new(kind, label);
        self.devices.lock().unwrap().push(track.device_handle());
        track
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ScriptedCapture {
    async fn request_display(&self) -> Result<Vec<MediaTrack>, CaptureError> {
        self.display_requests.fetch_add(1, Ordering::SeqCst);

        match self.display {
            DisplayBehavior::Grant => Ok(vec![self.hand_out(TrackKind::Video, "Screen 1")]),
            DisplayBehavior::GrantWithSystemAudio => Ok(vec![
                self.hand_out(TrackKind::Video, "Screen 1"),
                self.hand_out(TrackKind::Audio, "System Audio"),
            ]),
            DisplayBehavior::Deny => Err(CaptureError::PermissionDenied(
                "screen sharing refused".to_string(),
            )),
            DisplayBehavior::Unavailable => Err(CaptureError::DeviceUnavailable(
                "no display".to_string(),
            )),
            DisplayBehavior::Empty => Ok(Vec::new()),
            DisplayBehavior::Hang => std::future::pending().await,
        }
    }

    async fn request_microphone(&self) -> Result<Vec<MediaTrack>, CaptureError> {
        self.microphone_requests.fetch_add(1, Ordering::SeqCst);

        match self.microphone {
            MicBehavior::Grant => Ok(vec![self.hand_out(TrackKind::Audio, "Built-in Microphone")]),
            MicBehavior::Deny => Err(CaptureError::PermissionDenied(
                "microphone refused".to_string(),
            )),
            MicBehavior::Empty => Ok(Vec::new()),
            MicBehavior::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Encoder
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderCall {
    Start { tracks: usize },
    Pause,
    Resume,
    Flush,
    Discard,
}

#[derive(Debug, Clone)]
pub enum FlushBehavior {
    /// Emit the tail segments, then acknowledge
    Complete(Vec<Vec<u8>>),
    /// Report an error instead of acknowledging
    Fail(String),
    /// Never answer
    Silent,
}

/// Test-side handle to a running `ScriptedEncoder`
#[derive(Clone, Default)]
pub struct EncoderHandle {
    tx: Arc<Mutex<Option<mpsc::Sender<EncoderEvent>>>>,
    calls: Arc<Mutex<Vec<EncoderCall>>>,
}

impl EncoderHandle {
    pub fn emit(&self, event: EncoderEvent) {
        let guard = self.tx.lock().unwrap();
        let tx = guard.as_ref().expect("encoder not started");
        tx.try_send(event).expect("encoder channel full or closed");
    }

    pub fn segment(&self, bytes: &[u8]) {
        self.emit(EncoderEvent::Segment(bytes.to_vec()));
    }

    /// Drop the sender, as if the encoder died silently
    pub fn close(&self) {
        self.tx.lock().unwrap().take();
    }

    pub fn calls(&self) -> Vec<EncoderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: EncoderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct ScriptedEncoder {
    encoder_ctl: EncoderHandle,
    flush: FlushBehavior,
    fail_start: bool,
}

impl ScriptedEncoder {
    pub fn new(flush: FlushBehavior) -> (Box<dyn Encoder>, EncoderHandle) {
        let encoder_ctl = EncoderHandle::default();
        let encoder = Self {
            encoder_ctl: encoder_ctl.clone(),
            flush,
            fail_start: false,
        };
        (Box::new(encoder), encoder_ctl)
    }

    pub fn failing_start() -> (Box<dyn Encoder>, EncoderHandle) {
        let encoder_ctl = EncoderHandle::default();
        let encoder = Self {
            encoder_ctl: encoder_ctl.clone(),
            flush: FlushBehavior::Silent,
            fail_start: true,
        };
        (Box::new(encoder), encoder_ctl)
    }
}

impl Encoder for ScriptedEncoder {
    fn start(
        &mut self,
        stream: &CombinedStream,
        _config: &EncoderConfig,
    ) -> Result<mpsc::Receiver<EncoderEvent>, RecordingError> {
        self.encoder_ctl.record(EncoderCall::Start {
            tracks: stream.tracks().len(),
        });

        if self.fail_start {
            return Err(RecordingError::Encoder("unsupported mime type".to_string()));
        }

        let (tx, rx) = mpsc::channel(64);
        *self.encoder_ctl.tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn pause(&mut self) {
        self.encoder_ctl.record(EncoderCall::Pause);
    }

    fn resume(&mut self) {
        self.encoder_ctl.record(EncoderCall::Resume);
    }

    fn request_flush(&mut self) {
        self.encoder_ctl.record(EncoderCall::Flush);

        match self.flush.clone() {
            FlushBehavior::Complete(tail) => {
                for segment in tail {
                    self.encoder_ctl.emit(EncoderEvent::Segment(segment));
                }
                self.encoder_ctl.emit(EncoderEvent::FlushComplete);
            }
            FlushBehavior::Fail(message) => self.encoder_ctl.emit(EncoderEvent::Error(message)),
            FlushBehavior::Silent => {}
        }
    }

    fn discard(&mut self) {
        self.encoder_ctl.record(EncoderCall::Discard);
        self.encoder_ctl.close();
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Display / screen capture
    Video,
    /// Microphone or system audio
    Audio,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

#[derive(Debug)]
struct TrackShared {
    enabled: AtomicBool,
    stopped: AtomicBool,
    /// Flips to `true` when the device side ends the track (e.g. "Stop sharing")
    ended_tx: watch::Sender<bool>,
}

/// A single capture track.
///
/// The owner of a `MediaTrack` owns the underlying device: dropping it stops the track.
#[derive(Debug)]
pub struct MediaTrack {
    id: Uuid,
    kind: TrackKind,
    label: String,
    shared: Arc<TrackShared>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        let (ended_tx, _) = watch::channel(false);

        Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            shared: Arc::new(TrackShared {
                enabled: AtomicBool::new(true),
                stopped: AtomicBool::new(false),
                ended_tx,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    /// Toggle whether the track contributes media. Stream membership is unchanged.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether the device is still delivering media
    pub fn is_live(&self) -> bool {
        !self.shared.stopped.load(Ordering::SeqCst) && !*self.shared.ended_tx.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    /// Release the device. Idempotent.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            debug!("Stopped {} track '{}' ({})", self.kind, self.label, self.id);
        }
    }

    /// Receiver that observes `true` once the device side ends the track
    pub fn ended(&self) -> watch::Receiver<bool> {
        self.shared.ended_tx.subscribe()
    }

    /// Handle given to the capture backend so it can signal a device-initiated end
    pub fn device_handle(&self) -> DeviceHandle {
        DeviceHandle {
            kind: self.kind,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Non-owning reference used to flip the enabled flag
    pub fn downgrade(&self) -> WeakTrack {
        WeakTrack {
            kind: self.kind,
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl Drop for MediaTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Device-side view of a track (what the OS / browser chrome holds)
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    kind: TrackKind,
    shared: Arc<TrackShared>,
}

impl DeviceHandle {
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// The user stopped sharing outside the application
    pub fn end(&self) {
        self.shared.ended_tx.send_replace(true);
    }

    /// Whether the application has released the device
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }
}

/// Weak reference into a stream's tracks
#[derive(Debug, Clone)]
pub struct WeakTrack {
    kind: TrackKind,
    shared: Weak<TrackShared>,
}

impl WeakTrack {
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Current enabled flag, or `None` once the track is gone or stopped
    pub fn is_enabled(&self) -> Option<bool> {
        let shared = self.shared.upgrade()?;
        if shared.stopped.load(Ordering::SeqCst) {
            return None;
        }
        Some(shared.enabled.load(Ordering::SeqCst))
    }

    /// Returns `false` without effect when the track is gone or stopped
    pub fn set_enabled(&self, enabled: bool) -> bool {
        match self.shared.upgrade() {
            Some(shared) if !shared.stopped.load(Ordering::SeqCst) => {
                shared.enabled.store(enabled, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }
}

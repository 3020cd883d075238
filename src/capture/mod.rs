//! Capture acquisition
//!
//! Requests the display capture and the optional microphone, then merges the
//! granted tracks into a single `CombinedStream` owned by the recording session.

pub mod backend;
pub mod stream;
pub mod track;

pub use backend::{acquire, Acquisition, AudioStatus, CaptureBackend};
pub use stream::CombinedStream;
pub use track::{DeviceHandle, MediaTrack, TrackKind, WeakTrack};

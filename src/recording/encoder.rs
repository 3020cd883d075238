use std::time::Duration;
use tokio::sync::mpsc;

use crate::capture::CombinedStream;
use crate::error::RecordingError;

/// Message emitted by an encoder, delivered in emission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// One chunk of encoded output
    Segment(Vec<u8>),
    /// Every segment produced before the flush request has been sent
    FlushComplete,
    /// Asynchronous failure (device lost, codec error, ...)
    Error(String),
}

/// Settings handed to the encoder when a recording starts
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Container / codec string, e.g. `video/webm;codecs=vp9,opus`
    pub mime_type: String,
    /// How often the encoder emits a segment while recording
    pub timeslice: Duration,
}

/// Encoder trait
///
/// The encoder is an external actor: control calls are fire-and-forget signals,
/// and all output (segments, flush acknowledgement, failures) arrives on the
/// channel returned by `start`.
pub trait Encoder: Send {
    /// Begin encoding `stream`
    fn start(
        &mut self,
        stream: &CombinedStream,
        config: &EncoderConfig,
    ) -> Result<mpsc::Receiver<EncoderEvent>, RecordingError>;

    /// Suspend emission
    fn pause(&mut self);

    /// Continue emission after `pause`
    fn resume(&mut self);

    /// Emit any buffered data, then `FlushComplete`
    fn request_flush(&mut self);

    /// Stop without delivering buffered data
    fn discard(&mut self);

    /// Get encoder name for logging
    fn name(&self) -> &str;
}

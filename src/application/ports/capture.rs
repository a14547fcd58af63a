//! Audio capture port interfaces

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::recording::AudioFormat;

/// Capture errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("No usable audio input device: {0}")]
    DeviceUnavailable(String),
}

/// Events emitted by an open capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A new piece of encoded audio, in stream order
    Chunk(Vec<u8>),
    /// The device has been released and no further chunks follow
    Stopped,
}

/// Control side of an open capture
#[async_trait]
pub trait CaptureHandle: Send {
    /// Stop capturing and release the device.
    ///
    /// Pending audio is flushed as a final `Chunk` before `Stopped` is
    /// emitted. Returns once the device has been released.
    async fn stop(&mut self) -> Result<(), CaptureError>;
}

/// An open capture: the event subscription plus its control handle
pub struct CaptureStream {
    pub events: mpsc::UnboundedReceiver<CaptureEvent>,
    pub format: AudioFormat,
    pub handle: Box<dyn CaptureHandle>,
}

/// Port for acquiring the audio input
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Acquire the input device and start emitting chunks.
    ///
    /// Fails with `PermissionDenied` or `DeviceUnavailable`; nothing is held
    /// open on failure.
    async fn open(&self) -> Result<CaptureStream, CaptureError>;
}

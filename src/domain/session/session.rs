//! Recording session state machine

use std::fmt;
use thiserror::Error;

use crate::domain::recording::{AudioBuffer, AudioClip, AudioFormat};

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Uploading,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Uploading => "uploading",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when a command is issued in the wrong state
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// One recording cycle's state plus the audio it owns.
///
/// State machine:
///   IDLE -> RECORDING (begin_recording)
///   RECORDING -> UPLOADING (finish_recording)
///   RECORDING -> IDLE (abort_recording)
///   UPLOADING -> IDLE (complete_upload)
///
/// The buffer exists only while RECORDING; chunks offered in any other
/// state are refused.
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: SessionState,
    buffer: Option<AudioBuffer>,
    format: AudioFormat,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_uploading(&self) -> bool {
        self.state == SessionState::Uploading
    }

    /// Bytes accumulated so far in the current recording
    pub fn buffered_bytes(&self) -> usize {
        self.buffer.as_ref().map_or(0, AudioBuffer::total_bytes)
    }

    /// Transition from IDLE to RECORDING with a fresh, empty buffer
    pub fn begin_recording(&mut self, format: AudioFormat) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Idle, "start recording")?;
        self.buffer = Some(AudioBuffer::new());
        self.format = format;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Append a chunk. Returns false, leaving the session untouched, unless
    /// currently RECORDING.
    pub fn append_chunk(&mut self, chunk: Vec<u8>) -> bool {
        match (self.state, self.buffer.as_mut()) {
            (SessionState::Recording, Some(buffer)) => {
                buffer.push(chunk);
                true
            }
            _ => false,
        }
    }

    /// Transition from RECORDING to UPLOADING, yielding the finalized clip
    pub fn finish_recording(&mut self) -> Result<AudioClip, InvalidStateTransition> {
        self.require(SessionState::Recording, "stop recording")?;
        let buffer = self.buffer.take().unwrap_or_default();
        self.state = SessionState::Uploading;
        Ok(buffer.finalize(self.format))
    }

    /// Transition from RECORDING to IDLE, discarding the buffer
    pub fn abort_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Recording, "cancel recording")?;
        self.buffer = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Transition from UPLOADING to IDLE
    pub fn complete_upload(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Uploading, "complete upload")?;
        self.state = SessionState::Idle;
        Ok(())
    }

    fn require(&self, required: SessionState, action: &str) -> Result<(), InvalidStateTransition> {
        if self.state != required {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        Ok(())
    }
}

//! Domain layer - Core business logic
//!
//! Contains the session state machine, audio value objects, inference
//! results and domain errors. This layer has no dependencies on external
//! systems.

pub mod config;
pub mod error;
pub mod inference;
pub mod recording;
pub mod session;
pub mod status;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use inference::InferenceResult;
pub use recording::{AudioBuffer, AudioClip, AudioFormat, Duration};
pub use session::{InvalidStateTransition, RecordingSession, SessionState};
pub use status::StatusMessage;

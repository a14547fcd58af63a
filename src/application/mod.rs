//! Application layer - Use cases and port interfaces
//!
//! Contains the recording session use case and the trait definitions
//! for external system interactions.

pub mod ports;
pub mod session;

// Re-export use cases
pub use session::{RecordingSessionUseCase, SessionCallbacks, SessionConfig, SessionError};

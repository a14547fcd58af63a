//! Session domain module

#[allow(clippy::module_inception)]
mod session;

pub use session::{InvalidStateTransition, RecordingSession, SessionState};

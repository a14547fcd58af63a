//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod classifier;
pub mod config;

// Re-export common types
pub use capture::{AudioCapture, CaptureError, CaptureEvent, CaptureHandle, CaptureStream};
pub use classifier::{EmotionClassifier, InferenceError, FALLBACK_REJECTION_MESSAGE};
pub use config::ConfigStore;

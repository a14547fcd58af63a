//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: microphone
//! and file capture, the HTTP classifier client and the config file store.

pub mod capture;
pub mod config;
pub mod inference;

// Re-export adapters
pub use capture::{CpalCapture, FileCapture};
pub use config::XdgConfigStore;
pub use inference::HttpEmotionClassifier;

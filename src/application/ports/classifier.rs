//! Emotion inference port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::inference::InferenceResult;
use crate::domain::recording::AudioClip;

/// Message shown when the server rejects a clip without saying why
pub const FALLBACK_REJECTION_MESSAGE: &str = "Unknown error";

/// Inference errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// Server answered with a non-success status
    #[error("{message}")]
    UploadRejected { status: u16, message: String },

    /// No usable response: connection failure, timeout or malformed body
    #[error("{0}")]
    NetworkFailure(String),
}

/// Port for the remote emotion classifier
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Submit one clip and wait for its classification.
    async fn classify(&self, clip: &AudioClip) -> Result<InferenceResult, InferenceError>;
}

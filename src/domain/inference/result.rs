//! Inference result value object

use std::fmt;
use thiserror::Error;

/// Error when the collaborator reports a confidence outside [0, 1]
#[derive(Debug, Clone, Error, PartialEq)]
#[error("confidence {0} is outside the range 0..=1")]
pub struct ConfidenceOutOfRange(pub f64);

/// Emotion label and confidence returned for one clip.
/// Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    emotion: String,
    confidence: f64,
}

impl InferenceResult {
    /// Create a result, validating the confidence
    pub fn new(emotion: impl Into<String>, confidence: f64) -> Result<Self, ConfidenceOutOfRange> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            emotion: emotion.into(),
            confidence,
        })
    }

    pub fn emotion(&self) -> &str {
        &self.emotion
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

impl fmt::Display for InferenceResult {
    /// `happy (87.3%)`, with ties on the tenth rounded away from zero
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = (self.confidence * 1000.0).round() / 10.0;
        write!(f, "{} ({:.1}%)", self.emotion, tenths)
    }
}

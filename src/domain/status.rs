//! User-facing status text

use std::fmt;

use super::inference::InferenceResult;

/// What the status line shows at each point of a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    Ready,
    Recording,
    Uploading { size: String },
    Result(InferenceResult),
    Error(String),
}

impl StatusMessage {
    /// Whether this status ends a cycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result(_) | Self::Error(_))
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready. Press Enter to record"),
            Self::Recording => write!(f, "Recording... press Enter to stop"),
            Self::Uploading { size } => write!(f, "Processing ({})...", size),
            Self::Result(result) => write!(f, "Emotion: {}", result),
            Self::Error(message) => f.write_str(message),
        }
    }
}

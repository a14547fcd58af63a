//! Inference domain module

mod result;

pub use result::{ConfidenceOutOfRange, InferenceResult};

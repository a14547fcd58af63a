//! Emotion inference adapters

mod http;

pub use http::HttpEmotionClassifier;

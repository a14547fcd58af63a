//! Emotion Recorder - record speech and classify its emotion
//!
//! This crate records audio from the microphone (or replays a file), submits
//! the finished clip to a remote inference server and reports the predicted
//! emotion with its confidence.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Session state machine, audio and result value objects, errors
//! - **Application**: The recording session use case and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, file replay, HTTP, config file)
//! - **CLI**: Command-line interface, argument parsing, and the interactive loop

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

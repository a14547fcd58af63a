//! Audio capture adapters

mod cpal_capture;
mod file_capture;
mod wav;

pub use cpal_capture::{CpalCapture, PREFERRED_SAMPLE_RATE};
pub use file_capture::{FileCapture, DEFAULT_CHUNK_SIZE};

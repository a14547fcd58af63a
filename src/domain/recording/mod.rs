//! Recording domain module

mod audio_buffer;
mod clip;
mod duration;

pub use audio_buffer::AudioBuffer;
pub use clip::{AudioClip, AudioFormat};
pub use duration::{
    Duration, DEFAULT_CHUNK_INTERVAL_SECS, DEFAULT_MAX_DURATION_SECS, DEFAULT_UPLOAD_TIMEOUT_SECS,
};

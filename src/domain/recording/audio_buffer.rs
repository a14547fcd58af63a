//! Chunk accumulator for an in-progress recording

use super::clip::{AudioClip, AudioFormat};

/// Ordered sequence of opaque chunks emitted by the capture subsystem.
///
/// Chunks are kept as delivered and only joined once, when the recording
/// is finalized.
#[derive(Debug, Default)]
pub struct AudioBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: usize,
}

impl AudioBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: Vec<u8>) {
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.total_bytes == 0
    }

    /// Concatenate all chunks in arrival order into a clip
    pub fn finalize(self, format: AudioFormat) -> AudioClip {
        let mut bytes = Vec::with_capacity(self.total_bytes);
        for chunk in self.chunks {
            bytes.extend_from_slice(&chunk);
        }
        AudioClip::new(bytes, format)
    }
}

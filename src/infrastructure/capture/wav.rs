//! Streaming WAV framing for microphone chunks
//!
//! The clip is the plain concatenation of emitted chunks, so the RIFF header
//! is written first with unknown-length markers and each later chunk is raw
//! little-endian PCM. Decoders treat the data chunk as running to end of file.

/// Bits per sample (16-bit PCM)
const BITS_PER_SAMPLE: u16 = 16;

/// Size marker for a stream whose length is not known up front
const UNKNOWN_LENGTH: u32 = u32::MAX;

/// Build the 44-byte RIFF/WAVE header for 16-bit PCM of unknown length
pub fn streaming_header(sample_rate: u32, channels: u16) -> Vec<u8> {
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * u32::from(block_align);

    let mut header = Vec::with_capacity(44);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&UNKNOWN_LENGTH.to_le_bytes());
    header.extend_from_slice(b"WAVE");

    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    header.extend_from_slice(&1u16.to_le_bytes()); // PCM
    header.extend_from_slice(&channels.to_le_bytes());
    header.extend_from_slice(&sample_rate.to_le_bytes());
    header.extend_from_slice(&byte_rate.to_le_bytes());
    header.extend_from_slice(&block_align.to_le_bytes());
    header.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    header.extend_from_slice(b"data");
    header.extend_from_slice(&UNKNOWN_LENGTH.to_le_bytes());
    header
}

/// Serialize samples as little-endian PCM
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

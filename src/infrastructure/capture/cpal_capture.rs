//! Microphone capture using cpal
//!
//! The cpal stream is not `Send`, so it lives on a dedicated thread that
//! owns the device for the whole recording. That thread emits one PCM chunk
//! per interval, with the streaming WAV header prepended to the first one,
//! and releases the device when told to stop. Silence from the device
//! produces no chunks at all.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex as StdMutex};
use std::thread;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::{mpsc, oneshot};

use super::wav;
use crate::application::ports::{
    AudioCapture, CaptureError, CaptureEvent, CaptureHandle, CaptureStream,
};
use crate::domain::recording::{AudioFormat, Duration};

/// Preferred sample rate; the classifier works on 16kHz speech
pub const PREFERRED_SAMPLE_RATE: u32 = 16000;

type SampleBuffer = Arc<StdMutex<Vec<i16>>>;

/// Default-input-device capture
pub struct CpalCapture {
    chunk_interval: StdDuration,
}

impl CpalCapture {
    pub fn new(chunk_interval: Duration) -> Self {
        Self {
            chunk_interval: chunk_interval.as_std(),
        }
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()))
    }

    /// Pick an i16/f32 config, preferring fewer channels and 16kHz support
    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let ranges = device
            .supported_input_configs()
            .map_err(|e| classify_backend_error(e.to_string()))?;

        let supports_target = |r: &cpal::SupportedStreamConfigRange| {
            r.min_sample_rate().0 <= PREFERRED_SAMPLE_RATE
                && r.max_sample_rate().0 >= PREFERRED_SAMPLE_RATE
        };

        let best = ranges
            .filter(|r| matches!(r.sample_format(), SampleFormat::I16 | SampleFormat::F32))
            .min_by_key(|r| (!supports_target(r), r.channels()))
            .ok_or_else(|| {
                CaptureError::DeviceUnavailable("no 16-bit or float input format".into())
            })?;

        let sample_rate = if supports_target(&best) {
            SampleRate(PREFERRED_SAMPLE_RATE)
        } else {
            best.min_sample_rate()
        };

        let config = StreamConfig {
            channels: best.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((config, best.sample_format()))
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        format: SampleFormat,
        buffer: SampleBuffer,
    ) -> Result<cpal::Stream, CaptureError> {
        let channels = config.channels;
        let on_error = |err: cpal::StreamError| tracing::error!(error = %err, "audio stream error");

        let stream = match format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend(downmix(data, channels));
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend(downmix(&converted, channels));
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| classify_backend_error(e.to_string()))
    }

    /// Body of the capture thread. Owns the device until `stop_rx` fires or
    /// its sender is dropped.
    fn run(
        interval: StdDuration,
        events: mpsc::UnboundedSender<CaptureEvent>,
        ready: oneshot::Sender<Result<u32, CaptureError>>,
        stop_rx: std_mpsc::Receiver<()>,
        released: oneshot::Sender<()>,
    ) {
        let buffer: SampleBuffer = Arc::new(StdMutex::new(Vec::new()));

        let opened = Self::input_device().and_then(|device| {
            let (config, format) = Self::input_config(&device)?;
            let stream = Self::build_stream(&device, &config, format, Arc::clone(&buffer))?;
            stream
                .play()
                .map_err(|e| classify_backend_error(e.to_string()))?;
            tracing::debug!(
                device = %device.name().unwrap_or_default(),
                sample_rate = config.sample_rate.0,
                channels = config.channels,
                "audio capture started"
            );
            Ok((stream, config.sample_rate.0))
        });

        let (stream, sample_rate) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        let mut header = Some(wav::streaming_header(sample_rate, 1));
        let _ = ready.send(Ok(sample_rate));

        loop {
            match stop_rx.recv_timeout(interval) {
                Err(std_mpsc::RecvTimeoutError::Timeout) => flush(&buffer, &mut header, &events),
                Ok(()) | Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        drop(stream);
        tracing::debug!("audio capture stopped, device released");

        flush(&buffer, &mut header, &events);
        let _ = events.send(CaptureEvent::Stopped);
        let _ = released.send(());
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new(Duration::default_chunk_interval())
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn open(&self) -> Result<CaptureStream, CaptureError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let (released_tx, released_rx) = oneshot::channel();
        let interval = self.chunk_interval;

        thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || Self::run(interval, events_tx, ready_tx, stop_rx, released_tx))
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        let sample_rate = ready_rx.await.map_err(|_| {
            CaptureError::DeviceUnavailable("capture thread exited before start".into())
        })??;
        tracing::info!(sample_rate, "microphone opened");

        Ok(CaptureStream {
            events: events_rx,
            format: AudioFormat::Wav,
            handle: Box::new(CpalCaptureHandle {
                stop_tx: Some(stop_tx),
                released_rx: Some(released_rx),
            }),
        })
    }
}

/// Stops the capture thread. Dropping the handle stops it too.
struct CpalCaptureHandle {
    stop_tx: Option<std_mpsc::Sender<()>>,
    released_rx: Option<oneshot::Receiver<()>>,
}

#[async_trait]
impl CaptureHandle for CpalCaptureHandle {
    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(rx) = self.released_rx.take() {
            // an error means the thread already exited, which also frees the device
            let _ = rx.await;
        }
        Ok(())
    }
}

/// Emit everything captured since the last flush as one chunk.
/// The pending header rides along with the first non-empty chunk.
fn flush(
    buffer: &SampleBuffer,
    header: &mut Option<Vec<u8>>,
    events: &mpsc::UnboundedSender<CaptureEvent>,
) {
    let samples = buffer
        .lock()
        .map(|mut buf| std::mem::take(&mut *buf))
        .unwrap_or_default();
    if samples.is_empty() {
        return;
    }

    let mut chunk = header.take().unwrap_or_default();
    chunk.extend(wav::pcm_bytes(&samples));
    let _ = events.send(CaptureEvent::Chunk(chunk));
}

/// Average interleaved frames down to mono
fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// Map a backend error string onto the capture taxonomy
fn classify_backend_error(message: String) -> CaptureError {
    let lower = message.to_lowercase();
    let denied = ["permission", "denied", "not authorized", "not permitted"]
        .iter()
        .any(|needle| lower.contains(needle));
    if denied {
        CaptureError::PermissionDenied(message)
    } else {
        CaptureError::DeviceUnavailable(message)
    }
}

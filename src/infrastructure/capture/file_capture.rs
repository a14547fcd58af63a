//! Replay a pre-recorded audio file as a capture stream

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::{
    AudioCapture, CaptureError, CaptureEvent, CaptureHandle, CaptureStream,
};
use crate::domain::recording::AudioFormat;

/// Default replay chunk size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Capture source backed by a file on disk.
///
/// Useful without a microphone and for scripted runs. The whole file is read
/// on `open` and emitted as chunks straight away; `stop` only closes the
/// stream.
pub struct FileCapture {
    path: PathBuf,
    chunk_size: usize,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn format(&self) -> Result<AudioFormat, CaptureError> {
        AudioFormat::from_path(&self.path).ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!(
                "unsupported audio file type: {}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl AudioCapture for FileCapture {
    async fn open(&self) -> Result<CaptureStream, CaptureError> {
        let format = self.format()?;
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            let message = format!("{}: {}", self.path.display(), e);
            match e.kind() {
                ErrorKind::PermissionDenied => CaptureError::PermissionDenied(message),
                _ => CaptureError::DeviceUnavailable(message),
            }
        })?;

        tracing::info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            format = %format,
            "replaying audio file"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in bytes.chunks(self.chunk_size) {
            let _ = tx.send(CaptureEvent::Chunk(chunk.to_vec()));
        }

        Ok(CaptureStream {
            events: rx,
            format,
            handle: Box::new(FileCaptureHandle { events: Some(tx) }),
        })
    }
}

struct FileCaptureHandle {
    events: Option<mpsc::UnboundedSender<CaptureEvent>>,
}

#[async_trait]
impl CaptureHandle for FileCaptureHandle {
    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(tx) = self.events.take() {
            let _ = tx.send(CaptureEvent::Stopped);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_audio(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    async fn drain(stream: &mut CaptureStream) -> (Vec<Vec<u8>>, bool) {
        let mut chunks = Vec::new();
        while let Some(event) = stream.events.recv().await {
            match event {
                CaptureEvent::Chunk(c) => chunks.push(c),
                CaptureEvent::Stopped => return (chunks, true),
            }
        }
        (chunks, false)
    }

    #[tokio::test]
    async fn replays_file_in_chunks() {
        let file = temp_audio(".webm", b"0123456789");
        let capture = FileCapture::new(file.path()).with_chunk_size(4);

        let mut stream = capture.open().await.unwrap();
        assert_eq!(stream.format, AudioFormat::Webm);

        stream.handle.stop().await.unwrap();
        let (chunks, stopped) = drain(&mut stream).await;

        assert!(stopped);
        assert_eq!(chunks, vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let file = temp_audio(".wav", b"RIFF");
        let mut stream = FileCapture::new(file.path()).open().await.unwrap();

        stream.handle.stop().await.unwrap();
        stream.handle.stop().await.unwrap();

        let (chunks, stopped) = drain(&mut stream).await;
        assert!(stopped);
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn empty_file_emits_no_chunks() {
        let file = temp_audio(".ogg", b"");
        let mut stream = FileCapture::new(file.path()).open().await.unwrap();
        stream.handle.stop().await.unwrap();

        let (chunks, stopped) = drain(&mut stream).await;
        assert!(stopped);
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let capture = FileCapture::new(dir.path().join("nope.webm"));

        let err = capture.open().await.err().unwrap();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let file = temp_audio(".txt", b"hello");
        let err = FileCapture::new(file.path()).open().await.err().unwrap();

        match err {
            CaptureError::DeviceUnavailable(msg) => assert!(msg.contains("unsupported")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

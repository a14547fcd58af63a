//! Record-then-classify session use case

use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::domain::inference::InferenceResult;
use crate::domain::recording::{AudioClip, Duration};
use crate::domain::session::{InvalidStateTransition, RecordingSession, SessionState};

use super::ports::{
    AudioCapture, CaptureError, CaptureEvent, CaptureHandle, EmotionClassifier, InferenceError,
};

/// How long `stop` waits for the capture to deliver its trailing chunks
const DRAIN_TIMEOUT: StdDuration = StdDuration::from_secs(2);

/// Errors from the session use case. Every variant ends the current cycle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Nothing was recorded")]
    EmptyRecording,
}

/// Options for the session use case
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on one upload, reported as a network failure on expiry
    pub upload_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::default_upload_timeout(),
        }
    }
}

/// Callbacks for status updates
#[derive(Default)]
pub struct SessionCallbacks {
    /// Called once the clip is finalized, right before it is uploaded
    pub on_uploading: Option<Box<dyn Fn(&AudioClip) + Send + Sync>>,
}

struct ActiveCapture {
    handle: Box<dyn CaptureHandle>,
    pump: JoinHandle<usize>,
}

/// Drives one recording cycle at a time: start, stop, upload, report.
pub struct RecordingSessionUseCase<A, E>
where
    A: AudioCapture,
    E: EmotionClassifier,
{
    capture: A,
    classifier: E,
    session: Arc<Mutex<RecordingSession>>,
    active: Mutex<Option<ActiveCapture>>,
    config: SessionConfig,
    callbacks: SessionCallbacks,
}

impl<A, E> RecordingSessionUseCase<A, E>
where
    A: AudioCapture,
    E: EmotionClassifier,
{
    pub fn new(capture: A, classifier: E, config: SessionConfig) -> Self {
        Self {
            capture,
            classifier,
            session: Arc::new(Mutex::new(RecordingSession::new())),
            active: Mutex::new(None),
            config,
            callbacks: SessionCallbacks::default(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: SessionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Acquire the microphone and begin accumulating chunks.
    ///
    /// On capture failure the session stays idle.
    pub async fn start(&self) -> Result<(), SessionError> {
        let mut session = self.session.lock().await;
        if !session.is_idle() {
            return Err(InvalidStateTransition {
                current_state: session.state(),
                action: "start recording".to_string(),
            }
            .into());
        }

        let stream = self.capture.open().await.map_err(|e| {
            tracing::warn!(error = %e, "capture could not be opened");
            e
        })?;

        session.begin_recording(stream.format)?;
        let pump = tokio::spawn(pump_chunks(stream.events, Arc::clone(&self.session)));
        *self.active.lock().await = Some(ActiveCapture {
            handle: stream.handle,
            pump,
        });

        tracing::info!(format = %stream.format, "recording started");
        Ok(())
    }

    /// Stop recording, upload the clip and wait for its classification.
    ///
    /// Whatever the outcome, the session is idle again when this returns.
    pub async fn stop(&self) -> Result<InferenceResult, SessionError> {
        let active = self.take_active("stop recording").await?;
        let clip = self.finish_capture(active).await?;

        if let Some(ref cb) = self.callbacks.on_uploading {
            cb(&clip);
        }

        let outcome = self.upload(&clip).await;
        drop(clip);

        if let Err(e) = self.session.lock().await.complete_upload() {
            tracing::error!(error = %e, "session left uploading state unexpectedly");
        }

        match &outcome {
            Ok(result) => tracing::info!(%result, "classification received"),
            Err(e) => tracing::warn!(error = %e, "classification failed"),
        }
        outcome.map_err(SessionError::from)
    }

    /// Stop recording and discard the audio without uploading
    pub async fn cancel(&self) -> Result<(), SessionError> {
        let mut active = self.take_active("cancel recording").await?;

        let stopped = active.handle.stop().await;
        active.pump.abort();
        self.session.lock().await.abort_recording()?;

        tracing::info!("recording cancelled");
        stopped.map_err(SessionError::from)
    }

    async fn take_active(&self, action: &str) -> Result<ActiveCapture, SessionError> {
        let state = self.session.lock().await.state();
        let active = if state == SessionState::Recording {
            self.active.lock().await.take()
        } else {
            None
        };

        active.ok_or_else(|| {
            InvalidStateTransition {
                current_state: state,
                action: action.to_string(),
            }
            .into()
        })
    }

    /// Release the device, drain trailing chunks and move to uploading
    async fn finish_capture(&self, mut active: ActiveCapture) -> Result<AudioClip, SessionError> {
        if let Err(e) = active.handle.stop().await {
            active.pump.abort();
            self.session.lock().await.abort_recording()?;
            return Err(e.into());
        }

        match timeout(DRAIN_TIMEOUT, &mut active.pump).await {
            Ok(Ok(chunks)) => tracing::debug!(chunks, "capture drained"),
            Ok(Err(e)) => tracing::warn!(error = %e, "chunk pump ended abnormally"),
            Err(_) => {
                tracing::warn!("capture did not report stop in time, finalizing anyway");
                active.pump.abort();
            }
        }

        let mut session = self.session.lock().await;
        if session.buffered_bytes() == 0 {
            session.abort_recording()?;
            return Err(SessionError::EmptyRecording);
        }

        let clip = session.finish_recording()?;
        tracing::debug!(bytes = clip.len(), format = %clip.format(), "clip finalized");
        Ok(clip)
    }

    async fn upload(&self, clip: &AudioClip) -> Result<InferenceResult, InferenceError> {
        let limit = self.config.upload_timeout;
        match timeout(limit.as_std(), self.classifier.classify(clip)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(InferenceError::NetworkFailure(format!(
                "Upload timed out after {}",
                limit
            ))),
        }
    }
}

/// Move capture chunks into the session until the capture stops.
/// Returns the number of chunks accepted.
async fn pump_chunks(
    mut events: mpsc::UnboundedReceiver<CaptureEvent>,
    session: Arc<Mutex<RecordingSession>>,
) -> usize {
    let mut accepted = 0;
    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::Chunk(chunk) => {
                let bytes = chunk.len();
                if session.lock().await.append_chunk(chunk) {
                    accepted += 1;
                } else {
                    tracing::debug!(bytes, "dropping chunk delivered outside recording");
                }
            }
            CaptureEvent::Stopped => break,
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CaptureStream, FALLBACK_REJECTION_MESSAGE};
    use crate::domain::recording::AudioFormat;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    type Senders = Arc<StdMutex<Vec<mpsc::UnboundedSender<CaptureEvent>>>>;

    /// Capture whose chunks are fed by the test through `senders`
    #[derive(Default)]
    struct MockCapture {
        senders: Senders,
        trailing_chunk: Option<Vec<u8>>,
        open_error: Option<CaptureError>,
        released: Arc<StdMutex<u32>>,
    }

    impl MockCapture {
        fn feed(&self, chunk: &[u8]) {
            let senders = self.senders.lock().unwrap();
            let tx = senders.last().expect("capture not opened");
            tx.send(CaptureEvent::Chunk(chunk.to_vec())).unwrap();
        }
    }

    struct MockHandle {
        tx: mpsc::UnboundedSender<CaptureEvent>,
        trailing_chunk: Option<Vec<u8>>,
        released: Arc<StdMutex<u32>>,
    }

    #[async_trait]
    impl CaptureHandle for MockHandle {
        async fn stop(&mut self) -> Result<(), CaptureError> {
            *self.released.lock().unwrap() += 1;
            if let Some(chunk) = self.trailing_chunk.take() {
                let _ = self.tx.send(CaptureEvent::Chunk(chunk));
            }
            let _ = self.tx.send(CaptureEvent::Stopped);
            Ok(())
        }
    }

    #[async_trait]
    impl AudioCapture for MockCapture {
        async fn open(&self) -> Result<CaptureStream, CaptureError> {
            if let Some(ref e) = self.open_error {
                return Err(e.clone());
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.senders.lock().unwrap().push(tx.clone());
            Ok(CaptureStream {
                events: rx,
                format: AudioFormat::Webm,
                handle: Box::new(MockHandle {
                    tx,
                    trailing_chunk: self.trailing_chunk.clone(),
                    released: Arc::clone(&self.released),
                }),
            })
        }
    }

    /// Classifier that records every clip it receives
    struct MockClassifier {
        outcome: Result<(&'static str, f64), InferenceError>,
        delay: Option<StdDuration>,
        received: Arc<StdMutex<Vec<AudioClip>>>,
    }

    impl MockClassifier {
        fn ok(emotion: &'static str, confidence: f64) -> Self {
            Self::with_outcome(Ok((emotion, confidence)))
        }

        fn with_outcome(outcome: Result<(&'static str, f64), InferenceError>) -> Self {
            Self {
                outcome,
                delay: None,
                received: Arc::new(StdMutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl EmotionClassifier for MockClassifier {
        async fn classify(&self, clip: &AudioClip) -> Result<InferenceResult, InferenceError> {
            self.received.lock().unwrap().push(clip.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.outcome {
                Ok((emotion, confidence)) => Ok(InferenceResult::new(*emotion, *confidence).unwrap()),
                Err(e) => Err(e.clone()),
            }
        }
    }

    fn use_case(
        capture: MockCapture,
        classifier: MockClassifier,
    ) -> RecordingSessionUseCase<MockCapture, MockClassifier> {
        RecordingSessionUseCase::new(capture, classifier, SessionConfig::default())
    }

    /// Let the pump task run
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn clip_is_ordered_concatenation_including_trailing_flush() {
        let capture = MockCapture {
            trailing_chunk: Some(vec![9, 9]),
            ..Default::default()
        };
        let classifier = MockClassifier::ok("happy", 0.873);
        let received = Arc::clone(&classifier.received);
        let uc = use_case(capture, classifier);

        uc.start().await.unwrap();
        assert_eq!(uc.state().await, SessionState::Recording);
        uc.capture.feed(&[1, 2]);
        uc.capture.feed(&[3]);
        settle().await;

        let result = uc.stop().await.unwrap();
        assert_eq!(result.to_string(), "happy (87.3%)");
        assert_eq!(uc.state().await, SessionState::Idle);

        let clips = received.lock().unwrap();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].bytes(), &[1, 2, 3, 9, 9]);
        assert_eq!(clips[0].format(), AudioFormat::Webm);
    }

    #[tokio::test]
    async fn chunks_after_stop_are_not_included() {
        let classifier = MockClassifier::ok("calm", 0.5);
        let received = Arc::clone(&classifier.received);
        let uc = use_case(MockCapture::default(), classifier);

        uc.start().await.unwrap();
        uc.capture.feed(&[1]);
        uc.stop().await.unwrap();

        // the old sender is still alive; anything it delivers now is ignored
        let _ = uc.capture.senders.lock().unwrap()[0].send(CaptureEvent::Chunk(vec![2]));
        settle().await;

        assert_eq!(received.lock().unwrap()[0].bytes(), &[1]);
        assert!(uc.session.lock().await.is_idle());
    }

    #[tokio::test]
    async fn device_is_released_before_upload() {
        let capture = MockCapture::default();
        let released = Arc::clone(&capture.released);
        let released_at_upload = Arc::new(StdMutex::new(None));
        let seen = Arc::clone(&released_at_upload);
        let released_probe = Arc::clone(&released);

        let uc = use_case(capture, MockClassifier::ok("sad", 0.4)).with_callbacks(SessionCallbacks {
            on_uploading: Some(Box::new(move |_| {
                *seen.lock().unwrap() = Some(*released_probe.lock().unwrap());
            })),
        });

        uc.start().await.unwrap();
        uc.capture.feed(&[1]);
        uc.stop().await.unwrap();

        assert_eq!(*released_at_upload.lock().unwrap(), Some(1));
        assert_eq!(*released.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_recording_is_rejected_without_upload() {
        let classifier = MockClassifier::ok("happy", 0.9);
        let received = Arc::clone(&classifier.received);
        let uc = use_case(MockCapture::default(), classifier);

        uc.start().await.unwrap();
        let err = uc.stop().await.unwrap_err();

        assert!(matches!(err, SessionError::EmptyRecording));
        assert!(received.lock().unwrap().is_empty());
        assert_eq!(uc.state().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn permission_denied_keeps_session_idle() {
        let capture = MockCapture {
            open_error: Some(CaptureError::PermissionDenied("blocked".into())),
            ..Default::default()
        };
        let uc = use_case(capture, MockClassifier::ok("happy", 0.9));

        let err = uc.start().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Capture(CaptureError::PermissionDenied(_))
        ));
        assert_eq!(uc.state().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn rejection_surfaces_server_message_and_returns_to_idle() {
        let classifier = MockClassifier::with_outcome(Err(InferenceError::UploadRejected {
            status: 413,
            message: "file too large".into(),
        }));
        let uc = use_case(MockCapture::default(), classifier);

        uc.start().await.unwrap();
        uc.capture.feed(&[1, 2, 3]);
        settle().await;
        let err = uc.stop().await.unwrap_err();

        assert_eq!(err.to_string(), "file too large");
        assert_eq!(uc.state().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn rejection_without_detail_uses_fallback() {
        let classifier = MockClassifier::with_outcome(Err(InferenceError::UploadRejected {
            status: 500,
            message: FALLBACK_REJECTION_MESSAGE.into(),
        }));
        let uc = use_case(MockCapture::default(), classifier);

        uc.start().await.unwrap();
        uc.capture.feed(&[1]);
        let err = uc.stop().await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown error");
    }

    #[tokio::test]
    async fn network_failure_message_is_passed_through() {
        let classifier = MockClassifier::with_outcome(Err(InferenceError::NetworkFailure(
            "connection refused".into(),
        )));
        let uc = use_case(MockCapture::default(), classifier);

        uc.start().await.unwrap();
        uc.capture.feed(&[1]);
        let err = uc.stop().await.unwrap_err();

        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(uc.state().await, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_upload_times_out_as_network_failure() {
        let mut classifier = MockClassifier::ok("happy", 0.9);
        classifier.delay = Some(StdDuration::from_secs(5));
        let uc = RecordingSessionUseCase::new(
            MockCapture::default(),
            classifier,
            SessionConfig {
                upload_timeout: Duration::from_secs(1),
            },
        );

        uc.start().await.unwrap();
        uc.capture.feed(&[1]);
        let err = uc.stop().await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Inference(InferenceError::NetworkFailure(_))
        ));
        assert_eq!(err.to_string(), "Upload timed out after 1s");
        assert_eq!(uc.state().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn session_restarts_after_every_outcome() {
        let classifier = MockClassifier::with_outcome(Err(InferenceError::NetworkFailure(
            "offline".into(),
        )));
        let received = Arc::clone(&classifier.received);
        let uc = use_case(MockCapture::default(), classifier);

        uc.start().await.unwrap();
        uc.capture.feed(&[1]);
        assert!(uc.stop().await.is_err());

        uc.start().await.unwrap();
        uc.capture.feed(&[2]);
        settle().await;
        assert!(uc.stop().await.is_err());

        let clips = received.lock().unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[1].bytes(), &[2]);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let uc = use_case(MockCapture::default(), MockClassifier::ok("happy", 0.9));
        uc.start().await.unwrap();

        let err = uc.start().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState(_)));
        assert_eq!(uc.state().await, SessionState::Recording);
    }

    #[tokio::test]
    async fn stop_when_idle_is_rejected() {
        let uc = use_case(MockCapture::default(), MockClassifier::ok("happy", 0.9));
        let err = uc.stop().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState(_)));
    }

    #[tokio::test]
    async fn cancel_discards_audio_and_releases_device() {
        let capture = MockCapture::default();
        let released = Arc::clone(&capture.released);
        let classifier = MockClassifier::ok("happy", 0.9);
        let received = Arc::clone(&classifier.received);
        let uc = use_case(capture, classifier);

        uc.start().await.unwrap();
        uc.capture.feed(&[1, 2, 3]);
        uc.cancel().await.unwrap();

        assert_eq!(uc.state().await, SessionState::Idle);
        assert_eq!(*released.lock().unwrap(), 1);
        assert!(received.lock().unwrap().is_empty());
        assert!(uc.cancel().await.is_err());
    }
}

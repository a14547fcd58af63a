//! Main app runner: interactive loop and one-shot mode

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::time::Instant;

use crate::application::ports::{AudioCapture, ConfigStore, EmotionClassifier};
use crate::application::{RecordingSessionUseCase, SessionCallbacks, SessionConfig};
use crate::domain::config::AppConfig;
use crate::domain::recording::{AudioClip, Duration};
use crate::domain::status::StatusMessage;
use crate::infrastructure::{CpalCapture, FileCapture, HttpEmotionClassifier, XdgConfigStore};

use super::args::RunOptions;
use super::presenter::Presenter;
use super::signals::{ControlSignal, ControlSignalHandler};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment override for the inference endpoint
pub const ENDPOINT_ENV: &str = "EMOTION_RECORDER_ENDPOINT";

/// How often the recording progress line refreshes
const PROGRESS_TICK: StdDuration = StdDuration::from_millis(250);

/// How a recording phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordingEnd {
    Stop,
    Cancel,
    Quit,
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, path = %store.path().display(), "ignoring config file");
            AppConfig::empty()
        }
    };

    let env_config = AppConfig {
        endpoint: env::var(ENDPOINT_ENV).ok().filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Resolve merged config into run options. Errors are usage errors.
pub fn build_run_options(
    config: &AppConfig,
    input: Option<PathBuf>,
    once: bool,
) -> Result<RunOptions, String> {
    Ok(RunOptions {
        endpoint: config.endpoint_or_default().to_string(),
        upload_timeout: parse_duration("timeout", &config.timeout)?
            .unwrap_or_else(Duration::default_upload_timeout),
        max_duration: parse_duration("max-duration", &config.max_duration)?
            .unwrap_or_else(Duration::default_max_duration),
        chunk_interval: parse_duration("chunk-interval", &config.chunk_interval)?
            .unwrap_or_else(Duration::default_chunk_interval),
        input,
        once,
    })
}

fn parse_duration(name: &str, value: &Option<String>) -> Result<Option<Duration>, String> {
    value
        .as_deref()
        .map(|s| s.parse::<Duration>())
        .transpose()
        .map_err(|e| format!("Invalid {}: {}", name, e))
}

/// Run the recorder with the resolved options
pub async fn run(options: RunOptions) -> ExitCode {
    let presenter = Arc::new(Presenter::new());

    let classifier = match HttpEmotionClassifier::new(&options.endpoint) {
        Ok(classifier) => classifier,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };
    tracing::info!(endpoint = %classifier.endpoint(), "inference endpoint");

    match options.input.clone() {
        Some(path) => run_with(FileCapture::new(path), classifier, &options, presenter).await,
        None => {
            let capture = CpalCapture::new(options.chunk_interval);
            run_with(capture, classifier, &options, presenter).await
        }
    }
}

async fn run_with<A, E>(
    capture: A,
    classifier: E,
    options: &RunOptions,
    presenter: Arc<Presenter>,
) -> ExitCode
where
    A: AudioCapture,
    E: EmotionClassifier,
{
    let uploading_presenter = Arc::clone(&presenter);
    let callbacks = SessionCallbacks {
        on_uploading: Some(Box::new(move |clip: &AudioClip| {
            uploading_presenter.status(&StatusMessage::Uploading {
                size: clip.human_readable_size(),
            });
        })),
    };

    let config = SessionConfig {
        upload_timeout: options.upload_timeout,
    };
    let use_case = RecordingSessionUseCase::new(capture, classifier, config).with_callbacks(callbacks);

    let mut signals = ControlSignalHandler::new();
    let runner = Runner {
        use_case: &use_case,
        presenter: &presenter,
        max_duration: options.max_duration,
        // a replayed file is complete as soon as it is opened
        stop_immediately: options.input.is_some(),
    };

    let code = if options.once {
        runner.run_once(&mut signals).await
    } else {
        runner.interactive(&mut signals).await
    };
    ExitCode::from(code)
}

struct Runner<'a, A, E>
where
    A: AudioCapture,
    E: EmotionClassifier,
{
    use_case: &'a RecordingSessionUseCase<A, E>,
    presenter: &'a Presenter,
    max_duration: Duration,
    stop_immediately: bool,
}

impl<A, E> Runner<'_, A, E>
where
    A: AudioCapture,
    E: EmotionClassifier,
{
    /// One cycle, started right away. Exit code reflects the outcome.
    async fn run_once(&self, signals: &mut ControlSignalHandler) -> u8 {
        if !self.start_recording().await {
            return EXIT_ERROR;
        }

        match self.record(signals, true).await {
            RecordingEnd::Stop => {
                if self.finish_cycle().await {
                    EXIT_SUCCESS
                } else {
                    EXIT_ERROR
                }
            }
            RecordingEnd::Cancel | RecordingEnd::Quit => {
                self.cancel_recording().await;
                EXIT_ERROR
            }
        }
    }

    /// Enter toggles recording until the user quits
    async fn interactive(&self, signals: &mut ControlSignalHandler) -> u8 {
        self.presenter.status(&StatusMessage::Ready);

        loop {
            match signals.recv().await {
                Some(ControlSignal::Toggle) => {
                    if self.start_recording().await {
                        match self.record(signals, false).await {
                            RecordingEnd::Stop => {
                                self.finish_cycle().await;
                            }
                            RecordingEnd::Cancel => self.cancel_recording().await,
                            RecordingEnd::Quit => {
                                self.cancel_recording().await;
                                return EXIT_SUCCESS;
                            }
                        }
                    }
                    self.presenter.status(&StatusMessage::Ready);
                }
                Some(ControlSignal::Interrupt)
                | Some(ControlSignal::Quit)
                | Some(ControlSignal::EndOfInput)
                | None => return EXIT_SUCCESS,
            }
        }
    }

    async fn start_recording(&self) -> bool {
        match self.use_case.start().await {
            Ok(()) => {
                self.presenter.status(&StatusMessage::Recording);
                true
            }
            Err(e) => {
                self.presenter.status(&StatusMessage::Error(e.to_string()));
                false
            }
        }
    }

    /// Wait until the recording should end: Enter, Ctrl+C, quit or the limit
    async fn record(&self, signals: &mut ControlSignalHandler, ignore_eof: bool) -> RecordingEnd {
        if self.stop_immediately {
            return RecordingEnd::Stop;
        }

        let started = Instant::now();
        let limit = tokio::time::sleep(self.max_duration.as_std());
        tokio::pin!(limit);
        let mut ticker = tokio::time::interval(PROGRESS_TICK);

        loop {
            tokio::select! {
                _ = &mut limit => {
                    tracing::info!(limit = %self.max_duration, "max duration reached");
                    self.presenter.warn("Max duration reached, auto-stopping");
                    return RecordingEnd::Stop;
                }
                _ = ticker.tick() => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    self.presenter
                        .update_recording_progress(elapsed_ms, self.max_duration.as_millis());
                }
                signal = signals.recv() => match signal {
                    Some(ControlSignal::Toggle) => return RecordingEnd::Stop,
                    Some(ControlSignal::Interrupt) => return RecordingEnd::Cancel,
                    Some(ControlSignal::Quit) => return RecordingEnd::Quit,
                    Some(ControlSignal::EndOfInput) if ignore_eof => {}
                    Some(ControlSignal::EndOfInput) | None => return RecordingEnd::Quit,
                },
            }
        }
    }

    /// Stop, upload and report. Returns whether a result was obtained.
    async fn finish_cycle(&self) -> bool {
        match self.use_case.stop().await {
            Ok(result) => {
                self.presenter.status(&StatusMessage::Result(result));
                true
            }
            Err(e) => {
                self.presenter.status(&StatusMessage::Error(e.to_string()));
                false
            }
        }
    }

    async fn cancel_recording(&self) {
        self.presenter.stop_spinner();
        match self.use_case.cancel().await {
            Ok(()) => self.presenter.warn("Recording cancelled"),
            Err(e) => self.presenter.error(&e.to_string()),
        }
    }
}

//! CLI presenter for output formatting

use std::sync::Mutex;
use std::time::Duration as StdDuration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::status::StatusMessage;

/// Presenter for CLI output formatting.
///
/// Status lines and spinners go to stderr; classification results go to
/// stdout so they can be piped.
pub struct Presenter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    /// Render a status transition
    pub fn status(&self, status: &StatusMessage) {
        if status.is_terminal() {
            self.stop_spinner();
        }

        match status {
            StatusMessage::Ready => {
                self.stop_spinner();
                self.info(&status.to_string());
            }
            StatusMessage::Recording | StatusMessage::Uploading { .. } => {
                self.start_spinner(&status.to_string());
            }
            StatusMessage::Result(_) => self.output(&status.to_string()),
            StatusMessage::Error(message) => self.error(message),
        }
    }

    /// Start a spinner with message, replacing any running one
    pub fn start_spinner(&self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(StdDuration::from_millis(80));

        if let Some(previous) = self.replace_spinner(Some(spinner)) {
            previous.finish_and_clear();
        }
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Ok(guard) = self.spinner.lock() {
            if let Some(spinner) = guard.as_ref() {
                spinner.set_message(message.to_string());
            }
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&self) {
        if let Some(spinner) = self.replace_spinner(None) {
            spinner.finish_and_clear();
        }
    }

    fn replace_spinner(&self, next: Option<ProgressBar>) -> Option<ProgressBar> {
        match self.spinner.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }

    /// Format recording progress against the auto-stop limit
    pub fn format_progress(&self, elapsed_ms: u64, limit_ms: u64) -> String {
        let elapsed_secs = elapsed_ms / 1000;
        let limit_secs = limit_ms / 1000;
        let percent = if limit_ms > 0 {
            (elapsed_ms as f64 / limit_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {:>3}s / {}s",
            "█".repeat(filled).red(),
            "░".repeat(empty),
            elapsed_secs,
            limit_secs
        )
    }

    /// Update the recording spinner with elapsed time
    pub fn update_recording_progress(&self, elapsed_ms: u64, limit_ms: u64) {
        let progress = self.format_progress(elapsed_ms, limit_ms);
        self.update_spinner(&format!("{} {}", StatusMessage::Recording, progress));
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

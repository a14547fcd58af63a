//! Duration value object used for timeouts and recording limits

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default upload timeout (30 seconds)
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;

/// Default recording limit before auto-stop (60 seconds)
pub const DEFAULT_MAX_DURATION_SECS: u64 = 60;

/// Default interval between capture chunks (1 second)
pub const DEFAULT_CHUNK_INTERVAL_SECS: u64 = 1;

/// A positive, whole-second span of time.
///
/// Parsed from the human-friendly forms accepted on the command line and in
/// the config file: `30s`, `2m`, `1m30s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    secs: u64,
}

impl Duration {
    /// Create a Duration from whole seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub const fn default_upload_timeout() -> Self {
        Self::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS)
    }

    pub const fn default_max_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    pub const fn default_chunk_interval() -> Self {
        Self::from_secs(DEFAULT_CHUNK_INTERVAL_SECS)
    }

    pub const fn as_secs(&self) -> u64 {
        self.secs
    }

    pub const fn as_millis(&self) -> u64 {
        self.secs.saturating_mul(1000)
    }

    /// Convert to a standard library duration for tokio timers
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_secs(self.secs)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_ascii_lowercase();

        let mut total: u64 = 0;
        let mut digits = String::new();
        let mut seen_minutes = false;
        let mut seen_seconds = false;

        for ch in input.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                // minutes must come before seconds and appear once
                'm' if !digits.is_empty() && !seen_minutes && !seen_seconds => {
                    let minutes: u64 = digits.parse().map_err(|_| invalid())?;
                    total = minutes.checked_mul(60).ok_or_else(invalid)?;
                    digits.clear();
                    seen_minutes = true;
                }
                's' if !digits.is_empty() && !seen_seconds => {
                    let seconds: u64 = digits.parse().map_err(|_| invalid())?;
                    total = total.checked_add(seconds).ok_or_else(invalid)?;
                    digits.clear();
                    seen_seconds = true;
                }
                _ => return Err(invalid()),
            }
        }

        if !digits.is_empty() || total == 0 {
            return Err(invalid());
        }

        Ok(Self { secs: total })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.secs / 60, self.secs % 60) {
            (0, s) => write!(f, "{}s", s),
            (m, 0) => write!(f, "{}m", m),
            (m, s) => write!(f, "{}m{}s", m, s),
        }
    }
}

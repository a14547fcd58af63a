//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::Duration;

/// Inference endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5002/predict_emotion";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    pub timeout: Option<String>,
    pub max_duration: Option<String>,
    pub chunk_interval: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            timeout: Some(Duration::default_upload_timeout().to_string()),
            max_duration: Some(Duration::default_max_duration().to_string()),
            chunk_interval: Some(Duration::default_chunk_interval().to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            endpoint: other.endpoint.or(self.endpoint),
            timeout: other.timeout.or(self.timeout),
            max_duration: other.max_duration.or(self.max_duration),
            chunk_interval: other.chunk_interval.or(self.chunk_interval),
        }
    }

    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.endpoint.as_deref(), Some(DEFAULT_ENDPOINT));
        assert_eq!(config.timeout.as_deref(), Some("30s"));
        assert_eq!(config.max_duration.as_deref(), Some("1m"));
        assert_eq!(config.chunk_interval.as_deref(), Some("1s"));
    }

    #[test]
    fn empty_has_all_none() {
        assert_eq!(
            AppConfig::empty(),
            AppConfig {
                endpoint: None,
                timeout: None,
                max_duration: None,
                chunk_interval: None,
            }
        );
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            endpoint: Some("http://base/predict".to_string()),
            timeout: Some("10s".to_string()),
            ..Default::default()
        };
        let other = AppConfig {
            endpoint: Some("http://other/predict".to_string()),
            max_duration: Some("2m".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.endpoint.as_deref(), Some("http://other/predict"));
        assert_eq!(merged.timeout.as_deref(), Some("10s"));
        assert_eq!(merged.max_duration.as_deref(), Some("2m"));
        assert!(merged.chunk_interval.is_none());
    }

    #[test]
    fn layered_merge_keeps_defaults_underneath() {
        let file = AppConfig {
            timeout: Some("45s".to_string()),
            ..Default::default()
        };
        let cli = AppConfig {
            endpoint: Some("http://cli/predict".to_string()),
            ..Default::default()
        };

        let merged = AppConfig::defaults().merge(file).merge(cli);

        assert_eq!(merged.endpoint_or_default(), "http://cli/predict");
        assert_eq!(merged.timeout.as_deref(), Some("45s"));
        assert_eq!(merged.max_duration.as_deref(), Some("1m"));
    }

    #[test]
    fn blank_endpoint_falls_back() {
        let config = AppConfig {
            endpoint: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint_or_default(), DEFAULT_ENDPOINT);
        assert_eq!(AppConfig::empty().endpoint_or_default(), DEFAULT_ENDPOINT);
    }
}

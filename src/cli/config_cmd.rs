//! Config command handler

use reqwest::Url;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    *field_mut(&mut config, key)? = Some(value.to_string());

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    presenter.output(field(&config, key).unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, field(&config, key).unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(unknown_key(key))
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}

fn field<'a>(config: &'a AppConfig, key: &str) -> Option<&'a str> {
    match key {
        "endpoint" => config.endpoint.as_deref(),
        "timeout" => config.timeout.as_deref(),
        "max_duration" => config.max_duration.as_deref(),
        "chunk_interval" => config.chunk_interval.as_deref(),
        _ => None,
    }
}

fn field_mut<'a>(
    config: &'a mut AppConfig,
    key: &str,
) -> Result<&'a mut Option<String>, ConfigError> {
    match key {
        "endpoint" => Ok(&mut config.endpoint),
        "timeout" => Ok(&mut config.timeout),
        "max_duration" => Ok(&mut config.max_duration),
        "chunk_interval" => Ok(&mut config.chunk_interval),
        _ => Err(unknown_key(key)),
    }
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "timeout" | "max_duration" | "chunk_interval" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "endpoint" => {
            let url = Url::parse(value)
                .map_err(|e| invalid(format!("Invalid URL '{}': {}", value, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(format!(
                    "Unsupported scheme '{}'. Use http or https",
                    url.scheme()
                )));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::XdgConfigStore;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, XdgConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = XdgConfigStore::with_path(dir.path().join("config.toml"));
        (dir, store)
    }

    #[test]
    fn validate_durations() {
        assert!(validate_config_value("timeout", "30s").is_ok());
        assert!(validate_config_value("max_duration", "2m30s").is_ok());
        assert!(validate_config_value("chunk_interval", "1s").is_ok());
        assert!(validate_config_value("timeout", "soon").is_err());
        assert!(validate_config_value("max_duration", "0s").is_err());
    }

    #[test]
    fn validate_endpoint() {
        assert!(validate_config_value("endpoint", "http://127.0.0.1:5002/predict_emotion").is_ok());
        assert!(validate_config_value("endpoint", "https://example.com/predict").is_ok());
        assert!(validate_config_value("endpoint", "localhost:5002").is_err());
        assert!(validate_config_value("endpoint", "ftp://example.com/predict").is_err());
    }

    #[tokio::test]
    async fn set_then_get() {
        let (_dir, store) = temp_store();
        let presenter = Presenter::new();

        handle_set(&store, &presenter, "timeout", "45s").await.unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.timeout.as_deref(), Some("45s"));
        assert_eq!(field(&config, "timeout"), Some("45s"));
        assert_eq!(field(&config, "endpoint"), None);
    }

    #[tokio::test]
    async fn set_rejects_unknown_key() {
        let (_dir, store) = temp_store();
        let presenter = Presenter::new();

        let err = handle_set(&store, &presenter, "api_key", "x").await.unwrap_err();
        assert!(err.to_string().contains("Unknown key"));
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn set_rejects_invalid_value_without_writing() {
        let (_dir, store) = temp_store();
        let presenter = Presenter::new();

        let err = handle_set(&store, &presenter, "max_duration", "forever")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        assert!(!store.exists());
    }
}

//! HTTP emotion classifier adapter

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;

use crate::application::ports::{EmotionClassifier, InferenceError, FALLBACK_REJECTION_MESSAGE};
use crate::domain::error::ConfigError;
use crate::domain::inference::InferenceResult;
use crate::domain::recording::AudioClip;

/// Multipart field the server reads the clip from
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
struct EmotionResponse {
    emotion: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
}

/// Posts clips to an inference server as `multipart/form-data`
pub struct HttpEmotionClassifier {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpEmotionClassifier {
    /// Create a classifier for the given endpoint URL
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ConfigError::ValidationError {
            key: "endpoint".to_string(),
            message: format!("invalid URL '{}': {}", endpoint, e),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError {
                key: "endpoint".to_string(),
                message: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        Ok(Self {
            endpoint,
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_form(clip: &AudioClip) -> Result<Form, InferenceError> {
        let format = clip.format();
        let part = Part::bytes(clip.bytes().to_vec())
            .file_name(format.file_name())
            .mime_str(format.mime_type())
            .map_err(|e| InferenceError::NetworkFailure(e.to_string()))?;

        Ok(Form::new().part(FILE_FIELD, part))
    }

    /// Extract the rejection message from a failure body.
    ///
    /// Only a string `detail` is shown; anything else uses the fallback.
    fn rejection_message(body: &str) -> String {
        serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|r| match r.detail {
                Some(serde_json::Value::String(detail)) => Some(detail),
                _ => None,
            })
            .unwrap_or_else(|| FALLBACK_REJECTION_MESSAGE.to_string())
    }

    fn parse_success(body: &str) -> Result<InferenceResult, InferenceError> {
        let response: EmotionResponse = serde_json::from_str(body).map_err(|e| {
            InferenceError::NetworkFailure(format!("Malformed response from server: {}", e))
        })?;

        InferenceResult::new(response.emotion, response.confidence).map_err(|e| {
            InferenceError::NetworkFailure(format!("Malformed response from server: {}", e))
        })
    }
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier {
    async fn classify(&self, clip: &AudioClip) -> Result<InferenceResult, InferenceError> {
        let form = Self::build_form(clip)?;

        tracing::debug!(
            endpoint = %self.endpoint,
            bytes = clip.len(),
            format = %clip.format(),
            "uploading clip"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::NetworkFailure(e.to_string()))?;

        if !status.is_success() {
            let message = Self::rejection_message(&body);
            tracing::warn!(status = status.as_u16(), %message, "server rejected clip");
            return Err(InferenceError::UploadRejected {
                status: status.as_u16(),
                message,
            });
        }

        let result = Self::parse_success(&body)?;
        tracing::info!(
            emotion = result.emotion(),
            confidence = result.confidence(),
            "clip classified"
        );
        Ok(result)
    }
}

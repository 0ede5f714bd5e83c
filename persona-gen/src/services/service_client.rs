//! AI service client
//!
//! One HTTP backend provides both capabilities:
//! - `POST /v1/classify` picks one label from a label set for an image
//! - `POST /v1/complete` completes a prompt within a token budget
//!
//! Calls are single-attempt with a fixed timeout. Every failure is returned
//! as a [`ServiceError`]; callers decide how to degrade.

use async_trait::async_trait;
use persona_common::config::AiServiceConfig;
use persona_common::time::millis_to_duration;
use persona_common::LabelSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::ImagePayload;

const USER_AGENT: &str = concat!("persona-gen/", env!("CARGO_PKG_VERSION"));

/// AI service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Endpoint unreachable or connection dropped
    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    /// No response within the configured timeout
    #[error("AI service timed out after {0} ms")]
    Timeout(u64),

    /// Non-2xx status
    #[error("AI service error {0}: {1}")]
    Api(u16, String),

    /// Response body did not match the contract
    #[error("Malformed AI service response: {0}")]
    Malformed(String),
}

/// Classification request body
#[derive(Debug, Serialize)]
pub struct ClassifyRequest<'a> {
    pub image_base64: &'a str,
    pub label_set: &'a str,
    pub labels: Vec<&'a str>,
}

/// Raw classification answer, not yet checked against the label set
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawClassification {
    pub label: String,
    pub confidence: f64,
}

/// Completion request body
#[derive(Debug, Serialize)]
pub struct CompleteRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
}

/// Raw completion answer, not yet cleaned
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub tokens_used: u32,
}

/// Image classification capability
#[async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classify(
        &self,
        image: &ImagePayload,
        label_set: LabelSet,
    ) -> Result<RawClassification, ServiceError>;
}

/// Text completion capability
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Model name recorded in event metadata
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Completion, ServiceError>;
}

/// reqwest-backed client for both capabilities
#[derive(Debug, Clone)]
pub struct HttpAiService {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_ms: u64,
}

impl HttpAiService {
    pub fn new(config: &AiServiceConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(millis_to_duration(config.timeout_ms))
            .build()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Calling AI service");

        let mut request = self.http_client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api(status.as_u16(), error_text));
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.timeout_ms)
        } else {
            ServiceError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl ClassificationService for HttpAiService {
    async fn classify(
        &self,
        image: &ImagePayload,
        label_set: LabelSet,
    ) -> Result<RawClassification, ServiceError> {
        let body = ClassifyRequest {
            image_base64: image.as_base64(),
            label_set: label_set.name(),
            labels: label_set.labels(),
        };
        self.post("/v1/classify", &body).await
    }
}

#[async_trait]
impl GenerationService for HttpAiService {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Completion, ServiceError> {
        let body = CompleteRequest {
            model: &self.model,
            prompt,
            max_tokens,
        };
        self.post("/v1/complete", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = AiServiceConfig {
            base_url: "http://127.0.0.1:9/".to_string(),
            api_key: Some("   ".to_string()),
            ..AiServiceConfig::default()
        };
        let client = HttpAiService::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
        assert!(client.api_key.is_none());
        assert_eq!(GenerationService::model(&client), "mixtral-8x7b");
    }

    #[test]
    fn test_classify_request_shape() {
        let body = ClassifyRequest {
            image_base64: "aGk=",
            label_set: LabelSet::Trait.name(),
            labels: LabelSet::Trait.labels(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["label_set"], "personality_trait");
        assert_eq!(json["labels"][3], "collaborative");
    }

    #[test]
    fn test_completion_tokens_default_to_zero() {
        let completion: Completion = serde_json::from_str(r#"{"text": "Elastico"}"#).unwrap();
        assert_eq!(completion.tokens_used, 0);
    }
}

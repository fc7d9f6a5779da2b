use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::BackendSettings;

/// Errors that can occur when resolving remote model configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Config backend unavailable: {0}")]
    Unavailable(String),

    #[error("Config request rejected: {0}")]
    Rejected(String),

    #[error("Invalid config response: {0}")]
    InvalidResponse(String),
}

/// Credentials and call parameters for the chat-completions endpoint.
/// `apiKey`, `baseUrl` and `model` have no defaults: a response missing any
/// of them is an error, never silently patched with a built-in secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub model: String,
    #[serde(rename = "timeout", default = "default_chat_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(rename = "retryCount", default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(rename = "maxTokens", default = "default_chat_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,
    #[serde(rename = "topP", default = "default_chat_top_p")]
    pub top_p: f32,
}

/// Credentials and call parameters for the image-generation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenConfig {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_watermark")]
    pub watermark: bool,
    #[serde(rename = "responseFormat", default = "default_response_format")]
    pub response_format: String,
    #[serde(rename = "timeout", default = "default_image_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(rename = "retryCount", default = "default_retry_count")]
    pub retry_count: u32,
}

fn default_chat_timeout_ms() -> u64 {
    30_000
}
fn default_retry_count() -> u32 {
    2
}
fn default_chat_max_tokens() -> u32 {
    1024
}
fn default_chat_temperature() -> f32 {
    0.7
}
fn default_chat_top_p() -> f32 {
    0.8
}
fn default_image_size() -> String {
    "2K".to_string()
}
fn default_watermark() -> bool {
    true
}
fn default_response_format() -> String {
    "url".to_string()
}
fn default_image_timeout_ms() -> u64 {
    60_000
}

/// Fetches model credentials from the backend config functions
///
/// Each config is fetched on first use and memoized for the resolver's
/// lifetime. Failures are not cached: the next call retries the fetch.
pub struct ConfigResolver {
    client: Client,
    settings: BackendSettings,
    chat: OnceCell<ChatConfig>,
    image: OnceCell<ImageGenConfig>,
}

impl ConfigResolver {
    pub fn new(settings: BackendSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            settings,
            chat: OnceCell::new(),
            image: OnceCell::new(),
        }
    }

    /// Chat/vision credentials, fetched once per resolver.
    pub async fn chat_config(&self) -> Result<&ChatConfig, ConfigError> {
        self.chat
            .get_or_try_init(|| self.fetch_config(&self.settings.recognition_function))
            .await
    }

    /// Image-generation credentials, fetched once per resolver.
    pub async fn image_config(&self) -> Result<&ImageGenConfig, ConfigError> {
        self.image
            .get_or_try_init(|| self.fetch_config(&self.settings.image_function))
            .await
    }

    async fn fetch_config<T: DeserializeOwned>(&self, function: &str) -> Result<T, ConfigError> {
        let url = format!(
            "{}/functions/{}",
            self.settings.endpoint.trim_end_matches('/'),
            function
        );

        tracing::debug!("Fetching model config from: {}", url);

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.settings.api_key)
            .header("X-Env-Id", &self.settings.env_id)
            .json(&json!({ "action": "getConfig" }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConfigError::Unavailable(format!(
                "Config endpoint returned {}",
                response.status()
            )));
        }

        let envelope: Value = response.json().await?;

        if !envelope
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            let message = envelope
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("no error detail")
                .to_string();
            return Err(ConfigError::Rejected(message));
        }

        let config = envelope
            .get("data")
            .and_then(|data| data.get("config"))
            .cloned()
            .ok_or_else(|| ConfigError::InvalidResponse("Missing config payload".into()))?;

        serde_json::from_value(config)
            .map_err(|e| ConfigError::InvalidResponse(format!("Failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_config_defaults() {
        let config: ChatConfig = serde_json::from_value(json!({
            "apiKey": "k",
            "baseUrl": "https://ark.example.com/api/v3",
            "model": "vision-1",
        }))
        .unwrap();
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.retry_count, 2);
        assert_eq!(config.max_tokens, 1024);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!((config.top_p - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_chat_config_requires_credentials() {
        let missing_key: Result<ChatConfig, _> = serde_json::from_value(json!({
            "baseUrl": "https://ark.example.com/api/v3",
            "model": "vision-1",
        }));
        assert!(missing_key.is_err());
    }

    #[test]
    fn test_image_config_defaults() {
        let config: ImageGenConfig = serde_json::from_value(json!({
            "apiKey": "k",
            "baseUrl": "https://ark.example.com/api/v3",
            "model": "image-1",
        }))
        .unwrap();
        assert_eq!(config.size, "2K");
        assert!(config.watermark);
        assert_eq!(config.response_format, "url");
        assert_eq!(config.timeout_ms, 60_000);
        assert_eq!(config.retry_count, 2);
    }
}

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::models::responses::TokenUsage;
use crate::services::backend::{ChatConfig, ImageGenConfig};

/// Pixel bounds attached to inline vision images.
const MAX_PIXELS: u64 = 3_014_080;
const MIN_PIXELS: u64 = 3_136;

/// Errors from the model provider endpoints
#[derive(Debug, Error)]
pub enum ArkError {
    #[error("Model call timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    RequestError(reqwest::Error),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for ArkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ArkError::Timeout
        } else {
            ArkError::RequestError(err)
        }
    }
}

/// One chat-completions call. Sampling parameters are per call because
/// recognition and recommendation run the same endpoint with different
/// budgets.
#[derive(Debug, Clone)]
pub struct ChatCall<'a> {
    pub text: &'a str,
    pub image_data_uri: Option<&'a str>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout: Duration,
}

/// Content plus token accounting from a chat completion.
#[derive(Debug, Clone)]
pub struct ChatOutput {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// HTTP client for the model provider (chat completions + image generation)
///
/// Performs exactly one attempt per call; retry budgets live with the
/// callers, which own the backoff policy.
pub struct ArkClient {
    client: Client,
}

impl Default for ArkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArkClient {
    pub fn new() -> Self {
        // Timeouts are set per request from the resolved config.
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Single chat-completions attempt. The optional image rides along as a
    /// data-URI content part with low-detail pixel bounds.
    pub async fn chat_completion(
        &self,
        config: &ChatConfig,
        call: &ChatCall<'_>,
    ) -> Result<ChatOutput, ArkError> {
        let mut content_parts = vec![json!({ "type": "text", "text": call.text })];
        if let Some(data_uri) = call.image_data_uri {
            content_parts.push(json!({
                "type": "image_url",
                "image_url": {
                    "url": data_uri,
                    "detail": "low",
                    "image_pixel_limit": {
                        "max_pixels": MAX_PIXELS,
                        "min_pixels": MIN_PIXELS,
                    },
                },
            }));
        }

        let payload = json!({
            "model": config.model,
            "messages": [{ "role": "user", "content": content_parts }],
            "max_tokens": call.max_tokens,
            "temperature": call.temperature,
            "top_p": call.top_p,
        });

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        tracing::debug!("Chat completion call to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .timeout(call.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(ArkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: Value = response.json().await?;

        if let Some(error) = data.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(ArkError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let content = data
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ArkError::EmptyResponse)?;

        if content.trim().is_empty() {
            return Err(ArkError::EmptyResponse);
        }

        let usage = data
            .get("usage")
            .and_then(|usage| serde_json::from_value(usage.clone()).ok());

        Ok(ChatOutput { content, usage })
    }

    /// Single image-generation attempt. Returns the raw response body; the
    /// endpoint streams server-sent events even for one image, so the caller
    /// extracts the URL from the event text.
    pub async fn generate_image(
        &self,
        config: &ImageGenConfig,
        prompt: &str,
        input_images: &[String],
    ) -> Result<String, ArkError> {
        let payload = json!({
            "model": config.model,
            "prompt": prompt,
            "response_format": config.response_format,
            "size": config.size,
            "stream": true,
            "watermark": config.watermark,
            "sequential_image_generation": "auto",
            "sequential_image_generation_options": { "max_images": 1 },
            "image": input_images,
        });

        let url = format!(
            "{}/images/generations",
            config.base_url.trim_end_matches('/')
        );
        tracing::debug!(
            "Image generation call to: {} with {} input images",
            url,
            input_images.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", config.api_key))
            .timeout(Duration::from_millis(config.timeout_ms))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(ArkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }
}

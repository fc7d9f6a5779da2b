use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::WeatherSettings;
use crate::models::domain::WeatherInfo;

/// Errors from the weather provider
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Weather API error: code {0}")]
    ApiError(String),

    #[error("Invalid weather response: {0}")]
    InvalidResponse(String),
}

/// Current-conditions lookup with a short TTL cache
///
/// Weather only flavors the recommendation prompt, so every failure
/// degrades to a fixed mild default instead of propagating.
pub struct WeatherClient {
    endpoint: String,
    api_key: String,
    client: Client,
    cache: moka::future::Cache<String, WeatherInfo>,
}

impl WeatherClient {
    pub fn new(settings: &WeatherSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        let cache = moka::future::CacheBuilder::new(64)
            .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
            .build();

        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            client,
            cache,
        }
    }

    /// Current weather at a coordinate, cached by coordinates rounded to
    /// two decimals. Never fails: lookup errors return the default.
    pub async fn current(&self, latitude: f64, longitude: f64) -> WeatherInfo {
        let key = format!("{:.2},{:.2}", latitude, longitude);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::trace!("Weather cache hit: {}", key);
            return cached;
        }

        match self.fetch(latitude, longitude).await {
            Ok(info) => {
                self.cache.insert(key, info.clone()).await;
                info
            }
            Err(e) => {
                tracing::warn!("Weather lookup failed, using fallback: {}", e);
                WeatherInfo::default()
            }
        }
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherInfo, WeatherError> {
        // Provider convention: location is "lon,lat" with at most 2 d.p.
        let url = format!(
            "{}/v7/weather/now?location={:.2},{:.2}&key={}&lang=zh",
            self.endpoint, longitude, latitude, self.api_key
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(WeatherError::ApiError(response.status().to_string()));
        }

        let body: Value = response.json().await?;
        let code = body.get("code").and_then(Value::as_str).unwrap_or("");
        if code != "200" {
            return Err(WeatherError::ApiError(code.to_string()));
        }

        let now = body
            .get("now")
            .ok_or_else(|| WeatherError::InvalidResponse("Missing now block".into()))?;

        let temperature = now
            .get("temp")
            .and_then(Value::as_str)
            .and_then(|t| t.parse::<f64>().ok())
            .map(|t| t.round() as i32)
            .ok_or_else(|| WeatherError::InvalidResponse("Missing temperature".into()))?;

        let condition = now
            .get("text")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| WeatherError::InvalidResponse("Missing condition text".into()))?
            .to_string();

        Ok(WeatherInfo {
            temperature,
            condition,
            location: None,
        })
    }
}

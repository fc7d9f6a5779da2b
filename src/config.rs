use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub compression: CompressionSettings,
    #[serde(default)]
    pub progress: ProgressSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Backend function endpoints serving remote model credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub env_id: String,
    #[serde(default = "default_recognition_function")]
    pub recognition_function: String,
    #[serde(default = "default_image_function")]
    pub image_function: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: default_backend_endpoint(),
            api_key: String::new(),
            env_id: String::new(),
            recognition_function: default_recognition_function(),
            image_function: default_image_function(),
        }
    }
}

fn default_backend_endpoint() -> String {
    "https://api.wardrobe.example.com".to_string()
}
fn default_recognition_function() -> String {
    "aiRecognition".to_string()
}
fn default_image_function() -> String {
    "generateOutfitImage".to_string()
}

/// Hosted document database.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_backend_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub env_id: String,
    #[serde(default = "default_clothes_collection")]
    pub clothes_collection: String,
    #[serde(default = "default_profiles_collection")]
    pub profiles_collection: String,
    #[serde(default = "default_images_collection")]
    pub images_collection: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_backend_endpoint(),
            api_key: String::new(),
            env_id: String::new(),
            clothes_collection: default_clothes_collection(),
            profiles_collection: default_profiles_collection(),
            images_collection: default_images_collection(),
            page_size: default_page_size(),
        }
    }
}

fn default_clothes_collection() -> String {
    "clothes".to_string()
}
fn default_profiles_collection() -> String {
    "user_profiles".to_string()
}
fn default_images_collection() -> String {
    "ai_recommendation_images".to_string()
}
fn default_page_size() -> u32 {
    100
}

/// Hosted file storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub env_id: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            endpoint: default_backend_endpoint(),
            api_key: String::new(),
            env_id: String::new(),
        }
    }
}

/// Weather provider (now-conditions endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSettings {
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_weather_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            endpoint: default_weather_endpoint(),
            api_key: String::new(),
            cache_ttl_secs: default_weather_cache_ttl(),
        }
    }
}

fn default_weather_endpoint() -> String {
    "https://api.qweather.example.com".to_string()
}
fn default_weather_cache_ttl() -> u64 {
    300
}

/// Generation-call parameters not owned by the remote config.
#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_generation_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_recognition_backoff_ms")]
    pub recognition_backoff_ms: u64,
    #[serde(default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,
    #[serde(default = "default_fallback_image_url")]
    pub default_image_url: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_ms: default_generation_timeout_ms(),
            max_retries: default_max_retries(),
            recognition_backoff_ms: default_recognition_backoff_ms(),
            backoff_unit_ms: default_backoff_unit_ms(),
            default_image_url: default_fallback_image_url(),
        }
    }
}

fn default_max_tokens() -> u32 {
    1500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_generation_timeout_ms() -> u64 {
    60_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_recognition_backoff_ms() -> u64 {
    500
}
fn default_backoff_unit_ms() -> u64 {
    2_000
}
fn default_fallback_image_url() -> String {
    "https://img.freepik.com/free-photo/graceful-stylish-woman-pink-dress_197531-13228.jpg"
        .to_string()
}

/// Byte budget handed to the image preprocessor.
#[derive(Debug, Clone, Deserialize)]
pub struct CompressionSettings {
    #[serde(default = "default_target_max_kb")]
    pub target_max_kb: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            target_max_kb: default_target_max_kb(),
        }
    }
}

fn default_target_max_kb() -> u32 {
    45
}

/// Synthetic progress pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressSettings {
    #[serde(default = "default_progress_total_ms")]
    pub total_ms: u64,
    #[serde(default = "default_progress_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_progress_ceiling")]
    pub ceiling_percent: u8,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            total_ms: default_progress_total_ms(),
            tick_ms: default_progress_tick_ms(),
            ceiling_percent: default_progress_ceiling(),
        }
    }
}

fn default_progress_total_ms() -> u64 {
    20_000
}
fn default_progress_tick_ms() -> u64 {
    500
}
fn default_progress_ceiling() -> u8 {
    90
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with WARDROBE_)
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with WARDROBE_)
            // e.g., WARDROBE_STORE__ENDPOINT -> store.endpoint
            .add_source(
                Environment::with_prefix("WARDROBE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("WARDROBE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Map well-known unprefixed environment variables onto their settings slots.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(key) = env::var("BACKEND_API_KEY") {
        builder = builder.set_override("backend.api_key", key)?;
    }
    if let Ok(key) = env::var("STORE_API_KEY") {
        builder = builder.set_override("store.api_key", key)?;
    }
    if let Ok(key) = env::var("STORAGE_API_KEY") {
        builder = builder.set_override("storage.api_key", key)?;
    }
    if let Ok(key) = env::var("WEATHER_API_KEY") {
        builder = builder.set_override("weather.api_key", key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ai_settings() {
        let ai = AiSettings::default();
        assert_eq!(ai.max_tokens, 1500);
        assert_eq!(ai.temperature, 0.7);
        assert_eq!(ai.top_p, 0.9);
        assert_eq!(ai.timeout_ms, 60_000);
        assert_eq!(ai.max_retries, 3);
        assert_eq!(ai.backoff_unit_ms, 2_000);
    }

    #[test]
    fn test_default_progress_pacing() {
        let progress = ProgressSettings::default();
        assert_eq!(progress.total_ms, 20_000);
        assert_eq!(progress.tick_ms, 500);
        assert_eq!(progress.ceiling_percent, 90);
    }

    #[test]
    fn test_default_store_collections() {
        let store = StoreSettings::default();
        assert_eq!(store.clothes_collection, "clothes");
        assert_eq!(store.profiles_collection, "user_profiles");
        assert_eq!(store.images_collection, "ai_recommendation_images");
        assert_eq!(store.page_size, 100);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }
}

//! Wardrobe AI - recognition and outfit recommendation pipelines
//!
//! This library turns garment photos into catalogable wardrobe items and a
//! user's wardrobe, profile and weather into outfit recommendations. It
//! drives the remote vision/text/image models, the document store and file
//! storage behind progress-reporting orchestrators.

pub mod config;
pub mod core;
pub mod imaging;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod services;

use std::sync::Arc;

use config::{LoggingSettings, Settings};
use services::{ArkClient, ConfigResolver, DocumentStore, FileStorage, WeatherClient};
use tracing_subscriber::EnvFilter;

// Re-export commonly used types
pub use models::{
    GarmentRecognition, GenerateOutfitRequest, OutfitRecommendation, ProfileStyleAnalysis,
    RecognizeGarmentRequest, RecognizeProfileStyleRequest,
};
pub use orchestrator::{RecognitionError, RecognitionOrchestrator, RecommendationOrchestrator};
pub use progress::{ProgressEvent, ProgressReporter, ProgressSink};

/// Assembled pipelines plus the persistence services hosts call directly
/// (saving recognized garments, profile fields, cleanup).
///
/// Remote clients are shared: both orchestrators reuse one config resolver
/// and one model client, so credentials are fetched once per instance.
pub struct WardrobeAi {
    pub recognition: RecognitionOrchestrator,
    pub recommendation: RecommendationOrchestrator,
    pub store: Arc<DocumentStore>,
    pub storage: Arc<FileStorage>,
}

impl WardrobeAi {
    pub fn new(settings: &Settings) -> Self {
        let resolver = Arc::new(ConfigResolver::new(settings.backend.clone()));
        let ark = Arc::new(ArkClient::new());
        let store = Arc::new(DocumentStore::new(&settings.store));
        let storage = Arc::new(FileStorage::new(&settings.storage));
        let weather = Arc::new(WeatherClient::new(&settings.weather));

        let recognition = RecognitionOrchestrator::new(settings, resolver.clone(), ark.clone());
        let recommendation = RecommendationOrchestrator::new(
            settings,
            resolver,
            ark,
            store.clone(),
            storage.clone(),
            weather,
        );

        tracing::info!("Wardrobe AI pipelines initialized");

        Self {
            recognition,
            recommendation,
            store,
            storage,
        }
    }
}

/// Initialize logging for hosts that do not bring their own subscriber.
/// `RUST_LOG` wins over the configured level; a second call is a no-op.
pub fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().try_init().ok();
    } else {
        subscriber.try_init().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipelines_assemble_from_default_settings() {
        let ai = WardrobeAi::new(&Settings::default());
        // The recommendation pipeline and the facade share the store.
        assert!(Arc::strong_count(&ai.store) >= 2);
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        let logging = LoggingSettings::default();
        init_tracing(&logging);
        init_tracing(&logging);
    }
}

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, Utc};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::config::{AiSettings, ProgressSettings, Settings};
use crate::core::{
    build_recommendation_prompt, default_plan, extract_generated_image_url, parse_model_json,
    resolve_combination, validate_outfit_plan, IMAGE_GENERATION_INSTRUCTION,
};
use crate::models::{
    BasedOn, GenerateOutfitRequest, GeneratedImageRecord, OutfitPlan, OutfitRecommendation,
    UserProfile,
};
use crate::orchestrator::is_retryable;
use crate::progress::{ProgressReporter, ProgressSink, ProgressTicker};
use crate::services::{
    ArkClient, ArkError, ChatCall, ChatConfig, ChatOutput, ConfigError, ConfigResolver,
    DocumentStore, FileStorage, StorageError, StoreError, WeatherClient,
};

/// Internal failure reasons for the recommendation pipeline. Callers never
/// see these: `generate` folds them into the seasonal fallback envelope.
#[derive(Debug, Error)]
enum RecommendationError {
    #[error("Model config unavailable: {0}")]
    Config(#[from] ConfigError),

    #[error("Model call failed: {0}")]
    Model(#[from] ArkError),

    #[error("Document store failed: {0}")]
    Store(#[from] StoreError),

    #[error("File storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Model response contained no parsable JSON")]
    Unparsable,

    #[error("Profile photo missing, cannot generate a personal outfit image")]
    MissingProfilePhoto,

    #[error("Image generation response contained no image URL")]
    NoImageUrl,
}

/// Drives the outfit recommendation pipeline: aggregate user data, build the
/// prompt, call the text model with retries, repair the plan, then generate
/// and re-host the outfit image.
///
/// Never fails past `generate` once input validation passes. A pipeline
/// failure produces the seasonal canned recommendation flagged with
/// `isFallback` and the cause; an image-stage failure degrades to the
/// configured default image while the recommendation itself stands.
pub struct RecommendationOrchestrator {
    resolver: Arc<ConfigResolver>,
    ark: Arc<ArkClient>,
    store: Arc<DocumentStore>,
    storage: Arc<FileStorage>,
    weather: Arc<WeatherClient>,
    ai: AiSettings,
    pacing: ProgressSettings,
}

impl RecommendationOrchestrator {
    pub fn new(
        settings: &Settings,
        resolver: Arc<ConfigResolver>,
        ark: Arc<ArkClient>,
        store: Arc<DocumentStore>,
        storage: Arc<FileStorage>,
        weather: Arc<WeatherClient>,
    ) -> Self {
        Self {
            resolver,
            ark,
            store,
            storage,
            weather,
            ai: settings.ai.clone(),
            pacing: settings.progress.clone(),
        }
    }

    /// Generate an outfit recommendation for one user.
    pub async fn generate(
        &self,
        request: &GenerateOutfitRequest,
        on_progress: Option<ProgressSink>,
    ) -> Result<OutfitRecommendation, validator::ValidationErrors> {
        request.validate()?;
        let reporter = ProgressReporter::new(on_progress);

        match self.try_generate(request, &reporter).await {
            Ok(recommendation) => Ok(recommendation),
            Err(e) => {
                tracing::error!("Recommendation pipeline failed, using seasonal default: {}", e);
                Ok(self.fallback_recommendation(e.to_string()).await)
            }
        }
    }

    async fn try_generate(
        &self,
        request: &GenerateOutfitRequest,
        reporter: &ProgressReporter,
    ) -> Result<OutfitRecommendation, RecommendationError> {
        reporter.emit("data", 0, "正在收集用户数据...");
        let weather_lookup = async {
            match (request.latitude, request.longitude) {
                (Some(lat), Some(lon)) => Some(self.weather.current(lat, lon).await),
                _ => None,
            }
        };
        let (profile, snapshot, weather) = tokio::join!(
            self.store.get_profile(&request.owner_id),
            self.store.wardrobe_snapshot(&request.owner_id),
            weather_lookup,
        );
        let profile = profile?;
        let snapshot = snapshot?;
        reporter.emit("data", 100, "用户数据收集完成");
        tracing::debug!(
            "Collected profile and {} wardrobe items for {}",
            snapshot.total_items,
            request.owner_id
        );

        reporter.emit("config", 0, "正在获取AI配置...");
        let config = self.resolver.chat_config().await?;
        reporter.emit("config", 100, "AI配置获取完成");

        reporter.emit("prompt", 0, "正在构建推荐提示词...");
        let prompt = build_recommendation_prompt(
            Some(&profile),
            &snapshot,
            weather.as_ref(),
            Local::now().date_naive(),
        );
        reporter.emit("prompt", 100, "提示词构建完成");

        reporter.emit("generation", 0, "AI正在生成推荐...");
        let ticker = ProgressTicker::spawn(
            reporter.clone(),
            "generation",
            "AI正在生成推荐...",
            &self.pacing,
        );
        let output = self.chat_with_retry(config, &prompt).await;
        drop(ticker);
        let output = output?;
        reporter.emit("generation", 100, "AI推荐生成完成");

        let raw = parse_model_json(&output.content).ok_or(RecommendationError::Unparsable)?;
        let mut plan = validate_outfit_plan(&raw);
        if plan.outfit_combination.is_empty() {
            plan.outfit_combination = resolve_combination(&plan.clothing_items, &snapshot);
        }

        reporter.emit("image", 0, "正在生成穿搭图片...");
        let image = match self.try_generate_image(&profile, &plan).await {
            Ok(file_id) => file_id,
            Err(e) => {
                tracing::warn!("Outfit image generation failed, using default image: {}", e);
                self.rehost_default_image().await
            }
        };
        reporter.emit("image", 100, "图片生成完成");

        Ok(OutfitRecommendation {
            plan,
            image: Some(image),
            generated_at: Utc::now(),
            based_on: BasedOn {
                user_style: profile.style_tags.clone(),
                user_tags: profile.tags.clone(),
                weather,
                wardrobe_count: snapshot.total_items,
            },
            is_fallback: false,
            error: None,
        })
    }

    /// Text-generation call with a bounded retry budget and linear backoff
    /// (attempt number times the backoff unit).
    async fn chat_with_retry(
        &self,
        config: &ChatConfig,
        prompt: &str,
    ) -> Result<ChatOutput, RecommendationError> {
        let call = ChatCall {
            text: prompt,
            image_data_uri: None,
            max_tokens: self.ai.max_tokens,
            temperature: self.ai.temperature,
            top_p: self.ai.top_p,
            timeout: Duration::from_millis(self.ai.timeout_ms),
        };

        let mut attempt = 1;
        loop {
            match self.ark.chat_completion(config, &call).await {
                Ok(output) => return Ok(output),
                Err(e) if attempt < self.ai.max_retries && is_retryable(&e) => {
                    let backoff = Duration::from_millis(
                        self.ai.backoff_unit_ms.saturating_mul(u64::from(attempt)),
                    );
                    tracing::warn!(
                        "Recommendation attempt {} failed, retrying in {}ms: {}",
                        attempt,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Generate a personal outfit image from the profile photo and the
    /// chosen combination, then re-host it. Best-effort: the caller maps any
    /// failure to the default image.
    async fn try_generate_image(
        &self,
        profile: &UserProfile,
        plan: &OutfitPlan,
    ) -> Result<String, RecommendationError> {
        let photo = profile
            .profile_photo
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(RecommendationError::MissingProfilePhoto)?;

        let config = self.resolver.image_config().await?;

        // First input is the identity reference; combination images follow
        // as styling references.
        let mut refs: Vec<String> = Vec::with_capacity(plan.outfit_combination.len() + 1);
        refs.push(photo.to_string());
        refs.extend(plan.outfit_combination.iter().cloned());
        let inputs = self.storage.to_fetchable_urls(&refs).await?;
        if inputs.is_empty() {
            return Err(RecommendationError::MissingProfilePhoto);
        }

        let body = self
            .ark
            .generate_image(config, IMAGE_GENERATION_INSTRUCTION, &inputs)
            .await?;
        let url = extract_generated_image_url(&body).ok_or(RecommendationError::NoImageUrl)?;
        self.rehost(&url, false).await
    }

    /// Download a provider URL and re-host it in own storage, recording
    /// provenance. The result must never reference an expiring provider link.
    async fn rehost(&self, url: &str, is_default: bool) -> Result<String, RecommendationError> {
        let bytes = self.storage.download(url).await?;
        let cloud_path = if is_default {
            format!(
                "ai_recommendation/default_outfits/default_outfit_{}.jpg",
                Uuid::new_v4()
            )
        } else {
            format!(
                "ai_recommendation/generated_outfits/ai_generated_{}.jpg",
                Uuid::new_v4()
            )
        };
        let file_id = self.storage.upload(&cloud_path, bytes).await?;
        self.store
            .record_generated_image(&GeneratedImageRecord::new(
                file_id.clone(),
                cloud_path,
                is_default,
            ))
            .await;
        Ok(file_id)
    }

    /// Re-host the configured default outfit image; when storage is down the
    /// raw URL is better than no image at all.
    async fn rehost_default_image(&self) -> String {
        match self.rehost(&self.ai.default_image_url, true).await {
            Ok(file_id) => file_id,
            Err(e) => {
                tracing::warn!("Failed to re-host default outfit image: {}", e);
                self.ai.default_image_url.clone()
            }
        }
    }

    /// Seasonal canned recommendation used when the pipeline fails outright.
    async fn fallback_recommendation(&self, error: String) -> OutfitRecommendation {
        OutfitRecommendation {
            plan: default_plan(Local::now().month()),
            image: Some(self.rehost_default_image().await),
            generated_at: Utc::now(),
            based_on: BasedOn::default(),
            is_fallback: true,
            error: Some(error),
        }
    }
}

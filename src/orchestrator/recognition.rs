use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::config::{AiSettings, ProgressSettings, Settings};
use crate::core::{
    parse_model_json, reclassify, validate_garment, validate_profile_style, GARMENT_INSTRUCTION,
    PROFILE_STYLE_INSTRUCTION,
};
use crate::imaging::{ImagePreprocessor, ImageProcessingError};
use crate::models::{
    GarmentRecognition, ProfileStyleAnalysis, RecognizeGarmentRequest, RecognizeProfileStyleRequest,
    TokenUsage,
};
use crate::orchestrator::is_retryable;
use crate::progress::{ProgressReporter, ProgressSink, ProgressTicker};
use crate::services::{ArkClient, ArkError, ChatCall, ConfigError, ConfigResolver};

/// Errors that can occur during photo recognition
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("Image processing failed: {0}")]
    Image(#[from] ImageProcessingError),

    #[error("Model config unavailable: {0}")]
    Config(#[from] ConfigError),

    #[error("Model call failed: {0}")]
    Model(#[from] ArkError),

    #[error("Model response contained no parsable JSON")]
    Unparsable,
}

/// Drives the photo recognition pipeline: compress, resolve config, call the
/// vision model with retries, parse and repair the result.
///
/// The two public entry points share the pipeline but not the failure
/// contract: garment recognition degrades to a synthetic success so the
/// save/display flow stays unblocked, while profile-style recognition
/// surfaces its errors to the caller.
pub struct RecognitionOrchestrator {
    preprocessor: ImagePreprocessor,
    resolver: Arc<ConfigResolver>,
    ark: Arc<ArkClient>,
    ai: AiSettings,
    pacing: ProgressSettings,
}

impl RecognitionOrchestrator {
    pub fn new(settings: &Settings, resolver: Arc<ConfigResolver>, ark: Arc<ArkClient>) -> Self {
        Self {
            preprocessor: ImagePreprocessor::from_settings(&settings.compression),
            resolver,
            ark,
            ai: settings.ai.clone(),
            pacing: settings.progress.clone(),
        }
    }

    /// Recognize a garment photo into a catalogable item.
    ///
    /// Fails only on an invalid request or an unreadable local image. Every
    /// remote failure (config, network, timeout, unparsable content) is
    /// folded into the synthetic fallback envelope with `confidence` 0.0 and
    /// the cause in `error`.
    pub async fn recognize_garment(
        &self,
        request: &RecognizeGarmentRequest,
        on_progress: Option<ProgressSink>,
    ) -> Result<GarmentRecognition, RecognitionError> {
        request.validate()?;
        let reporter = ProgressReporter::new(on_progress);

        match self
            .run_vision_call(Path::new(&request.image_path), GARMENT_INSTRUCTION, &reporter)
            .await
        {
            Ok((raw, usage)) => {
                let mut result = validate_garment(&raw);
                reclassify(&mut result);
                result.usage = usage;
                Ok(result)
            }
            Err(RecognitionError::Image(e)) => Err(RecognitionError::Image(e)),
            Err(e) => {
                tracing::warn!("Garment recognition failed, returning fallback result: {}", e);
                Ok(GarmentRecognition::fallback(e.to_string()))
            }
        }
    }

    /// Analyze a profile photo for style tags and body characteristics.
    /// Unlike garment recognition, failures here propagate to the caller.
    pub async fn recognize_profile_style(
        &self,
        request: &RecognizeProfileStyleRequest,
        on_progress: Option<ProgressSink>,
    ) -> Result<ProfileStyleAnalysis, RecognitionError> {
        request.validate()?;
        let reporter = ProgressReporter::new(on_progress);

        let (raw, usage) = self
            .run_vision_call(
                Path::new(&request.image_path),
                PROFILE_STYLE_INSTRUCTION,
                &reporter,
            )
            .await?;
        let mut analysis = validate_profile_style(&raw);
        analysis.usage = usage;
        Ok(analysis)
    }

    /// Shared pipeline: compression, config, vision call with bounded retry,
    /// JSON extraction. Emits the stage milestones and synthetic ticks while
    /// the model call is in flight.
    async fn run_vision_call(
        &self,
        image_path: &Path,
        instruction: &str,
        reporter: &ProgressReporter,
    ) -> Result<(Value, Option<TokenUsage>), RecognitionError> {
        let started = Instant::now();

        reporter.emit("compression", 0, "正在压缩图片...");
        let compressed = self.preprocessor.compress_to_base64(image_path)?;
        reporter.emit("compression", 100, "图片压缩完成");

        reporter.emit("config", 0, "正在获取AI配置...");
        let config = self.resolver.chat_config().await?;
        reporter.emit("config", 100, "配置获取完成");

        reporter.emit("recognition", 0, "AI正在分析图片...");
        let ticker = ProgressTicker::spawn(
            reporter.clone(),
            "recognition",
            "AI正在分析图片...",
            &self.pacing,
        );

        let data_uri = compressed.data_uri();
        let call = ChatCall {
            text: instruction,
            image_data_uri: Some(&data_uri),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            timeout: Duration::from_millis(config.timeout_ms),
        };

        let mut attempt = 0;
        let output = loop {
            match self.ark.chat_completion(config, &call).await {
                Ok(output) => break output,
                Err(e) if attempt < config.retry_count && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "Vision call attempt {} failed, retrying in {}ms: {}",
                        attempt,
                        self.ai.recognition_backoff_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(self.ai.recognition_backoff_ms)).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        drop(ticker);
        reporter.emit("recognition", 100, "识别完成");

        tracing::info!(
            "Vision call finished in {}ms ({}KB encoded at quality {})",
            started.elapsed().as_millis(),
            compressed.encoded_len() / 1024,
            compressed.quality
        );

        let raw = parse_model_json(&output.content).ok_or(RecognitionError::Unparsable)?;
        Ok((raw, output.usage))
    }
}

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use thiserror::Error;

use crate::config::CompressionSettings;

/// Errors that can occur while preparing an image for upload
#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),
}

/// One compression tier: applies when the size estimate exceeds `min_kb`.
#[derive(Debug, Clone, Copy)]
pub struct CompressionTier {
    pub min_kb: u64,
    pub quality: f32,
    pub max_dimension: u32,
}

/// Tiered compression rules, ordered from largest threshold down. Larger
/// sources get lower quality and a smaller bounding dimension.
#[derive(Debug, Clone)]
pub struct CompressionPolicy {
    pub tiers: Vec<CompressionTier>,
    pub base: CompressionTier,
    pub min_quality: f32,
    pub max_quality: f32,
    pub retry_quality_step: f32,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                CompressionTier {
                    min_kb: 1000,
                    quality: 0.5,
                    max_dimension: 800,
                },
                CompressionTier {
                    min_kb: 500,
                    quality: 0.6,
                    max_dimension: 1024,
                },
                CompressionTier {
                    min_kb: 200,
                    quality: 0.7,
                    max_dimension: 1200,
                },
            ],
            base: CompressionTier {
                min_kb: 0,
                quality: 0.8,
                max_dimension: 1500,
            },
            min_quality: 0.3,
            max_quality: 0.9,
            retry_quality_step: 0.2,
        }
    }
}

/// Parameters for one encode pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    pub quality: f32,
    pub max_dimension: u32,
}

/// A prepared image payload plus what it took to produce it.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub base64: String,
    pub quality: f32,
    pub max_dimension: u32,
    pub estimated_kb: u64,
    pub retried: bool,
}

impl CompressedImage {
    /// Inline attachment form expected by the vision endpoint.
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.base64)
    }

    pub fn encoded_len(&self) -> usize {
        self.base64.len()
    }
}

/// Shrinks photos to a payload the recognition endpoint accepts
///
/// Picks a quality/dimension tier from a cheap size estimate, encodes once,
/// and re-encodes at most one more time when the payload is still over
/// budget.
pub struct ImagePreprocessor {
    policy: CompressionPolicy,
    target_max_bytes: usize,
}

impl ImagePreprocessor {
    pub fn new(policy: CompressionPolicy, target_max_kb: u32) -> Self {
        Self {
            policy,
            target_max_bytes: target_max_kb as usize * 1024,
        }
    }

    pub fn from_settings(settings: &CompressionSettings) -> Self {
        Self::new(CompressionPolicy::default(), settings.target_max_kb)
    }

    /// Approximate decoded size from the header dimensions alone, without a
    /// full decode: `width x height x 3 / 1024` KB.
    pub fn estimate_size_kb(&self, path: &Path) -> Result<u64, ImageProcessingError> {
        let (width, height) = image::image_dimensions(path)?;
        Ok(u64::from(width) * u64::from(height) * 3 / 1024)
    }

    /// Pick the encode parameters for a given size estimate.
    pub fn plan(&self, estimated_kb: u64) -> CompressOptions {
        let tier = self
            .policy
            .tiers
            .iter()
            .find(|tier| estimated_kb > tier.min_kb)
            .unwrap_or(&self.policy.base);
        CompressOptions {
            quality: tier
                .quality
                .clamp(self.policy.min_quality, self.policy.max_quality),
            max_dimension: tier.max_dimension,
        }
    }

    /// Full preparation pass: estimate, pick a tier, encode, and re-encode
    /// once at reduced quality if the payload is still over budget.
    pub fn compress_to_base64(&self, path: &Path) -> Result<CompressedImage, ImageProcessingError> {
        let estimated_kb = self.estimate_size_kb(path)?;
        let options = self.plan(estimated_kb);
        let source = image::open(path)?;

        let mut quality = options.quality;
        let mut encoded = encode_jpeg_base64(&source, quality, options.max_dimension)?;
        let mut retried = false;

        if encoded.len() > self.target_max_bytes && quality > self.policy.min_quality {
            quality = (quality - self.policy.retry_quality_step).max(self.policy.min_quality);
            encoded = encode_jpeg_base64(&source, quality, options.max_dimension)?;
            retried = true;
        }

        tracing::debug!(
            "Compressed image: estimate {}KB, quality {}, max dim {}, encoded {} bytes, retried: {}",
            estimated_kb,
            quality,
            options.max_dimension,
            encoded.len(),
            retried
        );

        Ok(CompressedImage {
            base64: encoded,
            quality,
            max_dimension: options.max_dimension,
            estimated_kb,
            retried,
        })
    }
}

/// Resize to fit the bounding dimension (aspect preserved, never upscaled)
/// and JPEG-encode at the given quality.
fn encode_jpeg_base64(
    source: &image::DynamicImage,
    quality: f32,
    max_dimension: u32,
) -> Result<String, ImageProcessingError> {
    let (width, height) = source.dimensions();
    let rgb = if width > max_dimension || height > max_dimension {
        source
            .resize(max_dimension, max_dimension, FilterType::Triangle)
            .to_rgb8()
    } else {
        source.to_rgb8()
    };

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, (quality * 100.0).round() as u8);
    rgb.write_with_encoder(encoder)?;
    Ok(BASE64.encode(&bytes))
}

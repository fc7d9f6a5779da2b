use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to recognize a garment photo.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecognizeGarmentRequest {
    /// Local path of the photo to analyze.
    #[validate(length(min = 1, message = "image path must not be empty"))]
    #[serde(alias = "image_path", rename = "imagePath")]
    pub image_path: String,
}

impl RecognizeGarmentRequest {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
        }
    }
}

/// Request to recognize the style of a profile photo.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecognizeProfileStyleRequest {
    #[validate(length(min = 1, message = "image path must not be empty"))]
    #[serde(alias = "image_path", rename = "imagePath")]
    pub image_path: String,
}

impl RecognizeProfileStyleRequest {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
        }
    }
}

/// Request to generate an outfit recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateOutfitRequest {
    #[validate(length(min = 1, message = "owner id must not be empty"))]
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: String,
    /// Location for the weather lookup; omitted means fallback weather.
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl GenerateOutfitRequest {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_location(owner_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            owner_id: owner_id.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_path_rejected() {
        let request = RecognizeGarmentRequest::new("");
        assert!(request.validate().is_err());

        let request = RecognizeGarmentRequest::new("/tmp/photo.jpg");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_outfit_request_location_bounds() {
        let request = GenerateOutfitRequest::with_location("owner-1", 31.23, 121.47);
        assert!(request.validate().is_ok());

        let request = GenerateOutfitRequest::with_location("owner-1", 123.0, 0.0);
        assert!(request.validate().is_err());
    }
}

use serde::{Deserialize, Serialize};

use crate::models::domain::{Category, UserAnalysis, WeatherInfo};

/// Validated garment recognition result.
///
/// Always well-formed: failures are folded into a synthetic result carrying
/// `confidence` 0.0 plus `error`/`message` markers instead of propagating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentRecognition {
    pub name: String,
    pub category: Category,
    pub style: String,
    pub color: String,
    #[serde(rename = "stylingAdvice")]
    pub styling_advice: String,
    pub tags: Vec<String>,
    pub confidence: f32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl GarmentRecognition {
    /// Synthetic result returned when the remote call ultimately failed.
    /// Keeps the save/display flow unblocked while flagging the failure.
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            name: "识别失败".to_string(),
            category: Category::Top,
            style: "识别失败".to_string(),
            color: "无法识别".to_string(),
            styling_advice: "AI识别遇到问题，建议重新拍照或选择手动搭配".to_string(),
            tags: vec!["识别失败".to_string(), "请重试".to_string()],
            confidence: 0.0,
            error: Some(error.into()),
            message: Some("识别失败，请重试".to_string()),
            usage: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Validated profile-photo style analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStyleAnalysis {
    #[serde(rename = "styleTags")]
    pub style_tags: Vec<String>,
    pub confidence: f32,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "userInfo", default)]
    pub user_info: UserAnalysis,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Provider-side token accounting, passed through when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Validated outfit plan returned by the text-generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitPlan {
    #[serde(rename = "outfitTitle")]
    pub outfit_title: String,
    #[serde(rename = "outfitDescription")]
    pub outfit_description: String,
    #[serde(rename = "outfitStyle")]
    pub outfit_style: String,
    #[serde(rename = "outfitTags")]
    pub outfit_tags: Vec<String>,
    /// Human-readable item labels such as `上衣1` or `top2`.
    #[serde(rename = "clothingItems")]
    pub clothing_items: Vec<String>,
    #[serde(rename = "stylingTips")]
    pub styling_tips: String,
    /// Image references for the chosen combination.
    #[serde(rename = "outfitCombination")]
    pub outfit_combination: Vec<String>,
    pub confidence: f32,
}

/// Final recommendation handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitRecommendation {
    #[serde(flatten)]
    pub plan: OutfitPlan,
    /// Reference into this system's own storage, never a provider URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "generatedAt")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "basedOn")]
    pub based_on: BasedOn,
    #[serde(rename = "isFallback", default)]
    pub is_fallback: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the recommendation was conditioned on, for traceability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasedOn {
    #[serde(rename = "userStyle")]
    pub user_style: Vec<String>,
    #[serde(rename = "userTags")]
    pub user_tags: Vec<String>,
    #[serde(default)]
    pub weather: Option<WeatherInfo>,
    #[serde(rename = "wardrobeCount")]
    pub wardrobe_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_recognition_shape() {
        let result = GarmentRecognition::fallback("请求超时");
        assert_eq!(result.name, "识别失败");
        assert_eq!(result.category, Category::Top);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.error.as_deref(), Some("请求超时"));
        assert!(result.is_fallback());
    }

    #[test]
    fn test_category_serializes_as_code() {
        let result = GarmentRecognition::fallback("x");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["category"], 1);
        assert_eq!(json["stylingAdvice"], result.styling_advice);
    }

    #[test]
    fn test_recommendation_flattens_plan() {
        let recommendation = OutfitRecommendation {
            plan: OutfitPlan {
                outfit_title: "测试穿搭".to_string(),
                outfit_description: "描述".to_string(),
                outfit_style: "简约".to_string(),
                outfit_tags: vec!["简约".to_string()],
                clothing_items: vec!["上衣1".to_string()],
                styling_tips: "提示".to_string(),
                outfit_combination: vec!["cloud://a.jpg".to_string()],
                confidence: 0.8,
            },
            image: Some("cloud://generated.jpg".to_string()),
            generated_at: chrono::Utc::now(),
            based_on: BasedOn::default(),
            is_fallback: false,
            error: None,
        };
        let json = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(json["outfitTitle"], "测试穿搭");
        assert_eq!(json["isFallback"], false);
        assert_eq!(json["basedOn"]["wardrobeCount"], 0);
    }
}

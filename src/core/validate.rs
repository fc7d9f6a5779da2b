use serde_json::Value;

use crate::models::domain::{Category, UserAnalysis};
use crate::models::responses::{GarmentRecognition, OutfitPlan, ProfileStyleAnalysis};

/// Normalize a raw garment payload. Total: any input (null, non-object,
/// wrong-typed fields) yields a well-formed result via the documented
/// defaults.
pub fn validate_garment(raw: &Value) -> GarmentRecognition {
    GarmentRecognition {
        name: string_or(raw, "name", "未知衣服"),
        category: category_or_default(raw.get("category")),
        style: string_or(raw, "style", "未知风格"),
        color: string_or(raw, "color", "未知颜色"),
        styling_advice: string_or(raw, "stylingAdvice", "建议搭配简约风格"),
        tags: string_array_or(raw.get("tags"), || vec!["未知".to_string()]),
        confidence: confidence_or(raw.get("confidence"), 0.5),
        error: None,
        message: None,
        usage: None,
    }
}

/// Normalize a raw profile-style payload. Total like [`validate_garment`].
pub fn validate_profile_style(raw: &Value) -> ProfileStyleAnalysis {
    let user_info = raw
        .get("userInfo")
        .cloned()
        .and_then(|value| serde_json::from_value::<UserAnalysis>(value).ok())
        .unwrap_or_default();

    ProfileStyleAnalysis {
        style_tags: string_array_or(raw.get("styleTags"), Vec::new),
        confidence: confidence_or(raw.get("confidence"), 0.5),
        description: string_or(raw, "description", ""),
        user_info,
        usage: None,
    }
}

/// Normalize a raw outfit plan. Arrays are kept as-is when present (even
/// empty); missing or wrong-typed fields fall back to the defaults.
pub fn validate_outfit_plan(raw: &Value) -> OutfitPlan {
    OutfitPlan {
        outfit_title: string_or(raw, "outfitTitle", "推荐穿搭"),
        outfit_description: string_or(raw, "outfitDescription", "为您精心搭配的穿搭方案"),
        outfit_style: string_or(raw, "outfitStyle", "时尚风"),
        outfit_tags: string_array_or(raw.get("outfitTags"), || vec!["时尚".to_string()]),
        clothing_items: string_array_or(raw.get("clothingItems"), || {
            vec!["推荐单品".to_string()]
        }),
        styling_tips: string_or(raw, "stylingTips", "建议搭配简约风格"),
        outfit_combination: string_array_or(raw.get("outfitCombination"), Vec::new),
        confidence: confidence_or(raw.get("confidence"), 0.5),
    }
}

fn string_or(raw: &Value, key: &str, default: &str) -> String {
    match raw.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Arrays are kept when present (string elements only); anything else takes
/// the default.
fn string_array_or<F: FnOnce() -> Vec<String>>(value: Option<&Value>, default: F) -> Vec<String> {
    match value.and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => default(),
    }
}

fn confidence_or(value: Option<&Value>, default: f32) -> f32 {
    match value.and_then(Value::as_f64) {
        Some(c) => (c as f32).clamp(0.0, 1.0),
        None => default,
    }
}

/// Category codes outside the canonical enum collapse to tops.
fn category_or_default(value: Option<&Value>) -> Category {
    value
        .and_then(Value::as_u64)
        .and_then(|code| u8::try_from(code).ok())
        .and_then(Category::from_code)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_garment_defaults_for_null() {
        let result = validate_garment(&Value::Null);
        assert_eq!(result.name, "未知衣服");
        assert_eq!(result.category, Category::Top);
        assert_eq!(result.style, "未知风格");
        assert_eq!(result.color, "未知颜色");
        assert_eq!(result.styling_advice, "建议搭配简约风格");
        assert_eq!(result.tags, vec!["未知"]);
        assert_eq!(result.confidence, 0.5);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_garment_defaults_for_wrong_types() {
        let raw = json!({
            "name": 42,
            "category": "上衣",
            "style": null,
            "tags": "休闲",
            "confidence": "high"
        });
        let result = validate_garment(&raw);
        assert_eq!(result.name, "未知衣服");
        assert_eq!(result.category, Category::Top);
        assert_eq!(result.tags, vec!["未知"]);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_garment_keeps_valid_fields() {
        let raw = json!({
            "name": "白色衬衫",
            "category": 5,
            "style": "简约",
            "color": "白色",
            "stylingAdvice": "配牛仔裤",
            "tags": ["正式", "百搭"],
            "confidence": 0.92
        });
        let result = validate_garment(&raw);
        assert_eq!(result.name, "白色衬衫");
        assert_eq!(result.category, Category::Shoes);
        assert_eq!(result.tags, vec!["正式", "百搭"]);
        assert!((result.confidence - 0.92).abs() < 1e-6);
    }

    #[test]
    fn test_garment_out_of_range_category() {
        let raw = json!({ "category": 12 });
        assert_eq!(validate_garment(&raw).category, Category::Top);
        let raw = json!({ "category": 0 });
        assert_eq!(validate_garment(&raw).category, Category::Top);
    }

    #[test]
    fn test_confidence_clamped() {
        let raw = json!({ "confidence": 3.7 });
        assert_eq!(validate_garment(&raw).confidence, 1.0);
        let raw = json!({ "confidence": -0.4 });
        assert_eq!(validate_garment(&raw).confidence, 0.0);
    }

    #[test]
    fn test_profile_style_defaults() {
        let result = validate_profile_style(&json!({}));
        assert!(result.style_tags.is_empty());
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.user_info.age, "未知");
    }

    #[test]
    fn test_profile_style_partial_user_info() {
        let raw = json!({
            "styleTags": ["简约", "通勤"],
            "confidence": 0.8,
            "userInfo": { "age": "25岁", "gender": "女" }
        });
        let result = validate_profile_style(&raw);
        assert_eq!(result.style_tags, vec!["简约", "通勤"]);
        assert_eq!(result.user_info.age, "25岁");
        assert_eq!(result.user_info.hair_style, "未知");
    }

    #[test]
    fn test_outfit_plan_defaults_for_non_object() {
        let plan = validate_outfit_plan(&json!("not an object"));
        assert_eq!(plan.outfit_title, "推荐穿搭");
        assert_eq!(plan.outfit_style, "时尚风");
        assert_eq!(plan.outfit_tags, vec!["时尚"]);
        assert_eq!(plan.clothing_items, vec!["推荐单品"]);
        assert!(plan.outfit_combination.is_empty());
        assert_eq!(plan.confidence, 0.5);
    }

    #[test]
    fn test_outfit_plan_keeps_present_empty_arrays() {
        let plan = validate_outfit_plan(&json!({
            "outfitTags": [],
            "clothingItems": [],
            "outfitCombination": []
        }));
        assert!(plan.outfit_tags.is_empty());
        assert!(plan.clothing_items.is_empty());
        assert!(plan.outfit_combination.is_empty());
    }
}

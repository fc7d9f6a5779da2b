use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel for analysis fields the model could not determine.
pub const UNKNOWN: &str = "未知";

/// Canonical garment category.
///
/// Stored in documents as the numeric code (`categoryId`) alongside the
/// display name (`classify`). Earlier data used narrower code sets; anything
/// outside this enum is treated as invalid and defaulted during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Category {
    Top,
    Outerwear,
    Dress,
    Bottom,
    Shoes,
    Accessory,
    Underwear,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Top,
        Category::Outerwear,
        Category::Dress,
        Category::Bottom,
        Category::Shoes,
        Category::Accessory,
        Category::Underwear,
    ];

    /// Numeric code used in stored documents and AI payloads.
    pub fn code(self) -> u8 {
        match self {
            Category::Top => 1,
            Category::Outerwear => 2,
            Category::Dress => 3,
            Category::Bottom => 4,
            Category::Shoes => 5,
            Category::Accessory => 6,
            Category::Underwear => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Category> {
        match code {
            1 => Some(Category::Top),
            2 => Some(Category::Outerwear),
            3 => Some(Category::Dress),
            4 => Some(Category::Bottom),
            5 => Some(Category::Shoes),
            6 => Some(Category::Accessory),
            7 => Some(Category::Underwear),
            _ => None,
        }
    }

    /// Display name shown in the app and used in recommendation prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Top => "上衣",
            Category::Outerwear => "外套",
            Category::Dress => "裙装",
            Category::Bottom => "裤装",
            Category::Shoes => "鞋子",
            Category::Accessory => "配饰",
            Category::Underwear => "内衣",
        }
    }

    /// ASCII slug accepted in item labels alongside the display name.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Outerwear => "outerwear",
            Category::Dress => "dress",
            Category::Bottom => "bottom",
            Category::Shoes => "shoes",
            Category::Accessory => "accessory",
            Category::Underwear => "underwear",
        }
    }

    /// Resolve a label prefix such as `上衣` or `top` (case-insensitive).
    pub fn from_label_prefix(prefix: &str) -> Option<Category> {
        let trimmed = prefix.trim().trim_end_matches('-');
        Category::ALL.iter().copied().find(|c| {
            trimmed == c.display_name() || trimmed.eq_ignore_ascii_case(c.slug())
        })
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Top
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> u8 {
        category.code()
    }
}

impl TryFrom<u8> for Category {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Category::from_code(code).ok_or_else(|| format!("invalid category code: {}", code))
    }
}

/// One wardrobe garment document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardrobeItem {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_openid", default)]
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    /// Display name of the category, denormalized next to the code.
    #[serde(default)]
    pub classify: String,
    #[serde(rename = "categoryId", default = "default_category_code")]
    pub category_id: u8,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub details: String,
    #[serde(rename = "stylingAdvice", default)]
    pub styling_advice: String,
    /// Space-joined tag string, the persisted convention.
    #[serde(default)]
    pub tags: String,
    /// Image reference: own-storage ref or plain URL.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub imagefrom: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(rename = "aiGenerated", default)]
    pub ai_generated: bool,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(rename = "isDeleted", default)]
    pub is_deleted: bool,
    #[serde(rename = "addTime", default)]
    pub add_time: Option<String>,
    #[serde(rename = "createTime", default)]
    pub create_time: Option<chrono::DateTime<chrono::Utc>>,
}

fn default_category_code() -> u8 {
    1
}
fn default_status() -> String {
    "active".to_string()
}

impl WardrobeItem {
    /// Typed category, defaulting invalid stored codes to tops.
    pub fn category(&self) -> Category {
        Category::from_code(self.category_id).unwrap_or_default()
    }

    /// Tags as a list (persisted space-joined).
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.split_whitespace().map(str::to_string).collect()
    }

    pub fn has_image(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// User profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_openid", default)]
    pub owner_id: String,
    #[serde(rename = "nickName", default)]
    pub nick_name: String,
    #[serde(rename = "avatarUrl", default)]
    pub avatar_url: String,
    #[serde(default)]
    pub gender: i32,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub language: String,
    #[serde(rename = "profilePhoto", default)]
    pub profile_photo: Option<String>,
    #[serde(rename = "styleTags", default)]
    pub style_tags: Vec<String>,
    /// Wear-preference tags set directly by the user.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "userAnalysis", default)]
    pub user_analysis: Option<UserAnalysis>,
    #[serde(rename = "createTime", default)]
    pub create_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "updateTime", default)]
    pub update_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl UserProfile {
    /// Profile created lazily for users who have not saved anything yet.
    pub fn default_for(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            nick_name: "微信用户".to_string(),
            avatar_url: "/images/default-avatar.svg".to_string(),
            gender: 0,
            country: String::new(),
            province: String::new(),
            city: String::new(),
            language: "zh_CN".to_string(),
            profile_photo: None,
            style_tags: Vec::new(),
            tags: Vec::new(),
            user_analysis: None,
            create_time: None,
            update_time: None,
        }
    }
}

/// Free-form result of profile-photo recognition. Every field defaults to
/// the unknown sentinel and prompt construction skips unknown fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnalysis {
    #[serde(default = "default_unknown")]
    pub age: String,
    #[serde(default = "default_unknown")]
    pub gender: String,
    #[serde(default = "default_unknown")]
    pub height: String,
    #[serde(default = "default_unknown")]
    pub weight: String,
    #[serde(rename = "bodyType", default = "default_unknown")]
    pub body_type: String,
    #[serde(rename = "skinTone", default = "default_unknown")]
    pub skin_tone: String,
    #[serde(rename = "faceShape", default = "default_unknown")]
    pub face_shape: String,
    #[serde(rename = "hairStyle", default = "default_unknown")]
    pub hair_style: String,
}

fn default_unknown() -> String {
    UNKNOWN.to_string()
}

impl Default for UserAnalysis {
    fn default() -> Self {
        Self {
            age: default_unknown(),
            gender: default_unknown(),
            height: default_unknown(),
            weight: default_unknown(),
            body_type: default_unknown(),
            skin_tone: default_unknown(),
            face_shape: default_unknown(),
            hair_style: default_unknown(),
        }
    }
}

/// Whether an analysis field carries a real value.
pub fn is_known(value: &str) -> bool {
    !value.is_empty() && value != UNKNOWN
}

/// Current weather used to condition recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub temperature: i32,
    #[serde(rename = "weather")]
    pub condition: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl Default for WeatherInfo {
    fn default() -> Self {
        Self {
            temperature: 25,
            condition: "晴天".to_string(),
            location: None,
        }
    }
}

/// Per-category grouping of one user's wardrobe plus frequency stats.
#[derive(Debug, Clone, Default)]
pub struct WardrobeSnapshot {
    pub total_items: usize,
    pub groups: Vec<CategoryGroup>,
    pub top_colors: Vec<String>,
    pub top_styles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub category: Category,
    pub items: Vec<WardrobeItem>,
}

impl WardrobeSnapshot {
    /// Group items per canonical category and rank the five most frequent
    /// colors and styles. Group order follows the enum; item order within a
    /// group follows the input.
    pub fn build(items: Vec<WardrobeItem>) -> Self {
        let total_items = items.len();
        let mut buckets: HashMap<Category, Vec<WardrobeItem>> = HashMap::new();
        let mut colors: Vec<(String, usize)> = Vec::new();
        let mut styles: Vec<(String, usize)> = Vec::new();

        for item in items {
            tally(&mut colors, non_empty_or_unknown(&item.color));
            tally(&mut styles, non_empty_or_unknown(&item.style));
            buckets.entry(item.category()).or_default().push(item);
        }

        let groups = Category::ALL
            .iter()
            .filter_map(|category| {
                buckets.remove(category).map(|items| CategoryGroup {
                    category: *category,
                    items,
                })
            })
            .collect();

        Self {
            total_items,
            groups,
            top_colors: top_five(colors),
            top_styles: top_five(styles),
        }
    }

    pub fn group(&self, category: Category) -> Option<&[WardrobeItem]> {
        self.groups
            .iter()
            .find(|g| g.category == category)
            .map(|g| g.items.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

fn non_empty_or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

fn tally(counts: &mut Vec<(String, usize)>, key: String) {
    match counts.iter_mut().find(|(k, _)| *k == key) {
        Some((_, n)) => *n += 1,
        None => counts.push((key, 1)),
    }
}

fn top_five(mut counts: Vec<(String, usize)>) -> Vec<String> {
    // Stable sort keeps first-seen order between equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(5).map(|(k, _)| k).collect()
}

/// Provenance record for a re-hosted generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImageRecord {
    #[serde(rename = "fileID")]
    pub file_id: String,
    #[serde(rename = "cloudPath")]
    pub cloud_path: String,
    #[serde(rename = "type")]
    pub kind: GeneratedImageKind,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "isDefault")]
    pub is_default: bool,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedImageKind {
    AiGenerated,
    DefaultOutfit,
}

impl GeneratedImageRecord {
    pub fn new(file_id: String, cloud_path: String, is_default: bool) -> Self {
        Self {
            file_id,
            cloud_path,
            kind: if is_default {
                GeneratedImageKind::DefaultOutfit
            } else {
                GeneratedImageKind::AiGenerated
            },
            created_at: chrono::Utc::now(),
            is_default,
            description: if is_default {
                "AI推荐默认搭配图片".to_string()
            } else {
                "AI生成搭配图片".to_string()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_item(name: &str, category_id: u8, color: &str, style: &str) -> WardrobeItem {
        WardrobeItem {
            id: format!("item-{}", name),
            owner_id: "owner-1".to_string(),
            name: name.to_string(),
            classify: String::new(),
            category_id,
            style: style.to_string(),
            color: color.to_string(),
            material: "棉".to_string(),
            details: String::new(),
            styling_advice: String::new(),
            tags: "休闲 百搭".to_string(),
            url: format!("cloud://{}.jpg", name),
            imagefrom: "ai_recognition".to_string(),
            confidence: 0.9,
            ai_generated: true,
            status: "active".to_string(),
            is_deleted: false,
            add_time: None,
            create_time: None,
        }
    }

    #[test]
    fn test_category_codes_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
        assert_eq!(Category::from_code(0), None);
        assert_eq!(Category::from_code(8), None);
    }

    #[test]
    fn test_category_label_prefix() {
        assert_eq!(Category::from_label_prefix("上衣"), Some(Category::Top));
        assert_eq!(Category::from_label_prefix("shoes"), Some(Category::Shoes));
        assert_eq!(Category::from_label_prefix("Shoes"), Some(Category::Shoes));
        assert_eq!(Category::from_label_prefix("top-"), Some(Category::Top));
        assert_eq!(Category::from_label_prefix("风衣"), None);
    }

    #[test]
    fn test_item_invalid_category_defaults_to_top() {
        let item = create_test_item("旧数据", 99, "白色", "休闲");
        assert_eq!(item.category(), Category::Top);
    }

    #[test]
    fn test_tag_list_splits_space_joined() {
        let item = create_test_item("衬衫", 1, "白色", "简约");
        assert_eq!(item.tag_list(), vec!["休闲", "百搭"]);
    }

    #[test]
    fn test_snapshot_groups_and_counts() {
        let items = vec![
            create_test_item("白衬衫", 1, "白色", "简约"),
            create_test_item("牛仔裤", 4, "蓝色", "休闲"),
            create_test_item("T恤", 1, "白色", "休闲"),
        ];
        let snapshot = WardrobeSnapshot::build(items);

        assert_eq!(snapshot.total_items, 3);
        assert_eq!(snapshot.group(Category::Top).map(<[_]>::len), Some(2));
        assert_eq!(snapshot.group(Category::Bottom).map(<[_]>::len), Some(1));
        assert_eq!(snapshot.group(Category::Shoes), None);
        // 白色 appears twice and ranks first.
        assert_eq!(snapshot.top_colors[0], "白色");
        assert_eq!(snapshot.top_styles[0], "休闲");
    }

    #[test]
    fn test_snapshot_blank_color_counts_as_unknown() {
        let items = vec![create_test_item("神秘单品", 6, " ", "")];
        let snapshot = WardrobeSnapshot::build(items);
        assert_eq!(snapshot.top_colors, vec![UNKNOWN.to_string()]);
        assert_eq!(snapshot.top_styles, vec![UNKNOWN.to_string()]);
    }

    #[test]
    fn test_default_profile_fields() {
        let profile = UserProfile::default_for("owner-9");
        assert_eq!(profile.owner_id, "owner-9");
        assert_eq!(profile.nick_name, "微信用户");
        assert_eq!(profile.language, "zh_CN");
        assert!(profile.style_tags.is_empty());
    }

    #[test]
    fn test_unknown_analysis_fields() {
        let analysis = UserAnalysis::default();
        assert!(!is_known(&analysis.age));
        assert!(is_known("25岁"));
        assert!(!is_known(""));
    }
}

use crate::models::responses::OutfitPlan;

/// Meteorological season by calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Months 3-5 spring, 6-8 summer, 9-11 autumn, everything else winter.
    pub const fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// Canned recommendation used when generation fails outright. The caller
/// marks the result as a fallback; the plan itself is a complete, valid
/// recommendation for the season.
pub fn default_plan(month: u32) -> OutfitPlan {
    let (title, description, style, tags, items, tips) = match Season::from_month(month) {
        Season::Spring => (
            "春日清新风",
            "适合春季的清新穿搭，展现活力与优雅",
            "清新风",
            vec!["清新", "优雅", "春季"],
            vec!["白色衬衫", "浅色针织衫", "牛仔裤", "小白鞋"],
            "选择浅色系搭配，营造清新自然的春日氛围",
        ),
        Season::Summer => (
            "夏日清爽风",
            "适合夏季的清爽穿搭，舒适又时尚",
            "清爽风",
            vec!["清爽", "舒适", "夏季"],
            vec!["白色T恤", "短裤", "凉鞋", "遮阳帽"],
            "选择透气轻薄的面料，注意防晒和舒适度",
        ),
        Season::Autumn => (
            "秋日温暖风",
            "适合秋季的温暖穿搭，展现成熟魅力",
            "温暖风",
            vec!["温暖", "成熟", "秋季"],
            vec!["针织衫", "长裤", "靴子", "围巾"],
            "选择暖色调搭配，注意保暖和层次感",
        ),
        Season::Winter => (
            "冬日优雅风",
            "适合冬季的优雅穿搭，保暖又时尚",
            "优雅风",
            vec!["优雅", "保暖", "冬季"],
            vec!["大衣", "毛衣", "长裤", "靴子"],
            "选择深色系搭配，注意保暖和质感",
        ),
    };

    OutfitPlan {
        outfit_title: title.to_string(),
        outfit_description: description.to_string(),
        outfit_style: style.to_string(),
        outfit_tags: tags.into_iter().map(str::to_string).collect(),
        clothing_items: items.into_iter().map(str::to_string).collect(),
        styling_tips: tips.to_string(),
        outfit_combination: vec!["1.png".to_string(), "2.png".to_string(), "3.png".to_string()],
        confidence: 0.7,
    }
}

use crate::models::domain::Category;
use crate::models::responses::GarmentRecognition;

/// One re-categorization rule: if any keyword appears in the item's text,
/// the item moves to the target category.
pub struct CategoryRule {
    pub target: Category,
    pub keywords: &'static [&'static str],
}

/// Ordered correction table for categories the upstream model gets wrong.
/// First matching rule wins. English keywords are matched lowercase.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        target: Category::Underwear,
        keywords: &[
            "睡衣", "睡裙", "睡袍", "家居服", "pajama", "pyjama", "nightgown", "loungewear",
        ],
    },
    CategoryRule {
        target: Category::Underwear,
        keywords: &["袜", "sock", "stocking"],
    },
    CategoryRule {
        target: Category::Underwear,
        keywords: &["内衣", "内裤", "文胸", "胸罩", "underwear", "bra", "briefs", "panties"],
    },
    CategoryRule {
        target: Category::Shoes,
        keywords: &["鞋", "靴", "shoe", "boot", "sneaker", "sandal", "slipper"],
    },
    CategoryRule {
        target: Category::Accessory,
        keywords: &[
            "包", "帽", "围巾", "项链", "手链", "耳环", "腰带", "bag", "hat", "scarf",
            "necklace", "bracelet", "earring", "belt",
        ],
    },
];

/// Deterministic category correction over the recognition text fields.
/// Returns the first rule hit, or the item's own (already validated)
/// category when nothing matches. Pure and idempotent.
pub fn classify(result: &GarmentRecognition) -> Category {
    let haystack = searchable_text(result);
    for rule in CATEGORY_RULES {
        if rule
            .keywords
            .iter()
            .any(|keyword| haystack.contains(keyword))
        {
            return rule.target;
        }
    }
    result.category
}

/// Apply the correction pass in place.
pub fn reclassify(result: &mut GarmentRecognition) {
    result.category = classify(result);
}

fn searchable_text(result: &GarmentRecognition) -> String {
    let mut text = String::with_capacity(
        result.name.len() + result.style.len() + result.styling_advice.len() + 16,
    );
    text.push_str(&result.name);
    text.push(' ');
    text.push_str(&result.style);
    text.push(' ');
    text.push_str(&result.styling_advice);
    for tag in &result.tags {
        text.push(' ');
        text.push_str(tag);
    }
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_result(name: &str, category: Category, tags: &[&str]) -> GarmentRecognition {
        GarmentRecognition {
            name: name.to_string(),
            category,
            style: "休闲".to_string(),
            color: "白色".to_string(),
            styling_advice: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            confidence: 0.8,
            error: None,
            message: None,
            usage: None,
        }
    }

    #[test]
    fn test_sleepwear_moves_to_underwear() {
        let result = create_test_result("丝绸睡衣套装", Category::Top, &[]);
        assert_eq!(classify(&result), Category::Underwear);
    }

    #[test]
    fn test_socks_move_to_underwear() {
        let result = create_test_result("白色长筒袜", Category::Accessory, &[]);
        assert_eq!(classify(&result), Category::Underwear);
    }

    #[test]
    fn test_footwear_moves_to_shoes() {
        let result = create_test_result("帆布鞋", Category::Top, &[]);
        assert_eq!(classify(&result), Category::Shoes);

        let result = create_test_result("Martin Boots", Category::Top, &[]);
        assert_eq!(classify(&result), Category::Shoes);
    }

    #[test]
    fn test_keyword_in_tags_fires() {
        let result = create_test_result("小物", Category::Top, &["项链", "饰品"]);
        assert_eq!(classify(&result), Category::Accessory);
    }

    #[test]
    fn test_first_rule_wins() {
        // 睡衣-style keyword and footwear keyword together: the earlier
        // sleepwear rule decides.
        let result = create_test_result("睡衣配拖鞋套装", Category::Top, &[]);
        assert_eq!(classify(&result), Category::Underwear);
    }

    #[test]
    fn test_no_match_keeps_category() {
        let result = create_test_result("白色衬衫", Category::Top, &[]);
        assert_eq!(classify(&result), Category::Top);
    }

    #[test]
    fn test_english_match_is_case_insensitive() {
        let result = create_test_result("Leather BAG", Category::Top, &[]);
        assert_eq!(classify(&result), Category::Accessory);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let mut result = create_test_result("运动袜三双装", Category::Top, &[]);
        reclassify(&mut result);
        let once = result.category;
        reclassify(&mut result);
        assert_eq!(result.category, once);
        assert_eq!(once, Category::Underwear);
    }
}

use std::sync::OnceLock;

use regex::Regex;

use crate::models::domain::{Category, WardrobeSnapshot};

/// Labels are `{category}{n}` with a 1-based index, e.g. `上衣1` or `top2`.
fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.+?)(\d+)$").expect("valid label pattern"))
}

/// Parse one item label into a category and 0-based index within that
/// category's group. Returns `None` for labels that do not follow the
/// convention, unknown category prefixes, or a zero index.
pub fn parse_item_label(label: &str) -> Option<(Category, usize)> {
    let captures = label_pattern().captures(label.trim())?;
    let category = Category::from_label_prefix(captures.get(1)?.as_str())?;
    let index: usize = captures.get(2)?.as_str().parse().ok()?;
    Some((category, index.checked_sub(1)?))
}

/// Resolve generated item labels against the wardrobe snapshot, collecting
/// each matched item's image ref. Labels that fail to parse, point past the
/// group, or land on an image-less item are skipped. When nothing resolves,
/// placeholder names are emitted so downstream handling still sees a
/// combination of the expected shape.
pub fn resolve_combination(labels: &[String], snapshot: &WardrobeSnapshot) -> Vec<String> {
    let mut refs = Vec::new();
    for label in labels {
        if let Some((category, index)) = parse_item_label(label) {
            if let Some(items) = snapshot.group(category) {
                if let Some(item) = items.get(index) {
                    if item.has_image() {
                        refs.push(item.url.clone());
                    }
                }
            }
        }
    }

    if refs.is_empty() {
        let count = labels.len().min(3);
        refs = (1..=count).map(|i| format!("placeholder_{}.jpg", i)).collect();
    }

    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::WardrobeItem;

    fn create_test_item(category_id: u8, url: &str) -> WardrobeItem {
        WardrobeItem {
            id: String::new(),
            owner_id: String::new(),
            name: "测试".to_string(),
            classify: String::new(),
            category_id,
            style: String::new(),
            color: String::new(),
            material: String::new(),
            details: String::new(),
            styling_advice: String::new(),
            tags: String::new(),
            url: url.to_string(),
            imagefrom: String::new(),
            confidence: 0.5,
            ai_generated: false,
            status: "active".to_string(),
            is_deleted: false,
            add_time: None,
            create_time: None,
        }
    }

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_chinese_label() {
        assert_eq!(parse_item_label("上衣1"), Some((Category::Top, 0)));
        assert_eq!(parse_item_label("配饰2"), Some((Category::Accessory, 1)));
    }

    #[test]
    fn test_parse_slug_label() {
        assert_eq!(parse_item_label("top3"), Some((Category::Top, 2)));
        assert_eq!(parse_item_label("Shoes1"), Some((Category::Shoes, 0)));
    }

    #[test]
    fn test_parse_rejects_bad_labels() {
        assert_eq!(parse_item_label("上衣"), None);
        assert_eq!(parse_item_label("42"), None);
        assert_eq!(parse_item_label("帽子1"), None);
        // 1-based convention, so index zero is out of range.
        assert_eq!(parse_item_label("top0"), None);
    }

    #[test]
    fn test_resolve_picks_urls_by_group_and_index() {
        let snapshot = WardrobeSnapshot::build(vec![
            create_test_item(1, "u1"),
            create_test_item(5, "skip"),
            create_test_item(5, "u2"),
        ]);
        let refs = resolve_combination(&labels(&["top1", "shoes2"]), &snapshot);
        assert_eq!(refs, vec!["u1".to_string(), "u2".to_string()]);
    }

    #[test]
    fn test_resolve_skips_out_of_range_and_imageless() {
        let snapshot =
            WardrobeSnapshot::build(vec![create_test_item(1, " "), create_test_item(1, "u2")]);
        let refs = resolve_combination(&labels(&["上衣1", "上衣2", "上衣9"]), &snapshot);
        assert_eq!(refs, vec!["u2".to_string()]);
    }

    #[test]
    fn test_resolve_placeholders_when_nothing_matches() {
        let snapshot = WardrobeSnapshot::default();
        let refs = resolve_combination(&labels(&["上衣1", "裤装1", "鞋子1", "配饰1"]), &snapshot);
        assert_eq!(
            refs,
            vec![
                "placeholder_1.jpg".to_string(),
                "placeholder_2.jpg".to_string(),
                "placeholder_3.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_resolve_empty_labels_yield_no_placeholders() {
        let snapshot = WardrobeSnapshot::default();
        assert!(resolve_combination(&[], &snapshot).is_empty());
    }
}

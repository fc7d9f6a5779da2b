use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::domain::{is_known, UserProfile, WardrobeSnapshot, WeatherInfo, UNKNOWN};

/// Instruction sent with a garment photo. Asks for the fixed JSON field set
/// with the canonical category legend.
pub const GARMENT_INSTRUCTION: &str = "请分析这张图片中的衣服，返回JSON格式的结果，包含以下字段：\
name(衣服名称), category(类别：1-上衣,2-外套,3-裙装,4-裤装,5-鞋子,6-配饰,7-内衣), \
style(风格), color(颜色), stylingAdvice(搭配建议), tags(标签数组), confidence(置信度0-1)。\
请确保返回的是有效的JSON格式。";

/// Instruction sent with a profile photo.
pub const PROFILE_STYLE_INSTRUCTION: &str = "请分析这张个人形象照的穿搭风格，返回JSON格式的结果，包含以下字段：\
styleTags(穿搭风格标签数组), confidence(置信度0-1), description(整体风格描述), \
userInfo(包含age(年龄), gender(性别), height(身高), weight(体重), bodyType(体型), \
skinTone(肤色), faceShape(脸型), hairStyle(发型)，无法判断的字段填\"未知\")。\
请确保返回的是有效的JSON格式。";

/// Fixed instruction for the image-generation call. The first input image is
/// the sole identity reference; everything else is styling material only.
pub const IMAGE_GENERATION_INSTRUCTION: &str = "\
**Image requirements:**
- Generate one high-quality, full-body outfit showcase photo
- **The person must be generated strictly from the FIRST input image (my profile photo), with no deviation**
- Show the complete outfit: top, bottoms, accessories
- Keep the background clean so the outfit stands out
- Natural lighting, true-to-life colors
- If the person wears no makeup, add a light, natural makeup look consistent with the profile photo
- Sharp image with rich detail
- The overall look must match the recommended outfit style
- **The generated person must be the same person as in the first input image**
- The outfit must match the recommended items and style exactly
- **Important: no text, labels, watermarks, or captions of any kind, just a pure outfit showcase photo**

**Key rules:**
- **The first input image is my personal profile photo and the ONLY identity reference**
- **The remaining input images are the recommended garment pieces, for styling reference only**
- **Never generate a random or different person**
- **If the person in the first image cannot be identified, refuse to generate**
- The outfit must reflect the specific recommended pieces and their style";

const WEEKDAYS: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAYS[weekday.num_days_from_monday() as usize]
}

/// Assemble the recommendation prompt: date, weather, profile, wardrobe
/// inventory, then the fixed JSON instruction.
pub fn build_recommendation_prompt(
    profile: Option<&UserProfile>,
    snapshot: &WardrobeSnapshot,
    weather: Option<&WeatherInfo>,
    date: NaiveDate,
) -> String {
    let mut prompt = format!(
        "今天是{}月{}号，{}。",
        date.month(),
        date.day(),
        weekday_name(date.weekday())
    );

    if let Some(weather) = weather {
        prompt.push_str(&format!(
            "当前天气：{}，温度{}°C。",
            weather.condition, weather.temperature
        ));
    }

    if let Some(profile) = profile {
        if !profile.style_tags.is_empty() {
            prompt.push_str(&format!(
                "根据我的形象照分析，我喜欢的穿搭风格类型为：{}。",
                profile.style_tags.join("、")
            ));
        }

        if let Some(analysis) = &profile.user_analysis {
            prompt.push_str("根据我的形象照详细分析，我的个人信息如下：");
            let fields = [
                ("年龄", &analysis.age),
                ("性别", &analysis.gender),
                ("身高", &analysis.height),
                ("体重", &analysis.weight),
                ("体型", &analysis.body_type),
                ("肤色", &analysis.skin_tone),
                ("脸型", &analysis.face_shape),
                ("发型", &analysis.hair_style),
            ];
            for (label, value) in fields {
                if is_known(value) {
                    prompt.push_str(&format!("{}：{}；", label, value));
                }
            }
        }

        if !profile.tags.is_empty() {
            prompt.push_str(&format!(
                "我平时偏好的穿搭标签有：{}。",
                profile.tags.join("、")
            ));
        }
    }

    if snapshot.is_empty() {
        prompt.push_str("我的衣橱中暂时没有衣服，请推荐一些基础款穿搭。");
    } else {
        prompt.push_str(&format!(
            "我的衣橱中有{}件衣服，具体如下：",
            snapshot.total_items
        ));

        let mut item_index = 1usize;
        for group in &snapshot.groups {
            if group.items.is_empty() {
                continue;
            }
            prompt.push_str(&format!("{}：", group.category.display_name()));
            for item in &group.items {
                prompt.push_str(&describe_item(item_index, item));
                prompt.push('\n');
                item_index += 1;
            }
            prompt.push('\n');
        }
    }

    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}

fn describe_item(index: usize, item: &crate::models::domain::WardrobeItem) -> String {
    let name = fallback(&item.name, "未命名");
    let color = fallback(&item.color, UNKNOWN);
    let material = fallback(&item.material, UNKNOWN);
    let style = fallback(&item.style, UNKNOWN);

    let mut line = format!("{}、{}{}", index, color, name);
    line.push_str(&format!("（{}材质）", material));
    line.push_str(&format!("，风格：{}", style));
    if item.has_image() {
        line.push_str(&format!("，图片为：{}", item.url));
    } else {
        line.push_str("，图片为：暂无图片");
    }
    if !item.details.trim().is_empty() {
        line.push_str(&format!("，{}", item.details));
    }
    if !item.styling_advice.trim().is_empty() {
        line.push_str(&format!("。{}", item.styling_advice));
    }
    if !item.tags.trim().is_empty() {
        line.push_str(&format!("；标签：{}", item.tags));
    }
    line
}

fn fallback<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

const CLOSING_INSTRUCTION: &str = "请根据以上详细的衣服信息帮我推荐今天应该怎么穿搭比较适合。\
每件衣服都包含了从数据库中获取的真实信息，包括颜色、名称、材质、风格、详细描述、搭配建议和标签等。

请返回JSON格式的结果，包含以下字段：
- outfitTitle: 穿搭标题
- outfitDescription: 穿搭描述
- outfitStyle: 穿搭风格
- outfitTags: 风格标签数组
- clothingItems: 推荐的单品列表（包含具体的衣服编号，如：上衣1、配饰2等）
- stylingTips: 详细的搭配建议（结合每件衣服的搭配建议，给出具体的穿搭指导）
- outfitCombination: 穿搭组合图片数组（返回推荐的穿搭组合图片的完整URL路径，如：[\"https://example.com/image1.jpg\", \"https://example.com/image2.jpg\"]）
- confidence: 推荐置信度(0-1)

**重要：outfitCombination字段是必需的，必须返回一个包含具体图片URL路径的数组，这些路径应该对应推荐的衣服组合中的具体图片。例如：[\"https://example.com/shirt1.jpg\", \"https://example.com/pants1.jpg\"]**

请确保返回的是有效的JSON格式，并且穿搭组合图片数组要包含具体的图片URL路径。搭配建议要详细具体，参考每件衣服的搭配建议来给出专业的穿搭指导。";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{UserAnalysis, WardrobeItem};

    fn create_test_item(name: &str, category_id: u8, color: &str) -> WardrobeItem {
        WardrobeItem {
            id: String::new(),
            owner_id: String::new(),
            name: name.to_string(),
            classify: String::new(),
            category_id,
            style: "休闲".to_string(),
            color: color.to_string(),
            material: "棉".to_string(),
            details: String::new(),
            styling_advice: "适合通勤".to_string(),
            tags: "百搭".to_string(),
            url: "https://cdn.example.com/a.jpg".to_string(),
            imagefrom: String::new(),
            confidence: 0.9,
            ai_generated: false,
            status: "active".to_string(),
            is_deleted: false,
            add_time: None,
            create_time: None,
        }
    }

    fn test_date() -> NaiveDate {
        // 2024-06-01 is a Saturday.
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_date_and_weekday_line() {
        let snapshot = WardrobeSnapshot::default();
        let prompt = build_recommendation_prompt(None, &snapshot, None, test_date());
        assert!(prompt.starts_with("今天是6月1号，周六。"));
    }

    #[test]
    fn test_weather_line() {
        let snapshot = WardrobeSnapshot::default();
        let weather = WeatherInfo {
            temperature: 18,
            condition: "多云".to_string(),
            location: None,
        };
        let prompt = build_recommendation_prompt(None, &snapshot, Some(&weather), test_date());
        assert!(prompt.contains("当前天气：多云，温度18°C。"));
    }

    #[test]
    fn test_unknown_analysis_fields_skipped() {
        let mut profile = UserProfile::default_for("owner-1");
        profile.user_analysis = Some(UserAnalysis {
            age: "25岁".to_string(),
            gender: "女".to_string(),
            ..UserAnalysis::default()
        });
        let snapshot = WardrobeSnapshot::default();
        let prompt = build_recommendation_prompt(Some(&profile), &snapshot, None, test_date());
        assert!(prompt.contains("年龄：25岁；"));
        assert!(prompt.contains("性别：女；"));
        assert!(!prompt.contains("身高"));
        assert!(!prompt.contains(UNKNOWN));
    }

    #[test]
    fn test_wardrobe_lines_with_running_index() {
        let snapshot = WardrobeSnapshot::build(vec![
            create_test_item("白衬衫", 1, "白色"),
            create_test_item("牛仔裤", 4, "蓝色"),
        ]);
        let prompt = build_recommendation_prompt(None, &snapshot, None, test_date());
        assert!(prompt.contains("我的衣橱中有2件衣服"));
        assert!(prompt.contains("上衣：1、白色白衬衫（棉材质），风格：休闲"));
        // The index keeps running across category groups.
        assert!(prompt.contains("裤装：2、蓝色牛仔裤"));
        assert!(prompt.contains("图片为：https://cdn.example.com/a.jpg"));
        assert!(prompt.contains("；标签：百搭"));
    }

    #[test]
    fn test_missing_image_marked() {
        let mut item = create_test_item("旧外套", 2, "黑色");
        item.url = String::new();
        let snapshot = WardrobeSnapshot::build(vec![item]);
        let prompt = build_recommendation_prompt(None, &snapshot, None, test_date());
        assert!(prompt.contains("图片为：暂无图片"));
    }

    #[test]
    fn test_empty_wardrobe_line() {
        let snapshot = WardrobeSnapshot::default();
        let prompt = build_recommendation_prompt(None, &snapshot, None, test_date());
        assert!(prompt.contains("我的衣橱中暂时没有衣服，请推荐一些基础款穿搭。"));
    }

    #[test]
    fn test_closing_instruction_present() {
        let snapshot = WardrobeSnapshot::default();
        let prompt = build_recommendation_prompt(None, &snapshot, None, test_date());
        assert!(prompt.contains("outfitTitle"));
        assert!(prompt.contains("outfitCombination字段是必需的"));
        assert!(prompt.ends_with("专业的穿搭指导。"));
    }
}

// Pure logic exports
pub mod classify;
pub mod extract;
pub mod outfit;
pub mod prompt;
pub mod season;
pub mod sse;
pub mod validate;

pub use classify::{classify, reclassify};
pub use extract::{extract_json_object, parse_model_json};
pub use outfit::{parse_item_label, resolve_combination};
pub use prompt::{
    build_recommendation_prompt, GARMENT_INSTRUCTION, IMAGE_GENERATION_INSTRUCTION,
    PROFILE_STYLE_INSTRUCTION,
};
pub use season::{default_plan, Season};
pub use sse::{extract_generated_image_url, parse_events, SseEvent};
pub use validate::{validate_garment, validate_outfit_plan, validate_profile_style};

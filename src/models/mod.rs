// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    is_known, Category, CategoryGroup, GeneratedImageKind, GeneratedImageRecord, UserAnalysis,
    UserProfile, WardrobeItem, WardrobeSnapshot, WeatherInfo, UNKNOWN,
};
pub use requests::{GenerateOutfitRequest, RecognizeGarmentRequest, RecognizeProfileStyleRequest};
pub use responses::{
    BasedOn, GarmentRecognition, OutfitPlan, OutfitRecommendation, ProfileStyleAnalysis, TokenUsage,
};

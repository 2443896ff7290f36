pub mod harmony;
pub mod matcher;
pub mod scorer;
pub mod service;
pub mod types;

pub use matcher::OutfitMatcher;
pub use scorer::OutfitScorer;
pub use service::OutfitMatchingService;
pub use types::{ClosetItem, FeatureMatch, OutfitItemRequest, OutfitMatchResult, OutfitRecommendation, Weather};

use indexmap::IndexMap;

use super::matcher::OutfitMatcher;
use super::scorer::OutfitScorer;
use super::types::{ClosetItem, OutfitItemRequest, OutfitMatchResult, OutfitRecommendation, Weather};
use crate::config::MatchingSettings;

const TOP_CATEGORIES: &[&str] = &["top", "tops"];
const BOTTOM_CATEGORIES: &[&str] = &["bottom", "bottoms"];
const SHOE_CATEGORIES: &[&str] = &["shoes"];
const OUTERWEAR_CATEGORIES: &[&str] = &["layering", "outerwear", "formal"];
const ACCESSORY_CATEGORIES: &[&str] = &["accessory", "accessories", "formal"];

/// Wardrobe grouped by lower-cased category, in first-seen order.
struct Wardrobe<'a> {
    by_category: IndexMap<String, Vec<&'a ClosetItem>>,
}

impl<'a> Wardrobe<'a> {
    fn new(items: &'a [ClosetItem]) -> Self {
        let mut by_category: IndexMap<String, Vec<&'a ClosetItem>> = IndexMap::new();
        for item in items {
            by_category
                .entry(item.category.trim().to_lowercase())
                .or_default()
                .push(item);
        }
        Self { by_category }
    }

    fn candidates(&self, categories: &[&str]) -> Vec<&'a ClosetItem> {
        categories
            .iter()
            .filter_map(|c| self.by_category.get(*c))
            .flatten()
            .copied()
            .collect()
    }
}

/// Matches a whole suggested outfit against a wardrobe and scores it.
#[derive(Debug, Clone, Copy)]
pub struct OutfitMatchingService {
    matcher: OutfitMatcher,
    scorer: OutfitScorer,
    default_weather: Weather,
}

impl Default for OutfitMatchingService {
    fn default() -> Self {
        Self::new(OutfitMatcher::default(), Weather::Mild)
    }
}

impl OutfitMatchingService {
    pub fn new(matcher: OutfitMatcher, default_weather: Weather) -> Self {
        Self {
            matcher,
            scorer: OutfitScorer::new(),
            default_weather,
        }
    }

    pub fn from_settings(settings: &MatchingSettings) -> Self {
        Self::new(
            OutfitMatcher::new(settings.min_match_score),
            Weather::parse(&settings.default_weather),
        )
    }

    pub fn default_weather(&self) -> Weather {
        self.default_weather
    }

    /// `weather` falls back to the configured default.
    pub fn match_outfit(
        &self,
        recommendation: &OutfitRecommendation,
        wardrobe: &[ClosetItem],
        weather: Option<Weather>,
        style_preference: Option<&str>,
    ) -> OutfitMatchResult {
        let weather = weather.unwrap_or(self.default_weather);
        if wardrobe.is_empty() {
            tracing::warn!("Wardrobe is empty; nothing to match");
            return OutfitMatchResult::default();
        }

        let closet = Wardrobe::new(wardrobe);
        tracing::debug!(
            "Matching outfit in {} weather across categories {:?}",
            weather,
            closet.by_category.keys().collect::<Vec<_>>()
        );

        let slot = |request: &Option<OutfitItemRequest>, categories: &[&str]| {
            request.as_ref().and_then(|r| {
                self.matcher
                    .match_slot(r, closet.candidates(categories), weather, style_preference)
            })
        };

        let mut result = OutfitMatchResult {
            top: slot(&recommendation.top, TOP_CATEGORIES),
            bottom: slot(&recommendation.bottom, BOTTOM_CATEGORIES),
            shoes: slot(&recommendation.shoes, SHOE_CATEGORIES),
            outerwear: slot(&recommendation.outerwear, OUTERWEAR_CATEGORIES),
            accessories: recommendation
                .accessories
                .iter()
                .filter_map(|r| {
                    self.matcher.match_slot(
                        r,
                        closet.candidates(ACCESSORY_CATEGORIES),
                        weather,
                        style_preference,
                    )
                })
                .collect(),
            ..OutfitMatchResult::default()
        };

        result = self.scorer.score(result, style_preference);
        result.missing_categories = missing_categories(recommendation, &result);

        tracing::info!("Outfit matching completed with overall score {:.3}", result.overall_score);
        if !result.missing_categories.is_empty() {
            tracing::info!("Missing categories: {:?}", result.missing_categories);
        }
        result
    }
}

fn missing_categories(recommendation: &OutfitRecommendation, result: &OutfitMatchResult) -> Vec<String> {
    let slots = [
        ("top", recommendation.top.is_some(), result.top.is_some()),
        ("bottom", recommendation.bottom.is_some(), result.bottom.is_some()),
        ("shoes", recommendation.shoes.is_some(), result.shoes.is_some()),
        ("outerwear", recommendation.outerwear.is_some(), result.outerwear.is_some()),
        (
            "accessories",
            !recommendation.accessories.is_empty(),
            result.accessories.len() >= recommendation.accessories.len(),
        ),
    ];

    slots
        .into_iter()
        .filter(|(_, requested, filled)| *requested && !*filled)
        .map(|(name, _, _)| name.to_string())
        .collect()
}

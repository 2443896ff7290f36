use std::collections::BTreeSet;

use super::types::{ClosetItem, FeatureMatch, OutfitItemRequest, Weather};

const STYLE_KEYWORDS: &[(&str, &[&str])] = &[
    ("casual", &["relaxed", "comfortable", "everyday", "denim", "sneakers", "cotton"]),
    ("formal", &["elegant", "sophisticated", "dress", "suit", "heels", "silk"]),
    ("business", &["professional", "structured", "blazer", "trousers", "leather"]),
    ("trendy", &["fashionable", "modern", "stylish", "contemporary", "designer"]),
    ("classic", &["timeless", "traditional", "conservative", "neutral", "basic"]),
    ("bohemian", &["flowy", "artistic", "ethnic", "layered", "natural"]),
    ("sporty", &["athletic", "active", "performance", "sneakers", "stretchy"]),
    ("edgy", &["bold", "unconventional", "leather", "dark", "statement"]),
];

const FEATURE_WEIGHT: f32 = 0.4;
const WEATHER_WEIGHT: f32 = 0.2;
const COLOR_WEIGHT: f32 = 0.2;
const STYLE_WEIGHT: f32 = 0.2;

/// Feature overlap when nothing specific was requested.
const EMPTY_REQUEST_SCORE: f32 = 0.5;
const NEUTRAL_WEATHER: f32 = 0.7;
const UNKNOWN_WEATHER: f32 = 0.8;
pub const NEUTRAL_STYLE: f32 = 0.8;
/// Outfit-level color harmony replaces this later.
const DEFAULT_COLOR: f32 = 0.8;
const STYLE_OVERLAP_FLOOR: f32 = 0.6;

pub fn style_keywords(style: &str) -> Option<&'static [&'static str]> {
    let style = style.trim().to_lowercase();
    STYLE_KEYWORDS
        .iter()
        .find(|(name, _)| *name == style)
        .map(|(_, keywords)| *keywords)
}

/// Fraction of requested features the item carries.
pub fn feature_score(target: &BTreeSet<String>, item: &BTreeSet<String>) -> f32 {
    if target.is_empty() {
        return EMPTY_REQUEST_SCORE;
    }
    target.intersection(item).count() as f32 / target.len() as f32
}

pub fn weather_score(features: &BTreeSet<String>, weather: Weather) -> f32 {
    if !weather.has_rules() {
        return UNKNOWN_WEATHER;
    }

    let suitable = weather.suitable();
    let unsuitable = weather.unsuitable();
    let mut good = 0usize;
    let mut bad = 0usize;
    for feature in features {
        if suitable.contains(&feature.as_str()) {
            good += 1;
        } else if unsuitable.contains(&feature.as_str()) {
            bad += 1;
        }
    }

    if good + bad == 0 {
        return NEUTRAL_WEATHER;
    }

    let mut score = good as f32 / (good + bad) as f32;
    if bad > 0 {
        score *= 1.0 - bad as f32 * 0.2;
    }
    score.clamp(0.0, 1.0)
}

pub fn style_score(features: &BTreeSet<String>, style_preference: Option<&str>) -> f32 {
    let Some(keywords) = style_preference.and_then(style_keywords) else {
        return NEUTRAL_STYLE;
    };

    let overlap = keywords.iter().filter(|k| features.contains(**k)).count();
    let mut score = overlap as f32 / keywords.len() as f32;
    if overlap > 0 {
        score = score.max(STYLE_OVERLAP_FLOOR);
    }
    score.min(1.0)
}

/// Scores wardrobe items against one requested outfit slot.
#[derive(Debug, Clone, Copy)]
pub struct OutfitMatcher {
    min_match_score: f32,
}

impl Default for OutfitMatcher {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl OutfitMatcher {
    pub fn new(min_match_score: f32) -> Self {
        Self { min_match_score }
    }

    pub fn min_match_score(&self) -> f32 {
        self.min_match_score
    }

    pub fn evaluate(
        &self,
        request: &OutfitItemRequest,
        item: &ClosetItem,
        weather: Weather,
        style_preference: Option<&str>,
    ) -> FeatureMatch {
        let target = &request.requested_features;
        let features = item.features();

        let matched_features: Vec<String> = target.intersection(&features).cloned().collect();
        let missing_features: Vec<String> = target.difference(&features).cloned().collect();

        let feature = feature_score(target, &features);
        let weather_compatibility = weather_score(&features, weather);
        let style_consistency = style_score(&features, style_preference);
        let color_coordination = DEFAULT_COLOR;

        let match_score = FEATURE_WEIGHT * feature
            + WEATHER_WEIGHT * weather_compatibility
            + COLOR_WEIGHT * color_coordination
            + STYLE_WEIGHT * style_consistency;
        let confidence =
            (matched_features.len() as f32 / (target.len() as f32 * 0.7).max(1.0)).min(1.0);

        FeatureMatch {
            item: item.clone(),
            match_score,
            matched_features,
            missing_features,
            confidence,
            weather_compatibility,
            color_coordination,
            style_consistency,
        }
    }

    /// Best candidate for the slot, or `None` when nothing reaches the
    /// minimum score. Ties keep the earlier candidate.
    pub fn match_slot<'a, I>(
        &self,
        request: &OutfitItemRequest,
        candidates: I,
        weather: Weather,
        style_preference: Option<&str>,
    ) -> Option<FeatureMatch>
    where
        I: IntoIterator<Item = &'a ClosetItem>,
    {
        let mut best: Option<FeatureMatch> = None;
        let mut evaluated = 0usize;

        for item in candidates {
            evaluated += 1;
            let candidate = self.evaluate(request, item, weather, style_preference);
            tracing::debug!(
                "{} candidate {}: score {:.3}",
                request.slot_type,
                item.id,
                candidate.match_score
            );
            let better = best
                .as_ref()
                .map_or(true, |current| candidate.match_score > current.match_score);
            if better {
                best = Some(candidate);
            }
        }

        match best {
            Some(found) if found.match_score >= self.min_match_score => Some(found),
            Some(found) => {
                tracing::warn!(
                    "No {} match above {}; best was {:.3}",
                    request.slot_type,
                    self.min_match_score,
                    found.match_score
                );
                None
            }
            None => {
                if evaluated == 0 {
                    tracing::warn!("No candidates available for {}", request.slot_type);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn blue_tee() -> ClosetItem {
        ClosetItem::new("top")
            .with_color("blue")
            .with_tags(["cotton", "casual"])
    }

    #[test]
    fn test_identical_features_overlap_fully() {
        let features = set(&["blue", "cotton", "top"]);
        assert_eq!(feature_score(&features, &features), 1.0);
        assert_eq!(feature_score(&set(&[]), &features), EMPTY_REQUEST_SCORE);
        assert!((feature_score(&set(&["blue", "silk"]), &features) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_weather_scores() {
        assert_eq!(weather_score(&set(&["cotton"]), Weather::Warm), 1.0);
        assert_eq!(weather_score(&set(&["blue"]), Weather::Warm), NEUTRAL_WEATHER);
        assert_eq!(weather_score(&set(&["wool"]), Weather::Mild), UNKNOWN_WEATHER);
        // one good, one bad: 0.5 * (1 - 0.2)
        assert!((weather_score(&set(&["cotton", "wool"]), Weather::Warm) - 0.4).abs() < 1e-6);
        // one good, two bad: 1/3 * (1 - 0.4)
        let cold = weather_score(&set(&["wool", "shorts", "sleeveless"]), Weather::Cold);
        assert!((cold - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_style_scores() {
        let features = set(&["cotton", "top"]);
        assert_eq!(style_score(&features, None), NEUTRAL_STYLE);
        assert_eq!(style_score(&features, Some("unknown")), NEUTRAL_STYLE);
        assert_eq!(style_score(&features, Some("Casual")), STYLE_OVERLAP_FLOOR);
        assert_eq!(style_score(&features, Some("formal")), 0.0);
    }

    #[test]
    fn test_evaluate() {
        let request = OutfitItemRequest::new("top", ["blue", "cotton", "casual"]);
        let found = OutfitMatcher::default().evaluate(&request, &blue_tee(), Weather::Warm, Some("casual"));

        assert_eq!(found.matched_features, vec!["blue", "casual", "cotton"]);
        assert!(found.missing_features.is_empty());
        assert_eq!(found.weather_compatibility, 1.0);
        assert_eq!(found.style_consistency, STYLE_OVERLAP_FLOOR);
        // 0.4 * 1.0 + 0.2 * 1.0 + 0.2 * 0.8 + 0.2 * 0.6
        assert!((found.match_score - 0.88).abs() < 1e-6);
        assert_eq!(found.confidence, 1.0);
    }

    #[test]
    fn test_partial_confidence() {
        let request = OutfitItemRequest::new("top", ["blue", "silk", "striped", "fitted"]);
        let found = OutfitMatcher::default().evaluate(&request, &blue_tee(), Weather::Mild, None);
        // one of four matched: 1 / (4 * 0.7)
        assert!((found.confidence - 1.0 / 2.8).abs() < 1e-6);
        assert_eq!(found.missing_features, vec!["fitted", "silk", "striped"]);
    }

    #[test]
    fn test_no_candidates() {
        let request = OutfitItemRequest::new("top", ["blue"]);
        let none: Vec<ClosetItem> = Vec::new();
        assert!(OutfitMatcher::default()
            .match_slot(&request, &none, Weather::Mild, None)
            .is_none());
    }

    #[test]
    fn test_best_candidate_wins_and_ties_keep_first() {
        let request = OutfitItemRequest::new("top", ["red", "silk"]);
        let first = ClosetItem::new("top").with_color("red");
        let twin = ClosetItem::new("top").with_color("red");
        let best = ClosetItem::new("top").with_color("red").with_tags(["silk"]);

        let matcher = OutfitMatcher::default();
        let found = matcher
            .match_slot(&request, &[first.clone(), twin.clone()], Weather::Mild, None)
            .unwrap();
        assert_eq!(found.item.id, first.id);

        let found = matcher
            .match_slot(&request, &[first, best.clone(), twin], Weather::Mild, None)
            .unwrap();
        assert_eq!(found.item.id, best.id);
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let request = OutfitItemRequest::new("top", ["red", "silk"]);
        let item = ClosetItem::new("top").with_color("green");
        // 0.4 * 0 + 0.2 * 0.8 + 0.2 * 0.8 + 0.2 * 0.8 = 0.48
        assert!(OutfitMatcher::new(0.5)
            .match_slot(&request, &[item.clone()], Weather::Mild, None)
            .is_none());
        assert!(OutfitMatcher::default()
            .match_slot(&request, &[item], Weather::Mild, None)
            .is_some());
    }
}

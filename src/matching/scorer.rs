use super::harmony::outfit_harmony;
use super::matcher::NEUTRAL_STYLE;
use super::types::OutfitMatchResult;

const MATCH_WEIGHT: f32 = 0.5;
const HARMONY_WEIGHT: f32 = 0.2;
const STYLE_WEIGHT: f32 = 0.15;
const WEATHER_WEIGHT: f32 = 0.15;
const MAX_VARIANCE_PENALTY: f32 = 0.2;

/// Combines the per-slot matches of one outfit into outfit-level scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutfitScorer;

impl OutfitScorer {
    pub fn new() -> Self {
        Self
    }

    /// Fills the aggregate scores of `result`; slots and missing categories
    /// are left as they are. An outfit without matches keeps zero scores.
    pub fn score(&self, mut result: OutfitMatchResult, style_preference: Option<&str>) -> OutfitMatchResult {
        let count = result.matches().count();
        if count == 0 {
            return result;
        }
        let n = count as f32;

        let mean_match = result.matches().map(|m| m.match_score).sum::<f32>() / n;
        let colors: Vec<String> = result
            .matches()
            .filter_map(|m| m.item.color.as_deref())
            .map(str::to_lowercase)
            .collect();
        let style_scores: Vec<f32> = result.matches().map(|m| m.style_consistency).collect();

        result.color_harmony_score = outfit_harmony(&colors);
        result.style_consistency_score = style_consistency(&style_scores, style_preference);
        result.weather_appropriateness = result.matches().map(|m| m.weather_compatibility).sum::<f32>() / n;
        result.overall_score = MATCH_WEIGHT * mean_match
            + HARMONY_WEIGHT * result.color_harmony_score
            + STYLE_WEIGHT * result.style_consistency_score
            + WEATHER_WEIGHT * result.weather_appropriateness;

        tracing::debug!(
            "Outfit scored {:.3} (harmony {:.3}, style {:.3}, weather {:.3})",
            result.overall_score,
            result.color_harmony_score,
            result.style_consistency_score,
            result.weather_appropriateness
        );
        result
    }
}

/// Mean style score minus a capped variance penalty.
pub fn style_consistency(scores: &[f32], style_preference: Option<&str>) -> f32 {
    if style_preference.is_none() || scores.is_empty() {
        return NEUTRAL_STYLE;
    }

    let n = scores.len() as f32;
    let mean = scores.iter().sum::<f32>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
    (mean - variance.min(MAX_VARIANCE_PENALTY)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::types::{ClosetItem, FeatureMatch};

    fn matched(color: Option<&str>, match_score: f32, weather: f32, style: f32) -> FeatureMatch {
        let mut item = ClosetItem::new("top");
        item.color = color.map(str::to_string);
        FeatureMatch {
            item,
            match_score,
            matched_features: Vec::new(),
            missing_features: Vec::new(),
            confidence: 1.0,
            weather_compatibility: weather,
            color_coordination: 0.8,
            style_consistency: style,
        }
    }

    #[test]
    fn test_empty_outfit_keeps_zero_scores() {
        let result = OutfitScorer::new().score(OutfitMatchResult::default(), Some("casual"));
        assert_eq!(result.overall_score, 0.0);
        assert_eq!(result.color_harmony_score, 0.0);
    }

    #[test]
    fn test_style_consistency() {
        assert_eq!(style_consistency(&[0.2, 1.0], None), NEUTRAL_STYLE);
        assert!((style_consistency(&[0.6, 0.6], Some("casual")) - 0.6).abs() < 1e-6);
        // mean 0.5, variance 0.25 capped at 0.2
        assert!((style_consistency(&[0.0, 1.0], Some("casual")) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_outfit_score() {
        let result = OutfitMatchResult {
            top: Some(matched(Some("Red"), 0.8, 1.0, 0.6)),
            bottom: Some(matched(Some("green"), 0.6, 0.6, 0.6)),
            shoes: Some(matched(None, 0.7, 0.8, 0.6)),
            ..OutfitMatchResult::default()
        };
        let scored = OutfitScorer::new().score(result, Some("casual"));

        assert!((scored.color_harmony_score - 0.85).abs() < 1e-6);
        assert!((scored.style_consistency_score - 0.6).abs() < 1e-6);
        assert!((scored.weather_appropriateness - 0.8).abs() < 1e-6);
        // 0.5 * 0.7 + 0.2 * 0.85 + 0.15 * 0.6 + 0.15 * 0.8
        assert!((scored.overall_score - 0.73).abs() < 1e-5);
    }

    #[test]
    fn test_single_color_is_neutral_harmony() {
        let result = OutfitMatchResult {
            top: Some(matched(Some("navy"), 0.5, 0.7, 0.8)),
            ..OutfitMatchResult::default()
        };
        let scored = OutfitScorer::new().score(result, None);
        assert!((scored.color_harmony_score - 0.8).abs() < 1e-6);
        assert!((scored.style_consistency_score - NEUTRAL_STYLE).abs() < 1e-6);
    }
}

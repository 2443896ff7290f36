use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const COMPLETE_OUTFIT: &str = "complete_outfit";

const DEFAULT_WEIGHTS: &[(&str, f32)] = &[
    ("top", 0.2),
    ("bottom", 0.2),
    ("shoes", 0.15),
    ("layering", 0.1),
    ("accessory", 0.05),
    (COMPLETE_OUTFIT, 0.4),
];

/// Weight for slots without a configured weight.
const FALLBACK_WEIGHT: f32 = 1.0;
const HYBRID_MARGIN: f32 = 15.0;
const HYBRID_MIN_SCORE: f32 = 30.0;
const COMPLETE_OUTFIT_BOOST: f32 = 1.2;
const COMPLETE_OUTFIT_BOOST_MIN: f32 = 60.0;

/// A style persona described by its feature vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleCategory {
    pub name: String,
    pub features: BTreeSet<String>,
}

impl StyleCategory {
    pub fn new<I, S>(name: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    /// Percentage of the item's features this category shares.
    pub fn item_score(&self, item_features: &BTreeSet<String>) -> f32 {
        if item_features.is_empty() || self.features.is_empty() {
            return 0.0;
        }
        item_features.intersection(&self.features).count() as f32 / item_features.len() as f32 * 100.0
    }
}

/// The item picked for one outfit slot of the visual quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSelection {
    pub slot: String,
    pub features: BTreeSet<String>,
}

impl SlotSelection {
    pub fn new<I, S>(slot: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slot: slot.into(),
            features: features.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedAssignment {
    pub primary_style: String,
    pub primary_score: f32,
    /// 0 to 100.
    pub confidence: f32,
    pub scores: IndexMap<String, f32>,
    pub hybrid_styles: Vec<String>,
}

/// Weighted feature-overlap scoring of quiz picks against style categories.
#[derive(Debug, Clone)]
pub struct WeightedStyleAssignment {
    weights: IndexMap<String, f32>,
}

impl Default for WeightedStyleAssignment {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS
                .iter()
                .map(|(slot, weight)| (slot.to_string(), *weight))
                .collect(),
        }
    }
}

impl WeightedStyleAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the weight of the given slots, keeping the rest.
    pub fn with_weights<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        for (slot, weight) in overrides {
            self.weights.insert(slot.into(), weight);
        }
        self
    }

    pub fn weight(&self, slot: &str) -> f32 {
        self.weights.get(slot).copied().unwrap_or(FALLBACK_WEIGHT)
    }

    pub fn category_score(&self, category: &StyleCategory, selections: &[SlotSelection]) -> f32 {
        let mut weighted = 0.0;
        let mut used = 0.0;
        for selection in selections.iter().filter(|s| !s.features.is_empty()) {
            let weight = self.weight(&selection.slot);
            weighted += category.item_score(&selection.features) * weight;
            used += weight;
        }

        if used > 0.0 {
            weighted / used
        } else {
            0.0
        }
    }

    pub fn assign(&self, categories: &[StyleCategory], selections: &[SlotSelection]) -> WeightedAssignment {
        let scores: IndexMap<String, f32> = categories
            .iter()
            .map(|c| (c.name.clone(), self.category_score(c, selections)))
            .collect();

        let mut primary: Option<(&str, f32)> = None;
        for (name, score) in &scores {
            if primary.map_or(true, |(_, best)| *score > best) {
                primary = Some((name.as_str(), *score));
            }
        }
        let (primary_style, primary_score) = primary.unwrap_or(("Unknown", 0.0));

        let has_complete_outfit = selections
            .iter()
            .any(|s| s.slot == COMPLETE_OUTFIT && !s.features.is_empty());
        let confidence = confidence(&scores, has_complete_outfit);
        let hybrid_styles = hybrid_styles(&scores);

        tracing::info!(
            "Weighted style assignment: {} ({:.1}, confidence {:.1})",
            primary_style,
            primary_score,
            confidence
        );

        WeightedAssignment {
            primary_style: primary_style.to_string(),
            primary_score,
            confidence,
            hybrid_styles,
            scores,
        }
    }
}

/// Zero unless at least two categories scored above zero.
pub fn confidence(scores: &IndexMap<String, f32>, has_complete_outfit: bool) -> f32 {
    let mut sorted: Vec<f32> = scores.values().copied().collect();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let nonzero = sorted.iter().filter(|s| **s > 0.0).count();
    if nonzero < 2 {
        return 0.0;
    }
    let (best, second) = (sorted[0], sorted[1]);
    if best <= 0.0 {
        return 0.0;
    }

    let mut confidence = ((best - second) / best).min(1.0) * 100.0;
    if has_complete_outfit && best > COMPLETE_OUTFIT_BOOST_MIN {
        confidence = (confidence * COMPLETE_OUTFIT_BOOST).min(100.0);
    }
    confidence
}

/// Categories close to the best score, best first.
pub fn hybrid_styles(scores: &IndexMap<String, f32>) -> Vec<String> {
    let max = scores.values().copied().fold(0.0_f32, f32::max);
    let mut hybrids: Vec<(&String, f32)> = scores
        .iter()
        .filter(|(_, score)| max - **score <= HYBRID_MARGIN && **score > HYBRID_MIN_SCORE)
        .map(|(name, score)| (name, *score))
        .collect();
    hybrids.sort_by(|a, b| b.1.total_cmp(&a.1));
    hybrids.into_iter().map(|(name, _)| name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<StyleCategory> {
        vec![
            StyleCategory::new("Minimalist", ["minimal", "clean", "neutral", "simple"]),
            StyleCategory::new("Streetwear", ["oversized", "graphic", "sneakers", "hoodie"]),
            StyleCategory::new("Bohemian", ["flowy", "floral", "fringe", "earthy"]),
        ]
    }

    fn scores(values: &[(&str, f32)]) -> IndexMap<String, f32> {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_item_score() {
        let category = &categories()[0];
        let item: BTreeSet<String> = ["minimal", "clean", "bold"].iter().map(|s| s.to_string()).collect();
        assert!((category.item_score(&item) - 200.0 / 3.0).abs() < 1e-4);
        assert_eq!(category.item_score(&BTreeSet::new()), 0.0);
    }

    #[test]
    fn test_weighted_scores() {
        let selections = vec![
            SlotSelection::new("top", ["minimal", "clean"]),
            SlotSelection::new("shoes", ["sneakers", "clean"]),
            SlotSelection::new("layering", Vec::<String>::new()),
            SlotSelection::new(COMPLETE_OUTFIT, ["minimal", "neutral", "simple", "clean"]),
        ];
        let result = WeightedStyleAssignment::new().assign(&categories(), &selections);

        // (100 * 0.2 + 50 * 0.15 + 100 * 0.4) / 0.75
        let minimalist = (20.0 + 7.5 + 40.0) / 0.75;
        assert!((result.scores["Minimalist"] - minimalist).abs() < 1e-3);
        // (50 * 0.15) / 0.75
        assert!((result.scores["Streetwear"] - 10.0).abs() < 1e-3);
        assert_eq!(result.scores["Bohemian"], 0.0);
        assert_eq!(result.primary_style, "Minimalist");
        assert_eq!(result.hybrid_styles, vec!["Minimalist"]);
        // gap 80 of 90, boosted by the complete outfit: min(100, 88.9 * 1.2)
        assert!((result.confidence - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_confidence_needs_two_nonzero_scores() {
        assert_eq!(confidence(&scores(&[]), false), 0.0);
        assert_eq!(confidence(&scores(&[("A", 75.0)]), false), 0.0);
        assert_eq!(confidence(&scores(&[("A", 75.0), ("B", 0.0)]), true), 0.0);
        assert_eq!(confidence(&scores(&[("A", 0.0), ("B", 0.0)]), false), 0.0);
    }

    #[test]
    fn test_confidence_gap() {
        let close = confidence(&scores(&[("Minimalist", 72.0), ("Classic", 68.0)]), false);
        assert!(close < 20.0);
        let clear = confidence(&scores(&[("Minimalist", 85.0), ("Streetwear", 45.0)]), false);
        assert!((clear - 40.0 / 85.0 * 100.0).abs() < 1e-3);
        let boosted = confidence(&scores(&[("Minimalist", 85.0), ("Streetwear", 45.0)]), true);
        assert!((boosted - clear * 1.2).abs() < 1e-3);
        let low = confidence(&scores(&[("Minimalist", 50.0), ("Streetwear", 25.0)]), true);
        assert!((low - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_hybrid_styles() {
        let hybrids = hybrid_styles(&scores(&[
            ("Classic", 68.0),
            ("Minimalist", 75.0),
            ("Streetwear", 45.0),
            ("Athleisure", 62.0),
        ]));
        assert_eq!(hybrids, vec!["Minimalist", "Classic", "Athleisure"]);
        assert!(hybrid_styles(&scores(&[("A", 25.0), ("B", 20.0)])).is_empty());
    }

    #[test]
    fn test_weight_overrides() {
        let engine = WeightedStyleAssignment::new().with_weights([("top", 0.5), ("hat", 0.3)]);
        assert_eq!(engine.weight("top"), 0.5);
        assert_eq!(engine.weight("hat"), 0.3);
        assert_eq!(engine.weight("bottom"), 0.2);
        assert_eq!(engine.weight("unknown"), FALLBACK_WEIGHT);
    }

    #[test]
    fn test_no_categories() {
        let result = WeightedStyleAssignment::new().assign(&[], &[SlotSelection::new("top", ["minimal"])]);
        assert_eq!(result.primary_style, "Unknown");
        assert_eq!(result.confidence, 0.0);
        assert!(result.hybrid_styles.is_empty());
    }
}

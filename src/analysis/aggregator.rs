use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::annotations::{ColorSample, VisionAnnotations};
use super::brand::BrandMatch;
use super::color::ColorClassifier;
use super::pattern::{Pattern, PatternResult};
use super::style::StyleResult;
use super::texture::{Texture, TextureResult};

const COLOR_MIN_SCORE: f32 = 0.6;
const PRIMARY_COLOR_MIN_SCORE: f32 = 0.7;
const MAX_DOMINANT_COLORS: usize = 3;
const DETECTOR_MIN_CONFIDENCE: f32 = 0.4;
const STYLE_MIN_CONFIDENCE: f32 = 0.5;
const RETAIN_ABOVE: f32 = 0.5;
const FALLBACK_FEATURES: usize = 5;

const CLOTHING_KEYWORDS: &[&str] = &[
    "clothing", "shirt", "pants", "dress", "skirt", "jacket", "coat", "sweater", "hoodie", "jeans",
    "shorts", "blouse", "top", "bottom", "shoes", "sneakers", "boots", "sandals", "heels", "flats",
    "hat", "cap", "scarf", "belt", "bag", "purse", "accessory", "sleeve", "collar", "button",
    "zipper", "pocket", "fabric", "cotton", "silk", "wool", "leather", "denim", "polyester",
];

/// First match wins, in this order.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "top",
        &["shirt", "blouse", "sweater", "hoodie", "jacket", "coat", "top", "tshirt", "t-shirt"],
    ),
    (
        "bottom",
        &["pants", "jeans", "shorts", "skirt", "trousers", "leggings", "bottom"],
    ),
    (
        "shoes",
        &["shoes", "sneakers", "boots", "sandals", "heels", "flats", "footwear"],
    ),
    (
        "accessory",
        &["hat", "cap", "scarf", "belt", "bag", "purse", "jewelry", "watch"],
    ),
    (
        "layering",
        &["jacket", "coat", "cardigan", "blazer", "vest", "outerwear"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSource {
    Label,
    Color,
    Pattern,
    Texture,
    Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFeature {
    pub name: String,
    pub confidence: f32,
    pub source: FeatureSource,
}

impl DetectedFeature {
    fn new(name: impl Into<String>, confidence: f32, source: FeatureSource) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }
}

/// Deduplicated, confidence-scored description of one garment.
///
/// Every name in `features` has an entry in `confidence_scores` and
/// `sources`; `features` is in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub features: Vec<String>,
    pub confidence_scores: IndexMap<String, f32>,
    pub sources: IndexMap<String, FeatureSource>,
    pub suggested_category: String,
    pub dominant_colors: Vec<String>,
    pub detected_text: Vec<String>,
    pub detected_brands: Vec<BrandMatch>,
    pub feature_count: usize,
    pub average_confidence: f32,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            confidence_scores: IndexMap::new(),
            sources: IndexMap::new(),
            suggested_category: "unknown".to_string(),
            dominant_colors: Vec::new(),
            detected_text: Vec::new(),
            detected_brands: Vec::new(),
            feature_count: 0,
            average_confidence: 0.0,
        }
    }
}

impl FeatureSet {
    pub fn confidence(&self, name: &str) -> Option<f32> {
        self.confidence_scores.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.confidence_scores.contains_key(name)
    }
}

/// Everything the aggregator merges for one image.
#[derive(Debug, Clone, Copy)]
pub struct AggregationInput<'a> {
    pub annotations: &'a VisionAnnotations,
    pub patterns: &'a PatternResult,
    pub textures: &'a TextureResult,
    pub styles: &'a StyleResult,
    pub brands: &'a [BrandMatch],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAggregator {
    colors: ColorClassifier,
}

impl FeatureAggregator {
    pub fn new(colors: ColorClassifier) -> Self {
        Self { colors }
    }

    pub fn aggregate(&self, input: AggregationInput<'_>) -> FeatureSet {
        let annotations = input.annotations;
        let mut collected: Vec<DetectedFeature> = Vec::new();

        for label in &annotations.labels {
            if is_clothing_related(&label.description) {
                collected.push(DetectedFeature::new(
                    label.description.as_str(),
                    label.score,
                    FeatureSource::Label,
                ));
            }
        }

        let dominant_colors = self.collect_colors(annotations, &mut collected);

        for (pattern, &confidence) in &input.patterns.detected {
            if confidence > DETECTOR_MIN_CONFIDENCE {
                collected.push(DetectedFeature::new(pattern.as_str(), confidence, FeatureSource::Pattern));
            }
        }
        for (texture, &confidence) in &input.textures.detected {
            if confidence > DETECTOR_MIN_CONFIDENCE {
                collected.push(DetectedFeature::new(texture.as_str(), confidence, FeatureSource::Texture));
            }
        }
        for (style, &confidence) in &input.styles.styles {
            if confidence > STYLE_MIN_CONFIDENCE {
                collected.push(DetectedFeature::new(style.as_str(), confidence, FeatureSource::Style));
            }
        }

        Self::collect_label_keywords(annotations, &mut collected);

        let mut unique: IndexMap<String, DetectedFeature> = IndexMap::new();
        for feature in collected {
            unique.entry(feature.name.clone()).or_insert(feature);
        }

        let retained = Self::retain_confident(unique);
        let features: Vec<String> = retained.iter().map(|f| f.name.clone()).collect();
        let confidence_scores: IndexMap<String, f32> = retained
            .iter()
            .map(|f| (f.name.clone(), f.confidence))
            .collect();
        let sources: IndexMap<String, FeatureSource> = retained
            .iter()
            .map(|f| (f.name.clone(), f.source))
            .collect();
        let average_confidence = if retained.is_empty() {
            0.0
        } else {
            retained.iter().map(|f| f.confidence).sum::<f32>() / retained.len() as f32
        };

        let suggested_category = suggest_category(annotations);
        tracing::debug!(
            "aggregated {} features, category {}",
            features.len(),
            suggested_category
        );

        FeatureSet {
            feature_count: features.len(),
            features,
            confidence_scores,
            sources,
            suggested_category,
            dominant_colors,
            detected_text: annotations.text.clone(),
            detected_brands: input.brands.to_vec(),
            average_confidence,
        }
    }

    /// Adds color features and returns the dominant color names in order.
    fn collect_colors(
        &self,
        annotations: &VisionAnnotations,
        collected: &mut Vec<DetectedFeature>,
    ) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();

        for sample in annotations
            .colors
            .iter()
            .filter(|c| c.score > COLOR_MIN_SCORE)
            .take(MAX_DOMINANT_COLORS)
        {
            let name = self.colors.classify_sample(sample);
            if !names.contains(&name) {
                names.push(name.clone());
            }
            collected.push(DetectedFeature::new(name, sample.score, FeatureSource::Color));
        }

        let primary = annotations
            .colors
            .iter()
            .fold(None::<&ColorSample>, |best, sample| match best {
                Some(b) if b.score >= sample.score => Some(b),
                _ => Some(sample),
            });
        if let Some(primary) = primary.filter(|p| p.score > PRIMARY_COLOR_MIN_SCORE) {
            let name = self.colors.classify_sample(primary);
            if !names.contains(&name) {
                names.push(name.clone());
                collected.push(DetectedFeature::new(name, primary.score, FeatureSource::Color));
            }
        }

        names
    }

    /// Pattern and texture keywords found in any label, for signals the
    /// pixel detectors missed.
    fn collect_label_keywords(annotations: &VisionAnnotations, collected: &mut Vec<DetectedFeature>) {
        for label in &annotations.labels {
            let description = label.description.as_str();
            for pattern in Pattern::all() {
                if pattern.keywords().iter().any(|k| description.contains(k))
                    && !collected.iter().any(|f| f.name == pattern.as_str())
                {
                    collected.push(DetectedFeature::new(pattern.as_str(), label.score, FeatureSource::Pattern));
                }
            }
            for texture in [Texture::Smooth, Texture::Rough]
                .into_iter()
                .chain(Texture::fabrics())
            {
                if texture.keywords().iter().any(|k| description.contains(k))
                    && !collected.iter().any(|f| f.name == texture.as_str())
                {
                    collected.push(DetectedFeature::new(texture.as_str(), label.score, FeatureSource::Texture));
                }
            }
        }
    }

    /// Keeps features above the retention bar; if none qualify, keeps the
    /// five most confident. First-seen order is preserved either way.
    fn retain_confident(unique: IndexMap<String, DetectedFeature>) -> Vec<DetectedFeature> {
        let confident: Vec<DetectedFeature> = unique
            .values()
            .filter(|f| f.confidence > RETAIN_ABOVE)
            .cloned()
            .collect();
        if !confident.is_empty() {
            return confident;
        }

        let mut ranked: Vec<(usize, f32)> = unique
            .values()
            .enumerate()
            .map(|(i, f)| (i, f.confidence))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut keep: Vec<usize> = ranked.into_iter().take(FALLBACK_FEATURES).map(|(i, _)| i).collect();
        keep.sort_unstable();

        keep.into_iter()
            .filter_map(|i| unique.get_index(i).map(|(_, f)| f.clone()))
            .collect()
    }
}

pub fn is_clothing_related(description: &str) -> bool {
    let description = description.to_lowercase();
    CLOTHING_KEYWORDS.iter().any(|k| description.contains(k))
}

/// Objects are consulted before labels; "unknown" when nothing matches.
pub fn suggest_category(annotations: &VisionAnnotations) -> String {
    let names = annotations
        .objects
        .iter()
        .map(|o| o.name.as_str())
        .chain(annotations.labels.iter().map(|l| l.description.as_str()));

    for name in names {
        for (category, keywords) in CATEGORY_KEYWORDS {
            if keywords.iter().any(|k| name.contains(k)) {
                return category.to_string();
            }
        }
    }
    "unknown".to_string()
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const STYLE_BUCKETS: &[(&str, &[&str])] = &[
    (
        "casual",
        &["casual", "t-shirt", "tshirt", "jeans", "hoodie", "shorts", "relaxed", "everyday", "denim"],
    ),
    (
        "formal",
        &["formal", "gown", "tuxedo", "suit", "evening", "cocktail", "elegant", "silk", "tie"],
    ),
    (
        "business",
        &["business", "blazer", "trousers", "office", "professional", "dress shirt", "pencil skirt", "loafers", "oxford"],
    ),
    (
        "sporty",
        &["sport", "athletic", "activewear", "running", "gym", "jersey", "track", "leggings", "training"],
    ),
    (
        "bohemian",
        &["bohemian", "boho", "fringe", "peasant", "flowy", "maxi", "paisley", "embroidered", "crochet"],
    ),
    (
        "vintage",
        &["vintage", "retro", "classic", "antique", "70s", "80s", "90s", "thrift"],
    ),
    (
        "edgy",
        &["edgy", "leather", "studded", "punk", "ripped", "distressed", "chain", "biker", "grunge"],
    ),
    (
        "romantic",
        &["romantic", "lace", "ruffle", "floral", "pastel", "bow", "feminine", "delicate"],
    ),
    (
        "minimalist",
        &["minimalist", "minimal", "simple", "clean", "basic", "plain", "neutral", "monochrome"],
    ),
    (
        "streetwear",
        &["streetwear", "street", "graphic", "oversized", "sneakers", "urban", "logo", "cap"],
    ),
];

const FORMAL_BUCKETS: &[&str] = &["formal", "business"];
const CASUAL_BUCKETS: &[&str] = &["casual", "sporty", "streetwear"];

const FORMAL_GARMENTS: &[&str] = &["blazer", "suit", "tie", "dress shirt", "heels", "gown", "oxford"];
const CASUAL_GARMENTS: &[&str] = &["t-shirt", "hoodie", "sneakers", "shorts", "flip-flops", "sweatpants"];

const NECKLINES: &[&str] = &[
    "v-neck", "crew neck", "scoop neck", "turtleneck", "boat neck", "halter", "off-shoulder", "collar",
    "cowl neck", "square neck",
];
const SLEEVES: &[&str] = &[
    "sleeveless", "short sleeve", "long sleeve", "three-quarter sleeve", "cap sleeve", "puff sleeve",
    "bell sleeve",
];
const FITS: &[&str] = &[
    "slim", "skinny", "relaxed", "oversized", "loose", "fitted", "straight", "wide-leg", "bootcut",
    "tailored",
];
const LENGTHS: &[&str] = &["cropped", "mini", "midi", "maxi", "knee-length", "ankle", "full-length"];
const CLOSURES: &[&str] = &["button", "zipper", "snap", "drawstring", "buckle", "hook", "lace-up"];
const DETAILS: &[&str] = &[
    "pocket", "pleat", "ruffle", "embroidery", "sequin", "fringe", "belt", "hood", "print", "logo", "lace",
];

const STYLE_OCCASIONS: &[(&str, &str)] = &[
    ("sporty", "gym"),
    ("romantic", "date"),
    ("edgy", "nightlife"),
    ("bohemian", "festivals"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GarmentFeatures {
    pub necklines: Vec<String>,
    pub sleeves: Vec<String>,
    pub fits: Vec<String>,
    pub lengths: Vec<String>,
    pub closures: Vec<String>,
    pub details: Vec<String>,
}

impl GarmentFeatures {
    pub fn is_empty(&self) -> bool {
        self.necklines.is_empty()
            && self.sleeves.is_empty()
            && self.fits.is_empty()
            && self.lengths.is_empty()
            && self.closures.is_empty()
            && self.details.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleResult {
    /// Non-zero style buckets, in bucket order.
    pub styles: IndexMap<String, f32>,
    pub garment: GarmentFeatures,
    pub formality: f32,
    pub occasions: Vec<String>,
}

impl Default for StyleResult {
    fn default() -> Self {
        Self {
            styles: IndexMap::new(),
            garment: GarmentFeatures::default(),
            formality: 0.5,
            occasions: Vec::new(),
        }
    }
}

/// Keyword classifier over the combined label and object text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleFeatureAnalyzer;

impl StyleFeatureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> StyleResult {
        let text = text.to_lowercase();
        let styles = Self::style_scores(&text);
        let formality = Self::formality(&text, &styles);
        let occasions = Self::occasions(formality, &styles);
        tracing::debug!(
            "style buckets={:?} formality={:.2}",
            styles.keys().collect::<Vec<_>>(),
            formality
        );

        StyleResult {
            styles,
            garment: Self::garment_features(&text),
            formality,
            occasions,
        }
    }

    fn style_scores(text: &str) -> IndexMap<String, f32> {
        STYLE_BUCKETS
            .iter()
            .filter_map(|(style, keywords)| {
                let matches = keywords.iter().filter(|k| text.contains(*k)).count();
                (matches > 0).then(|| (style.to_string(), matches as f32 / keywords.len() as f32))
            })
            .collect()
    }

    fn garment_features(text: &str) -> GarmentFeatures {
        let found = |vocabulary: &[&str]| {
            vocabulary
                .iter()
                .filter(|term| text.contains(*term))
                .map(|term| term.to_string())
                .collect::<Vec<_>>()
        };
        GarmentFeatures {
            necklines: found(NECKLINES),
            sleeves: found(SLEEVES),
            fits: found(FITS),
            lengths: found(LENGTHS),
            closures: found(CLOSURES),
            details: found(DETAILS),
        }
    }

    fn formality(text: &str, styles: &IndexMap<String, f32>) -> f32 {
        let sum = |buckets: &[&str]| {
            buckets
                .iter()
                .filter_map(|b| styles.get(*b))
                .sum::<f32>()
        };
        let formal = sum(FORMAL_BUCKETS);
        let casual = sum(CASUAL_BUCKETS);
        let base = if formal + casual > 0.0 {
            formal / (formal + casual)
        } else {
            0.5
        };

        let formal_hits = FORMAL_GARMENTS.iter().filter(|k| text.contains(*k)).count();
        let casual_hits = CASUAL_GARMENTS.iter().filter(|k| text.contains(*k)).count();
        (base + 0.2 * formal_hits as f32 - 0.2 * casual_hits as f32).clamp(0.0, 1.0)
    }

    fn occasions(formality: f32, styles: &IndexMap<String, f32>) -> Vec<String> {
        let band: &[&str] = if formality >= 0.8 {
            &["business", "formal events"]
        } else if formality >= 0.6 {
            &["business casual", "dinner"]
        } else if formality >= 0.4 {
            &["casual", "weekend"]
        } else {
            &["very casual", "lounging"]
        };

        let mut occasions: Vec<String> = band.iter().map(|o| o.to_string()).collect();
        for (style, occasion) in STYLE_OCCASIONS {
            if styles.contains_key(*style) && !occasions.iter().any(|o| o == occasion) {
                occasions.push(occasion.to_string());
            }
        }
        occasions
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_empty_text_is_neutral() {
        let result = StyleFeatureAnalyzer::new().analyze("");
        assert!(result.styles.is_empty());
        assert_eq!(result.formality, 0.5);
        assert_eq!(result.occasions, vec!["casual", "weekend"]);
        assert!(result.garment.is_empty());
    }

    #[test]
    fn test_bucket_scores_are_match_fractions() {
        let result = StyleFeatureAnalyzer::new().analyze("Vintage retro leather biker jacket");
        assert_eq!(result.styles["vintage"], 2.0 / 8.0);
        assert_eq!(result.styles["edgy"], 2.0 / 9.0);
        assert!(!result.styles.contains_key("formal"));
        assert!(result.occasions.contains(&"nightlife".to_string()));
    }

    #[test]
    fn test_formal_garments_raise_formality() {
        let result = StyleFeatureAnalyzer::new().analyze("navy blazer with silk tie, office wear");
        assert_eq!(result.formality, 1.0);
        assert_eq!(result.occasions[..2], ["business", "formal events"]);
    }

    #[test]
    fn test_casual_garments_lower_formality() {
        let result = StyleFeatureAnalyzer::new().analyze("hoodie and sneakers for the gym");
        assert!(result.formality < 0.4);
        assert_eq!(result.occasions[..2], ["very casual", "lounging"]);
        assert!(result.occasions.contains(&"gym".to_string()));
    }

    #[test]
    fn test_garment_vocabulary() {
        let result =
            StyleFeatureAnalyzer::new().analyze("cropped v-neck top, long sleeve, zipper pocket");
        assert_eq!(result.garment.necklines, vec!["v-neck"]);
        assert_eq!(result.garment.sleeves, vec!["long sleeve"]);
        assert_eq!(result.garment.lengths, vec!["cropped"]);
        assert_eq!(result.garment.closures, vec!["zipper"]);
        assert_eq!(result.garment.details, vec!["pocket"]);
    }

    #[test]
    fn test_scores_stay_in_unit_range_for_any_wording() {
        let vocabulary: Vec<&str> = STYLE_BUCKETS
            .iter()
            .flat_map(|(_, keywords)| keywords.iter().copied())
            .chain(FORMAL_GARMENTS.iter().copied())
            .chain(CASUAL_GARMENTS.iter().copied())
            .chain(["cotton", "blue", "shirt", "the", "with"])
            .collect();
        let mut rng = StdRng::seed_from_u64(13);
        let analyzer = StyleFeatureAnalyzer::new();
        for words in [0, 1, 3, 8, 20, 60] {
            let text = (0..words)
                .filter_map(|_| vocabulary.choose(&mut rng).copied())
                .collect::<Vec<_>>()
                .join(" ");
            let result = analyzer.analyze(&text);
            assert!((0.0..=1.0).contains(&result.formality), "{text}");
            for (style, score) in &result.styles {
                assert!(*score > 0.0 && *score <= 1.0, "{style} = {score}");
            }
            assert!(!result.occasions.is_empty());
        }

        // every keyword of every bucket at once
        let result = analyzer.analyze(&vocabulary.join(" "));
        assert!(result.styles.values().all(|s| (0.0..=1.0).contains(s)));
        assert!(result.styles.values().any(|s| *s == 1.0));
    }
}

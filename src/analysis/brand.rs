use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const FASHION_BRANDS: &[&str] = &[
    "nike", "adidas", "puma", "under armour", "reebok", "converse", "vans", "levi's", "levis", "gap",
    "zara", "h&m", "uniqlo", "calvin klein", "tommy hilfiger", "polo ralph lauren", "lacoste",
    "champion", "supreme", "gucci", "prada", "versace", "armani", "dolce & gabbana", "burberry",
    "coach", "michael kors", "kate spade", "marc jacobs", "tory burch", "forever 21", "old navy",
    "american eagle", "hollister", "abercrombie", "patagonia", "north face", "columbia",
    "timberland", "dr. martens",
];

const BRAND_ALIASES: &[(&str, &[&str])] = &[
    ("levis", &["levi's", "levi", "levis"]),
    ("h&m", &["h&m", "hm", "h and m"]),
    ("tommy hilfiger", &["tommy", "hilfiger"]),
    ("calvin klein", &["calvin", "klein", "ck"]),
    ("polo ralph lauren", &["polo", "ralph lauren", "ralph", "lauren"]),
    ("under armour", &["under armour", "underarmour", "ua"]),
    ("north face", &["north face", "northface", "tnf"]),
    ("dr. martens", &["dr martens", "doc martens", "martens"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandMatch {
    pub brand: String,
    pub matched_text: String,
    pub confidence: f32,
}

/// Matches detected text against a list of known fashion brands.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandDetector;

impl BrandDetector {
    pub fn new() -> Self {
        Self
    }

    /// One entry per brand, highest confidence first.
    pub fn detect(&self, texts: &[String]) -> Vec<BrandMatch> {
        let mut unique: IndexMap<&str, BrandMatch> = IndexMap::new();

        for raw in texts {
            let text = raw.trim().to_lowercase();
            if text.is_empty() {
                continue;
            }
            let confidence = text_confidence(&text);
            for &brand in FASHION_BRANDS {
                if !text_matches_brand(&text, brand) {
                    continue;
                }
                let replace = unique
                    .get(brand)
                    .map_or(true, |existing| confidence > existing.confidence);
                if replace {
                    unique.insert(
                        brand,
                        BrandMatch {
                            brand: brand.to_string(),
                            matched_text: text.clone(),
                            confidence,
                        },
                    );
                }
            }
        }

        let mut brands: Vec<BrandMatch> = unique.into_values().collect();
        brands.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        tracing::debug!("detected {} brands", brands.len());
        brands
    }
}

/// Longer text reads as a more deliberate print.
fn text_confidence(text: &str) -> f32 {
    (0.8 + (0.05 * text.chars().count() as f32).min(0.2)).min(1.0)
}

fn text_matches_brand(text: &str, brand: &str) -> bool {
    if text == brand {
        return true;
    }

    if brand.contains(' ')
        && brand
            .split_whitespace()
            .any(|word| word.len() > 2 && text.contains(word))
    {
        return true;
    }

    BRAND_ALIASES
        .iter()
        .find(|(main, _)| *main == brand)
        .is_some_and(|(_, variations)| variations.iter().any(|v| text.contains(v)))
}

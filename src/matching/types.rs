use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A garment the user already owns, as read from the wardrobe store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosetItem {
    pub id: Uuid,
    pub category: String,
    pub color: Option<String>,
    pub tags: BTreeSet<String>,
}

impl ClosetItem {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            color: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Tags, color and category, lower-cased.
    pub fn features(&self) -> BTreeSet<String> {
        self.tags
            .iter()
            .map(String::as_str)
            .chain(self.color.as_deref())
            .chain(std::iter::once(self.category.as_str()))
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

/// One slot of a suggested outfit, e.g. a "top" with a few wanted features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitItemRequest {
    pub slot_type: String,
    pub requested_features: BTreeSet<String>,
}

impl OutfitItemRequest {
    pub fn new<I, S>(slot_type: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            slot_type: slot_type.into(),
            requested_features: features
                .into_iter()
                .map(|f| f.as_ref().trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }
}

/// A full outfit suggestion; every slot is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutfitRecommendation {
    pub top: Option<OutfitItemRequest>,
    pub bottom: Option<OutfitItemRequest>,
    pub shoes: Option<OutfitItemRequest>,
    pub outerwear: Option<OutfitItemRequest>,
    pub accessories: Vec<OutfitItemRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Warm,
    Cold,
    #[default]
    Mild,
}

impl Weather {
    /// Case-insensitive; anything unrecognised is `Mild`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "warm" => Weather::Warm,
            "cold" => Weather::Cold,
            _ => Weather::Mild,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Warm => "warm",
            Weather::Cold => "cold",
            Weather::Mild => "mild",
        }
    }

    /// Materials and styles that suit this weather.
    pub fn suitable(&self) -> &'static [&'static str] {
        match self {
            Weather::Warm => &[
                "cotton", "linen", "silk", "chiffon", "jersey", "sleeveless", "short-sleeve", "tank",
                "shorts", "sandals", "light",
            ],
            Weather::Cold => &[
                "wool", "fleece", "cashmere", "leather", "denim", "long-sleeve", "sweater", "jacket",
                "boots", "pants", "thick",
            ],
            Weather::Mild => &[],
        }
    }

    pub fn unsuitable(&self) -> &'static [&'static str] {
        match self {
            Weather::Warm => &["wool", "fleece", "heavy", "thick", "boots", "coat"],
            Weather::Cold => &["sleeveless", "shorts", "sandals", "thin", "light"],
            Weather::Mild => &[],
        }
    }

    /// Mild has no keyword rules.
    pub fn has_rules(&self) -> bool {
        !matches!(self, Weather::Mild)
    }
}

impl FromStr for Weather {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Weather::parse(s))
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How well one closet item answers one requested slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatch {
    pub item: ClosetItem,
    pub match_score: f32,
    pub matched_features: Vec<String>,
    pub missing_features: Vec<String>,
    pub confidence: f32,
    pub weather_compatibility: f32,
    pub color_coordination: f32,
    pub style_consistency: f32,
}

impl FeatureMatch {
    pub fn explanation(&self) -> String {
        let mut parts = Vec::new();

        if !self.matched_features.is_empty() {
            let shown: Vec<&str> = self.matched_features.iter().take(3).map(String::as_str).collect();
            parts.push(format!(
                "Matches {} requested features: {}",
                self.matched_features.len(),
                shown.join(", ")
            ));
        }

        if self.weather_compatibility > 0.8 {
            parts.push("Excellent weather compatibility".to_string());
        } else if self.weather_compatibility < 0.5 {
            parts.push("Limited weather compatibility".to_string());
        }

        if self.style_consistency > 0.8 {
            parts.push("Strong style consistency".to_string());
        }

        if !self.missing_features.is_empty() {
            let shown: Vec<&str> = self.missing_features.iter().take(2).map(String::as_str).collect();
            parts.push(format!("Missing features: {}", shown.join(", ")));
        }

        if parts.is_empty() {
            "Basic compatibility match".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutfitMatchResult {
    pub top: Option<FeatureMatch>,
    pub bottom: Option<FeatureMatch>,
    pub shoes: Option<FeatureMatch>,
    pub outerwear: Option<FeatureMatch>,
    pub accessories: Vec<FeatureMatch>,
    pub overall_score: f32,
    pub color_harmony_score: f32,
    pub style_consistency_score: f32,
    pub weather_appropriateness: f32,
    /// Requested slots nothing in the wardrobe could fill.
    pub missing_categories: Vec<String>,
}

impl OutfitMatchResult {
    /// Accepted matches in slot order, accessories last.
    pub fn matches(&self) -> impl Iterator<Item = &FeatureMatch> + '_ {
        [&self.top, &self.bottom, &self.shoes, &self.outerwear]
            .into_iter()
            .flatten()
            .chain(self.accessories.iter())
    }
}

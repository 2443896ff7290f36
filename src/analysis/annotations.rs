use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

const MAX_TEXT_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub description: String,
    pub score: f32,
    #[serde(default)]
    pub topicality: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub name: String,
    pub score: f32,
    /// Normalized polygon vertices.
    #[serde(default)]
    pub bounding_box: Vec<(f32, f32)>,
}

/// A dominant color, either reported by the vision service or derived from
/// the image histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub rgb: (u8, u8, u8),
    pub pixel_fraction: f32,
    pub score: f32,
}

/// Structured output of the external vision-annotation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionAnnotations {
    pub labels: Vec<Label>,
    pub objects: Vec<DetectedObject>,
    pub colors: Vec<ColorSample>,
    pub text: Vec<String>,
}

impl Label {
    pub fn new(description: impl Into<String>, score: f32) -> Self {
        Self {
            description: description.into(),
            score,
            topicality: score,
        }
    }
}

impl DetectedObject {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
            bounding_box: Vec::new(),
        }
    }
}

impl VisionAnnotations {
    /// Lowercase descriptions and names, trim text and keep at most five
    /// text entries longer than one character.
    pub fn normalized(self) -> Self {
        let labels = self
            .labels
            .into_iter()
            .map(|l| Label {
                description: l.description.trim().to_lowercase(),
                ..l
            })
            .collect();
        let objects = self
            .objects
            .into_iter()
            .map(|o| DetectedObject {
                name: o.name.trim().to_lowercase(),
                ..o
            })
            .collect();
        let text = self
            .text
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| t.chars().count() > 1)
            .take(MAX_TEXT_ENTRIES)
            .collect();

        Self {
            labels,
            objects,
            colors: self.colors,
            text,
        }
    }

    /// All label descriptions and object names joined by spaces.
    pub fn combined_text(&self) -> String {
        self.labels
            .iter()
            .map(|l| l.description.as_str())
            .chain(self.objects.iter().map(|o| o.name.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
            && self.objects.is_empty()
            && self.colors.is_empty()
            && self.text.is_empty()
    }
}

/// Seam for the external vision-annotation service.
#[async_trait]
pub trait AnnotationProvider: Send + Sync {
    async fn annotate(&self, image: &[u8]) -> Result<VisionAnnotations, AnalysisError>;
}

/// Provider for annotations that were computed elsewhere ahead of time.
#[derive(Debug, Clone, Default)]
pub struct StaticAnnotations {
    annotations: VisionAnnotations,
}

impl StaticAnnotations {
    pub fn new(annotations: VisionAnnotations) -> Self {
        Self { annotations }
    }
}

#[async_trait]
impl AnnotationProvider for StaticAnnotations {
    async fn annotate(&self, _image: &[u8]) -> Result<VisionAnnotations, AnalysisError> {
        Ok(self.annotations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_lowercases_and_filters_text() {
        let annotations = VisionAnnotations {
            labels: vec![Label::new(" Denim Jacket ", 0.9)],
            objects: vec![DetectedObject::new("Outerwear", 0.8)],
            colors: Vec::new(),
            text: vec!["a", "NIKE", "x", "just", "do", "it", "again", "more"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
        .normalized();

        assert_eq!(annotations.labels[0].description, "denim jacket");
        assert_eq!(annotations.objects[0].name, "outerwear");
        assert_eq!(annotations.text, vec!["NIKE", "just", "do", "it", "again"]);
        assert_eq!(annotations.combined_text(), "denim jacket outerwear");
    }

    #[test]
    fn test_deserialize_with_missing_sections() {
        let json = r#"{"labels":[{"description":"shirt","score":0.9}]}"#;
        let annotations: VisionAnnotations = serde_json::from_str(json).unwrap();
        assert_eq!(annotations.labels.len(), 1);
        assert_eq!(annotations.labels[0].topicality, 0.0);
        assert!(annotations.objects.is_empty());
        assert!(!annotations.is_empty());
        assert!(VisionAnnotations::default().is_empty());
    }

    #[tokio::test]
    async fn test_static_provider_returns_its_annotations() {
        let annotations = VisionAnnotations {
            labels: vec![Label::new("dress", 0.95)],
            ..Default::default()
        };
        let provider = StaticAnnotations::new(annotations.clone());
        assert_eq!(provider.annotate(b"ignored").await.unwrap(), annotations);
    }
}

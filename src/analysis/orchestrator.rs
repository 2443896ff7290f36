use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::task::{Context, Poll};
use futures::Future;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tower::{BoxError, Service};
use uuid::Uuid;

use super::aggregator::{AggregationInput, FeatureAggregator, FeatureSet};
use super::annotations::VisionAnnotations;
use super::brand::BrandDetector;
use super::color::{ColorClassifier, ColorPalette};
use super::core::AnalysisContext;
use super::pattern::{PatternDetector, PatternResult};
use super::raster::{decode_image, normalize_image};
use super::style::{StyleFeatureAnalyzer, StyleResult};
use super::texture::{TextureAnalyzer, TextureResult};
use crate::config::AnalysisSettings;
use crate::error::AnalysisError;

/// One garment photo plus whatever annotations are already known for it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub image: Arc<Vec<u8>>,
    pub annotations: VisionAnnotations,
}

impl AnalysisRequest {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            image: Arc::new(image),
            annotations: VisionAnnotations::default(),
        }
    }

    pub fn with_annotations(mut self, annotations: VisionAnnotations) -> Self {
        self.annotations = annotations;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentAnalysis {
    pub id: Uuid,
    pub feature_set: FeatureSet,
    pub patterns: PatternResult,
    pub textures: TextureResult,
    pub style: StyleResult,
    pub palette: ColorPalette,
    pub analyzed_at: DateTime<Utc>,
    pub processing_time_us: u64,
    /// Set when the analysis could not run and every score is zero.
    pub error: Option<String>,
}

impl GarmentAnalysis {
    pub fn degraded(id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            id,
            feature_set: FeatureSet::default(),
            patterns: PatternResult::default(),
            textures: TextureResult::default(),
            style: StyleResult::default(),
            palette: ColorPalette::default(),
            analyzed_at: Utc::now(),
            processing_time_us: 0,
            error: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs every detector over one image and aggregates the result.
pub struct GarmentAnalyzer {
    resolution: u32,
    colors: ColorClassifier,
    patterns: PatternDetector,
    textures: TextureAnalyzer,
    styles: StyleFeatureAnalyzer,
    brands: BrandDetector,
    aggregator: FeatureAggregator,
}

impl GarmentAnalyzer {
    pub fn new(settings: &AnalysisSettings) -> Self {
        let colors = ColorClassifier::new();
        Self {
            resolution: settings.resolution,
            colors,
            patterns: PatternDetector::new(settings.pattern_thresholds.clone()),
            textures: TextureAnalyzer::new(),
            styles: StyleFeatureAnalyzer::new(),
            brands: BrandDetector::new(),
            aggregator: FeatureAggregator::new(colors),
        }
    }

    /// Decodes the request image; a decode failure is returned, never
    /// analyzed as if it were pixels.
    pub fn analyze_request(&self, request: &AnalysisRequest) -> Result<GarmentAnalysis, AnalysisError> {
        let image = decode_image(&request.image)?;
        Ok(self.analyze_image(request.id, &image, request.annotations.clone()))
    }

    pub fn analyze_image(
        &self,
        id: Uuid,
        image: &DynamicImage,
        annotations: VisionAnnotations,
    ) -> GarmentAnalysis {
        let start_time = Instant::now();
        let rgb = normalize_image(image, self.resolution);

        let mut annotations = annotations.normalized();
        if annotations.colors.is_empty() {
            annotations.colors = self.colors.dominant_colors(&rgb);
        }

        let label_text = annotations.combined_text();
        let context = AnalysisContext::new(rgb).with_label_text(label_text.as_str());

        let patterns = self.patterns.analyze(&context);
        let textures = self.textures.analyze(&context);
        let style = self.styles.analyze(&label_text);
        let brands = self.brands.detect(&annotations.text);
        let palette = self.colors.palette(&annotations.colors);

        let feature_set = self.aggregator.aggregate(AggregationInput {
            annotations: &annotations,
            patterns: &patterns,
            textures: &textures,
            styles: &style,
            brands: &brands,
        });

        let processing_time_us = start_time.elapsed().as_micros() as u64;
        tracing::info!(
            "Analyzed garment {}: {} features, category {} ({}us)",
            id,
            feature_set.feature_count,
            feature_set.suggested_category,
            processing_time_us
        );

        GarmentAnalysis {
            id,
            feature_set,
            patterns,
            textures,
            style,
            palette,
            analyzed_at: Utc::now(),
            processing_time_us,
            error: None,
        }
    }
}

/// tower entry point for one analysis; pixel work runs on the blocking pool.
#[derive(Clone)]
pub struct AnalysisService {
    inner: Arc<GarmentAnalyzer>,
    workers: Option<Arc<Semaphore>>,
}

impl AnalysisService {
    pub fn new(inner: Arc<GarmentAnalyzer>) -> Self {
        Self {
            inner,
            workers: None,
        }
    }

    /// Every blocking job holds one of `workers` until it ends, even after
    /// its caller has stopped waiting.
    pub fn with_workers(mut self, workers: Arc<Semaphore>) -> Self {
        self.workers = Some(workers);
        self
    }
}

impl Service<AnalysisRequest> for AnalysisService {
    type Response = GarmentAnalysis;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: AnalysisRequest) -> Self::Future {
        let inner = self.inner.clone();
        let workers = self.workers.clone();

        Box::pin(async move {
            let permit = match workers {
                Some(workers) => Some(
                    workers
                        .acquire_owned()
                        .await
                        .map_err(|e| AnalysisError::Worker(e.to_string()))?,
                ),
                None => None,
            };
            let analysis = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                inner.analyze_request(&request)
            })
            .await
            .map_err(|e| AnalysisError::Worker(e.to_string()))??;
            Ok(analysis)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageBuffer, ImageFormat, Rgb};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::annotations::{DetectedObject, Label};
    use crate::analysis::pattern::Pattern;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn navy_square() -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(64, 64, Rgb([0, 0, 128])))
    }

    fn analyzer() -> GarmentAnalyzer {
        GarmentAnalyzer::new(&AnalysisSettings::default())
    }

    #[test]
    fn test_uniform_image_without_annotations() {
        let analysis = analyzer().analyze_image(Uuid::new_v4(), &navy_square(), VisionAnnotations::default());
        assert!(!analysis.is_degraded());
        assert_eq!(analysis.patterns.primary, Some(Pattern::Solid));
        assert_eq!(analysis.palette.primary_color, "navy");
        assert_eq!(analysis.feature_set.suggested_category, "unknown");
        assert!(analysis.feature_set.features.contains(&"navy".to_string()));
        assert!(analysis.feature_set.features.contains(&"solid".to_string()));
    }

    #[test]
    fn test_annotations_drive_category_and_brands() {
        let annotations = VisionAnnotations {
            labels: vec![Label::new("Denim Jeans", 0.92)],
            objects: vec![DetectedObject::new("Pants", 0.88)],
            colors: Vec::new(),
            text: vec!["LEVIS".to_string()],
        };
        let analysis = analyzer().analyze_image(Uuid::new_v4(), &navy_square(), annotations);
        let set = &analysis.feature_set;
        assert_eq!(set.suggested_category, "bottom");
        assert_eq!(set.features[0], "denim jeans");
        assert!(set.detected_brands.iter().any(|b| b.brand == "levis"));
        assert_eq!(set.detected_text, vec!["LEVIS"]);
    }

    #[test]
    fn test_undecodable_bytes_fail_fast() {
        let request = AnalysisRequest::new(b"not an image".to_vec());
        let result = analyzer().analyze_request(&request);
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[tokio::test]
    async fn test_analysis_service() {
        let service = AnalysisService::new(Arc::new(analyzer()));
        let request = AnalysisRequest::new(png_bytes(navy_square()));
        let id = request.id;

        let analysis = service.clone().oneshot(request).await.unwrap();
        assert_eq!(analysis.id, id);
        assert!(!analysis.is_degraded());

        let error = service
            .oneshot(AnalysisRequest::new(vec![0, 1, 2]))
            .await
            .unwrap_err();
        assert!(error.downcast_ref::<AnalysisError>().is_some());
    }
}

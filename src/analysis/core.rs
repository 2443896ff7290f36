use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::raster::{Gradients, Plane};
use crate::error::AnalysisError;

/// Shared, precomputed views of one normalized garment image.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub rgb: Arc<RgbImage>,
    pub gray: Arc<Plane>,
    pub gradients: Arc<Gradients>,
    pub dimensions: (u32, u32),
    /// Lowercased label and object text, used for keyword boosts.
    pub label_text: String,
}

impl AnalysisContext {
    pub fn new(rgb: RgbImage) -> Self {
        let dimensions = rgb.dimensions();
        let gray = Plane::luma(&rgb);
        let gradients = Gradients::of(&gray);

        Self {
            rgb: Arc::new(rgb),
            gray: Arc::new(gray),
            gradients: Arc::new(gradients),
            dimensions,
            label_text: String::new(),
        }
    }

    pub fn with_label_text(mut self, text: impl Into<String>) -> Self {
        self.label_text = text.into().to_lowercase();
        self
    }

    pub fn pixel_count(&self) -> usize {
        (self.dimensions.0 * self.dimensions.1) as usize
    }

    /// Fails unless the image is at least `min` pixels on each side.
    pub fn require(&self, detector: &'static str, min: u32) -> Result<(), AnalysisError> {
        let (width, height) = self.dimensions;
        if width < min || height < min {
            return Err(AnalysisError::InsufficientData {
                detector,
                min,
                width,
                height,
            });
        }
        Ok(())
    }
}

/// Outcome of a single detector. A detector that could not measure reports
/// `Degraded` instead of silently scoring zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Signal {
    Measured { confidence: f32 },
    Degraded { reason: String },
}

impl Signal {
    pub fn measured(confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Signal::Measured { confidence }
    }

    pub fn from_result(detector: &'static str, result: Result<f32, AnalysisError>) -> Self {
        match result {
            Ok(confidence) => Signal::measured(confidence),
            Err(e) => {
                tracing::warn!("{} degraded: {}", detector, e);
                Signal::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Degraded signals count as zero confidence.
    pub fn confidence(&self) -> f32 {
        match self {
            Signal::Measured { confidence } => *confidence,
            Signal::Degraded { .. } => 0.0,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Signal::Degraded { .. })
    }
}

/// Result of a detection operation with confidence and reasoning
#[derive(Debug, Clone)]
pub struct DetectionResult<T> {
    pub result: T,
    pub confidence: f32,
    pub reasoning: String,
    pub processing_time_us: u64,
}

impl<T> DetectionResult<T> {
    pub fn new(result: T, confidence: f32, reasoning: String) -> Self {
        Self {
            result,
            confidence,
            reasoning,
            processing_time_us: 0,
        }
    }

    pub fn with_timing(mut self, start_time: Instant) -> Self {
        self.processing_time_us = start_time.elapsed().as_micros() as u64;
        self
    }
}

/// Template Method for pixel detectors: implementors supply the raw measure,
/// `detect` handles timing, clamping and degradation.
pub trait FeatureDetector: Send + Sync {
    fn name(&self) -> &'static str;
    fn measure(&self, context: &AnalysisContext) -> Result<f32, AnalysisError>;

    fn detect(&self, context: &AnalysisContext) -> DetectionResult<Signal> {
        let start_time = Instant::now();
        let signal = Signal::from_result(self.name(), self.measure(context));
        let confidence = signal.confidence();
        let reasoning = match &signal {
            Signal::Measured { .. } => format!("{} measured {:.3}", self.name(), confidence),
            Signal::Degraded { reason } => format!("{} degraded: {}", self.name(), reason),
        };
        DetectionResult::new(signal, confidence, reasoning).with_timing(start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct Fixed(Result<f32, &'static str>);

    impl FeatureDetector for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn measure(&self, _context: &AnalysisContext) -> Result<f32, AnalysisError> {
            self.0.map_err(|_| AnalysisError::EmptySignal("fixed"))
        }
    }

    fn context() -> AnalysisContext {
        AnalysisContext::new(RgbImage::from_pixel(16, 16, Rgb([120, 120, 120])))
    }

    #[test]
    fn test_measured_signal_is_clamped() {
        assert_eq!(Signal::measured(1.7).confidence(), 1.0);
        assert_eq!(Signal::measured(-0.2).confidence(), 0.0);
        assert_eq!(Signal::measured(f32::NAN).confidence(), 0.0);
    }

    #[test]
    fn test_failed_measure_degrades() {
        let result = Fixed(Err("boom")).detect(&context());
        assert!(result.result.is_degraded());
        assert_eq!(result.confidence, 0.0);
        assert!(result.reasoning.contains("degraded"));

        let result = Fixed(Ok(0.42)).detect(&context());
        assert_eq!(result.result, Signal::Measured { confidence: 0.42 });
    }

    #[test]
    fn test_require_reports_dimensions() {
        let err = context().require("polka-dot", 32).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                min: 32,
                width: 16,
                height: 16,
                ..
            }
        ));
        assert!(context().require("polka-dot", 9).is_ok());
    }

    #[test]
    fn test_label_text_is_lowercased() {
        let ctx = context().with_label_text("Blue DENIM Jacket");
        assert_eq!(ctx.label_text, "blue denim jacket");
        assert_eq!(ctx.pixel_count(), 256);
    }
}

use std::f32::consts::PI;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::core::{AnalysisContext, FeatureDetector, Signal};
use super::raster::{grid_crossing_density, percentile, variance, visual_complexity};
use super::spectrum::{count_prominent_bins, magnitude_spectrum, peak_in_band};
use crate::config::PatternThresholds;
use crate::error::AnalysisError;

const STRIPE_SCALE: f32 = 3.0;
const POLKA_WINDOW: usize = 9;
const POLKA_CENTER: usize = 3;
const POLKA_STEP: usize = 3;
const POLKA_CONTRAST: f32 = 40.0;
const POLKA_BOOST: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    Striped,
    PolkaDot,
    Geometric,
    Plaid,
    Solid,
    Floral,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Striped => "striped",
            Pattern::PolkaDot => "polka-dot",
            Pattern::Geometric => "geometric",
            Pattern::Plaid => "plaid",
            Pattern::Solid => "solid",
            Pattern::Floral => "floral",
        }
    }

    /// Label keywords that hint at this pattern.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Pattern::Striped => &["stripe", "striped", "stripes", "pinstripe"],
            Pattern::PolkaDot => &["polka", "dot", "dots", "dotted"],
            Pattern::Geometric => &["geometric", "abstract", "chevron", "houndstooth"],
            Pattern::Plaid => &["plaid", "check", "checked", "tartan", "gingham", "checkered"],
            Pattern::Solid => &["solid", "plain"],
            Pattern::Floral => &["floral", "flower", "flowers", "botanical", "paisley"],
        }
    }

    pub fn all() -> [Pattern; 6] {
        [
            Pattern::Striped,
            Pattern::PolkaDot,
            Pattern::Geometric,
            Pattern::Plaid,
            Pattern::Solid,
            Pattern::Floral,
        ]
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Periodic bands along either axis.
pub struct StripeDetector;

impl FeatureDetector for StripeDetector {
    fn name(&self) -> &'static str {
        "striped"
    }

    fn measure(&self, context: &AnalysisContext) -> Result<f32, AnalysisError> {
        context.require(self.name(), 8)?;
        let axis_score = |profile: Vec<f32>| {
            let n = profile.len();
            let spectrum = magnitude_spectrum(&profile);
            peak_in_band(&spectrum, 1, (n / 4).max(1)) / (n as f32 * 255.0)
        };
        let rows = axis_score(context.gray.row_means());
        let cols = axis_score(context.gray.col_means());
        tracing::debug!("stripe spectral peaks rows={:.3} cols={:.3}", rows, cols);
        Ok((rows.max(cols) * STRIPE_SCALE).min(1.0))
    }
}

/// Small blobs that contrast with their surround.
pub struct PolkaDotDetector {
    max_ring_spread: f32,
}

impl PolkaDotDetector {
    pub fn new(max_ring_spread: f32) -> Self {
        Self { max_ring_spread }
    }
}

impl Default for PolkaDotDetector {
    fn default() -> Self {
        Self::new(PatternThresholds::default().polka_ring_spread)
    }
}

impl FeatureDetector for PolkaDotDetector {
    fn name(&self) -> &'static str {
        "polka-dot"
    }

    fn measure(&self, context: &AnalysisContext) -> Result<f32, AnalysisError> {
        context.require(self.name(), POLKA_WINDOW as u32)?;
        let gray = &context.gray;
        let windows = gray.windows(POLKA_WINDOW, POLKA_STEP);
        if windows.is_empty() {
            return Err(AnalysisError::EmptySignal("polka-dot"));
        }

        let offset = (POLKA_WINDOW - POLKA_CENTER) / 2;
        let last = POLKA_WINDOW - 1;
        let qualifying = windows
            .iter()
            .filter(|&&(x, y)| {
                let center = gray.region(x + offset, y + offset, POLKA_CENTER, POLKA_CENTER);
                let center_mean = center.iter().sum::<f32>() / center.len() as f32;

                let ring: Vec<f32> = (0..POLKA_WINDOW)
                    .flat_map(|i| {
                        [
                            gray.get(x + i, y),
                            gray.get(x + i, y + last),
                            gray.get(x, y + i),
                            gray.get(x + last, y + i),
                        ]
                    })
                    .collect();
                let ring_mean = ring.iter().sum::<f32>() / ring.len() as f32;

                (center_mean - ring_mean).abs() > POLKA_CONTRAST
                    && variance(&ring).sqrt() < self.max_ring_spread
            })
            .count();

        let mut confidence = qualifying as f32 / windows.len() as f32;
        if qualifying > 5 {
            confidence *= POLKA_BOOST;
        }
        Ok(confidence.min(1.0))
    }
}

/// Strong, axis-aligned edges.
pub struct GeometricDetector;

impl FeatureDetector for GeometricDetector {
    fn name(&self) -> &'static str {
        "geometric"
    }

    fn measure(&self, context: &AnalysisContext) -> Result<f32, AnalysisError> {
        context.require(self.name(), 8)?;
        let gradients = &context.gradients;
        let magnitudes = gradients.magnitudes();
        let cutoff = percentile(&magnitudes, 0.85).max(8.0);

        let strong: Vec<usize> = (0..magnitudes.len())
            .filter(|&i| magnitudes[i] > cutoff)
            .collect();
        if strong.is_empty() {
            return Ok(0.0);
        }

        let aligned = strong
            .iter()
            .filter(|&&i| {
                let (gx, gy) = gradients.at(i);
                gx.abs() > 2.0 * gy.abs() || gy.abs() > 2.0 * gx.abs()
            })
            .count();
        let alignment = aligned as f32 / strong.len() as f32;
        let density = strong.len() as f32 / magnitudes.len() as f32;
        Ok((alignment * density * 5.0).min(1.0))
    }
}

/// Periodicity on both axes plus crossing edges.
pub struct PlaidDetector;

impl FeatureDetector for PlaidDetector {
    fn name(&self) -> &'static str {
        "plaid"
    }

    fn measure(&self, context: &AnalysisContext) -> Result<f32, AnalysisError> {
        context.require(self.name(), 16)?;
        let prominent = |profile: Vec<f32>| {
            let floor = profile.len() as f32 * 2.0;
            count_prominent_bins(&magnitude_spectrum(&profile), 2.0, floor)
        };
        let rows = prominent(context.gray.row_means());
        let cols = prominent(context.gray.col_means());
        let periodicity = (rows.min(cols) as f32 / 3.0).min(1.0);

        let crossings = (grid_crossing_density(&context.gradients, 15.0) * 20.0).min(1.0);
        Ok((periodicity + crossings) / 2.0)
    }
}

/// Low color and spatial variance.
pub struct SolidDetector;

impl FeatureDetector for SolidDetector {
    fn name(&self) -> &'static str {
        "solid"
    }

    fn measure(&self, context: &AnalysisContext) -> Result<f32, AnalysisError> {
        if context.pixel_count() == 0 {
            return Err(AnalysisError::EmptySignal("solid"));
        }
        let mut channels: [Vec<f32>; 3] = Default::default();
        for pixel in context.rgb.pixels() {
            for (c, values) in channels.iter_mut().enumerate() {
                values.push(pixel.0[c] as f32);
            }
        }
        let channel_variance = channels.iter().map(|c| variance(c)).sum::<f32>() / 3.0;
        let spatial_variance = context.gray.variance();

        let color_uniformity = 1.0 / (1.0 + channel_variance / 1000.0);
        let spatial_uniformity = 1.0 / (1.0 + spatial_variance / 1000.0);
        Ok((color_uniformity + spatial_uniformity) / 2.0)
    }
}

/// Busy texture with edges running in every direction.
pub struct FloralDetector;

impl FloralDetector {
    /// 1 - mean resultant length of quadrupled edge angles; axis-aligned and
    /// diagonal grids collapse to zero, curves spread toward one.
    fn direction_variance(context: &AnalysisContext) -> f32 {
        let gradients = &context.gradients;
        let (mut sum_cos, mut sum_sin, mut count) = (0.0f32, 0.0f32, 0usize);
        for i in 0..gradients.len() {
            let (gx, gy) = gradients.at(i);
            if gx.hypot(gy) > 20.0 {
                let theta = gy.atan2(gx) * 4.0;
                sum_cos += theta.cos();
                sum_sin += theta.sin();
                count += 1;
            }
        }
        if count == 0 {
            return 0.0;
        }
        1.0 - sum_cos.hypot(sum_sin) / count as f32
    }
}

impl FeatureDetector for FloralDetector {
    fn name(&self) -> &'static str {
        "floral"
    }

    fn measure(&self, context: &AnalysisContext) -> Result<f32, AnalysisError> {
        context.require(self.name(), 8)?;
        let complexity = visual_complexity(&context.gray, &context.gradients);
        let spread = Self::direction_variance(context);
        Ok(((0.5 * complexity + 0.5 * spread) * 0.9).min(1.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    /// Every sub-detector's outcome, degraded ones included.
    pub signals: IndexMap<Pattern, Signal>,
    /// Patterns above their reporting threshold.
    pub detected: IndexMap<Pattern, f32>,
    pub primary: Option<Pattern>,
    pub complexity: f32,
}

/// Runs every pattern sub-detector and keeps those above threshold.
pub struct PatternDetector {
    detectors: Vec<(Pattern, Box<dyn FeatureDetector>)>,
    thresholds: PatternThresholds,
}

impl PatternDetector {
    pub fn new(thresholds: PatternThresholds) -> Self {
        Self {
            detectors: vec![
                (Pattern::Striped, Box::new(StripeDetector)),
                (
                    Pattern::PolkaDot,
                    Box::new(PolkaDotDetector::new(thresholds.polka_ring_spread)),
                ),
                (Pattern::Geometric, Box::new(GeometricDetector)),
                (Pattern::Plaid, Box::new(PlaidDetector)),
                (Pattern::Solid, Box::new(SolidDetector)),
                (Pattern::Floral, Box::new(FloralDetector)),
            ],
            thresholds,
        }
    }

    pub fn threshold(&self, pattern: Pattern) -> f32 {
        match pattern {
            Pattern::Solid => self.thresholds.solid,
            Pattern::Floral => self.thresholds.floral,
            _ => self.thresholds.default,
        }
    }

    pub fn analyze(&self, context: &AnalysisContext) -> PatternResult {
        let mut result = PatternResult::default();

        for (pattern, detector) in &self.detectors {
            let detection = detector.detect(context);
            tracing::debug!("{} ({}us)", detection.reasoning, detection.processing_time_us);
            if detection.confidence > self.threshold(*pattern) {
                result.detected.insert(*pattern, detection.confidence);
            }
            result.signals.insert(*pattern, detection.result);
        }

        result.primary = result
            .detected
            .iter()
            .fold(None::<(Pattern, f32)>, |best, (&pattern, &confidence)| match best {
                Some((_, best_confidence)) if best_confidence >= confidence => best,
                _ => Some((pattern, confidence)),
            })
            .map(|(pattern, _)| pattern);

        result.complexity = if context.dimensions.0 >= 8 && context.dimensions.1 >= 8 {
            visual_complexity(&context.gray, &context.gradients)
        } else {
            0.0
        };
        result
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(PatternThresholds::default())
    }
}

/// Angle helper shared with texture analysis: edge orientation in [0, PI).
pub(crate) fn edge_orientation(gx: f32, gy: f32) -> f32 {
    gy.atan2(gx).rem_euclid(PI)
}

use std::f32::consts::PI;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::color::rgb_to_hsv;
use super::core::{AnalysisContext, Signal};
use super::pattern::edge_orientation;
use super::raster::{grid_crossing_density, mean, percentile, variance, visual_complexity, Plane};
use super::spectrum::{low_frequency_ratio, magnitude_spectrum, peak_in_band};
use crate::error::AnalysisError;

const MIN_TEXTURE_SIDE: u32 = 16;
const ROUGH_ABOVE: f32 = 0.6;
const SMOOTH_BELOW: f32 = 0.4;
const KEYWORD_BOOST: f32 = 1.2;
const PERIODIC_PROMINENCE: f32 = 4.0;
const SEAM_EDGE: f32 = 15.0;
const SEAM_MIN_COVERAGE: f32 = 0.4;
const MESH_REACH: usize = 2;
const MESH_CONTRAST: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Texture {
    Rough,
    Smooth,
    Denim,
    Leather,
    Knit,
    Woven,
    Velvet,
    Quilted,
    Mesh,
    Corduroy,
}

impl Texture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Texture::Rough => "rough",
            Texture::Smooth => "smooth",
            Texture::Denim => "denim",
            Texture::Leather => "leather",
            Texture::Knit => "knit",
            Texture::Woven => "woven",
            Texture::Velvet => "velvet",
            Texture::Quilted => "quilted",
            Texture::Mesh => "mesh",
            Texture::Corduroy => "corduroy",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Texture::Rough => &["rough", "textured", "coarse", "distressed"],
            Texture::Smooth => &["smooth", "silk", "satin", "glossy", "sleek"],
            Texture::Denim => &["denim", "jeans", "jean", "chambray"],
            Texture::Leather => &["leather", "suede", "faux leather", "patent"],
            Texture::Knit => &["knit", "knitted", "sweater", "cardigan", "jersey"],
            Texture::Woven => &["woven", "cotton", "linen", "canvas", "tweed"],
            Texture::Velvet => &["velvet", "velour", "plush"],
            Texture::Quilted => &["quilted", "puffer", "padded", "down"],
            Texture::Mesh => &["mesh", "net", "netting", "perforated"],
            Texture::Corduroy => &["corduroy", "cord", "ribbed"],
        }
    }

    fn threshold(&self) -> f32 {
        match self {
            Texture::Denim | Texture::Knit | Texture::Woven | Texture::Mesh => 0.35,
            _ => 0.4,
        }
    }

    pub fn fabrics() -> [Texture; 8] {
        [
            Texture::Denim,
            Texture::Leather,
            Texture::Knit,
            Texture::Woven,
            Texture::Velvet,
            Texture::Quilted,
            Texture::Mesh,
            Texture::Corduroy,
        ]
    }
}

impl fmt::Display for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image statistics shared by every fabric heuristic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureMetrics {
    pub roughness: f32,
    pub shine: f32,
    pub complexity: f32,
    pub softness: f32,
    pub has_edges: bool,
    pub crosshatch: f32,
    pub local_variance: f32,
    pub mean_rgb: (f32, f32, f32),
}

impl TextureMetrics {
    pub fn measure(context: &AnalysisContext) -> Result<Self, AnalysisError> {
        context.require("texture", MIN_TEXTURE_SIDE)?;
        let gray = &context.gray;
        let magnitudes = context.gradients.magnitudes();

        let lbp = (variance(&local_binary_patterns(gray)) / 5000.0).min(1.0);
        let gradient_spread = (variance(&magnitudes) / 1000.0).min(1.0);
        let local_variance = mean(&gray.window_variances(8));
        let roughness = 0.4 * lbp + 0.3 * gradient_spread + 0.3 * (local_variance / 1500.0).min(1.0);

        let edges: Vec<f32> = magnitudes.iter().copied().filter(|&m| m > 5.0).collect();
        let softness = if edges.is_empty() {
            0.0
        } else {
            edges.iter().filter(|&&m| m < 40.0).count() as f32 / edges.len() as f32
        };

        let (r, g, b) = context.rgb.pixels().fold((0.0, 0.0, 0.0), |acc, p| {
            (
                acc.0 + p.0[0] as f32,
                acc.1 + p.0[1] as f32,
                acc.2 + p.0[2] as f32,
            )
        });
        let n = context.pixel_count() as f32;

        Ok(Self {
            roughness,
            shine: shine(gray),
            complexity: visual_complexity(gray, &context.gradients),
            softness,
            has_edges: !edges.is_empty(),
            crosshatch: crosshatch(context),
            local_variance,
            mean_rgb: (r / n, g / n, b / n),
        })
    }

    fn sharpness(&self) -> f32 {
        if self.has_edges {
            1.0 - self.softness
        } else {
            0.0
        }
    }

    /// Zero on flat images so that trivially self-similar planes do not
    /// look like knit or weave.
    fn texture_presence(&self) -> f32 {
        (self.local_variance / 50.0).min(1.0)
    }
}

/// 8-neighbour local binary pattern codes of interior pixels.
fn local_binary_patterns(gray: &Plane) -> Vec<f32> {
    const NEIGHBOURS: [(isize, isize); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
    ];
    let (w, h) = (gray.width(), gray.height());
    let mut codes = Vec::with_capacity(w.saturating_sub(2) * h.saturating_sub(2));
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let center = gray.get(x, y);
            let code = NEIGHBOURS
                .iter()
                .enumerate()
                .fold(0u32, |code, (bit, &(dx, dy))| {
                    let neighbour = gray.get((x as isize + dx) as usize, (y as isize + dy) as usize);
                    if neighbour >= center {
                        code | (1 << bit)
                    } else {
                        code
                    }
                });
            codes.push(code as f32);
        }
    }
    codes
}

fn shine(gray: &Plane) -> f32 {
    let p95 = percentile(gray.data(), 0.95);
    let highlights = gray
        .data()
        .iter()
        .filter(|&&v| v > p95 && v > 180.0)
        .count() as f32
        / gray.data().len().max(1) as f32;

    let windows = gray.windows(8, 8);
    let variances: Vec<f32> = windows
        .iter()
        .map(|&(x, y)| variance(&gray.region(x, y, 8, 8)))
        .collect();
    let top_decile = percentile(&variances, 0.9);
    let specular = windows
        .iter()
        .zip(&variances)
        .filter(|&(&(x, y), &var)| {
            var > 0.0
                && var >= top_decile
                && gray.region(x, y, 8, 8).iter().any(|&v| v > p95 && v > 180.0)
        })
        .count() as f32
        / windows.len().max(1) as f32;

    0.6 * (highlights * 10.0).min(1.0) + 0.4 * (specular * 5.0).min(1.0)
}

/// Share of strong edges running diagonally, weighted by edge density.
fn crosshatch(context: &AnalysisContext) -> f32 {
    let gradients = &context.gradients;
    let (mut strong, mut diagonal) = (0usize, 0usize);
    for i in 0..gradients.len() {
        let (gx, gy) = gradients.at(i);
        if gx.hypot(gy) > 20.0 {
            strong += 1;
            let theta = edge_orientation(gx, gy);
            if (theta - PI / 4.0).abs() < PI / 8.0 || (theta - 3.0 * PI / 4.0).abs() < PI / 8.0 {
                diagonal += 1;
            }
        }
    }
    if strong == 0 {
        return 0.0;
    }
    let density = strong as f32 / gradients.len() as f32;
    diagonal as f32 / strong as f32 * (density * 4.0).min(1.0)
}

/// Mean similarity between `scale` patches and their right and lower
/// neighbours.
fn self_similarity(gray: &Plane, scale: usize) -> f32 {
    let (w, h) = (gray.width(), gray.height());
    let mut scores = Vec::new();
    for (x, y) in gray.windows(scale, scale) {
        let patch = gray.region(x, y, scale, scale);
        for (nx, ny) in [(x + scale, y), (x, y + scale)] {
            if nx + scale <= w && ny + scale <= h {
                let neighbour = gray.region(nx, ny, scale, scale);
                let diff = patch
                    .iter()
                    .zip(&neighbour)
                    .map(|(a, b)| (a - b).abs())
                    .sum::<f32>()
                    / patch.len() as f32;
                scores.push(1.0 - diff / 255.0);
            }
        }
    }
    mean(&scores)
}

fn denim(context: &AnalysisContext, metrics: &TextureMetrics) -> f32 {
    let (r, g, b) = metrics.mean_rgb;
    let blue_dominance = ((b - (r + g) / 2.0) / 60.0).clamp(0.0, 1.0);

    let (mut sampled, mut blue) = (0usize, 0usize);
    for y in (0..context.dimensions.1).step_by(2) {
        for x in (0..context.dimensions.0).step_by(2) {
            let [pr, pg, pb] = context.rgb.get_pixel(x, y).0;
            let (hue, sat, val) = rgb_to_hsv(pr, pg, pb);
            sampled += 1;
            if (190.0..=250.0).contains(&hue) && sat > 0.25 && val > 0.15 {
                blue += 1;
            }
        }
    }
    let blue_fraction = blue as f32 / sampled.max(1) as f32;

    0.4 * blue_dominance + 0.2 * metrics.crosshatch + 0.4 * blue_fraction
}

fn leather(metrics: &TextureMetrics) -> f32 {
    let grain = (1.0 - (metrics.complexity - 0.3).abs() / 0.3).clamp(0.0, 1.0);

    let (r, g, b) = metrics.mean_rgb;
    let (hue, sat, val) = rgb_to_hsv(r as u8, g as u8, b as u8);
    let plausible_color = if (15.0..=45.0).contains(&hue)
        && (0.3..=0.8).contains(&sat)
        && (0.2..=0.7).contains(&val)
    {
        1.0
    } else if val < 0.3 || (sat < 0.15 && val < 0.5) {
        0.8
    } else {
        0.2
    };

    let moderate_shine = (1.0 - (metrics.shine - 0.5).abs() * 2.0).clamp(0.0, 1.0);
    0.4 * grain + 0.35 * plausible_color + 0.25 * moderate_shine
}

fn knit(gray: &Plane, metrics: &TextureMetrics) -> f32 {
    0.5 * self_similarity(gray, 4) * metrics.texture_presence() + 0.5 * metrics.softness
}

fn woven(gray: &Plane, metrics: &TextureMetrics) -> f32 {
    (metrics.crosshatch
        + self_similarity(gray, 8) * metrics.texture_presence()
        + metrics.sharpness())
        / 3.0
}

fn velvet(gray: &Plane, metrics: &TextureMetrics) -> f32 {
    let uniformity = 1.0 / (1.0 + gray.variance() / 1000.0);
    let rows = low_frequency_ratio(&magnitude_spectrum(&gray.row_means()), 0.125);
    let cols = low_frequency_ratio(&magnitude_spectrum(&gray.col_means()), 0.125);
    0.3 * uniformity + 0.35 * metrics.softness + 0.35 * (rows + cols) / 2.0
}

/// Non-DC spectral peak of a profile relative to its DC term, or zero when
/// the peak does not stand out from the rest of the spectrum. At least two
/// repeats are required so a single edge never counts.
fn periodicity(profile: &[f32]) -> f32 {
    let half = profile.len() / 2;
    if half < 2 {
        return 0.0;
    }
    let spectrum = magnitude_spectrum(profile);
    let dc = spectrum[0];
    if dc <= f32::EPSILON {
        return 0.0;
    }
    let band = &spectrum[1..=half];
    let mean = band.iter().sum::<f32>() / band.len() as f32;
    let peak = peak_in_band(&spectrum, 2, half);
    if peak < PERIODIC_PROMINENCE * mean {
        return 0.0;
    }
    (peak / dc).min(1.0)
}

/// Stitched seams: strong edges that repeat at a regular spacing along both
/// axes and run across most of the garment.
fn quilted(context: &AnalysisContext) -> f32 {
    let gradients = &context.gradients;
    let (w, h) = (context.gray.width(), context.gray.height());
    let mut cols = vec![0.0f32; w];
    let mut rows = vec![0.0f32; h];
    for y in 0..h {
        for x in 0..w {
            if gradients.gx.get(x, y).abs() > SEAM_EDGE {
                cols[x] += 1.0;
            }
            if gradients.gy.get(x, y).abs() > SEAM_EDGE {
                rows[y] += 1.0;
            }
        }
    }

    // short edges from holes or dots are not seams
    let seams = |profile: &[f32], span: usize| {
        let coverage = profile.iter().copied().fold(0.0, f32::max) / span.max(1) as f32;
        periodicity(profile) * ((coverage - SEAM_MIN_COVERAGE) / 0.3).clamp(0.0, 1.0)
    };
    let grid = seams(&cols, h).min(seams(&rows, w));
    grid * (grid_crossing_density(gradients, SEAM_EDGE) * 15.0).min(1.0)
}

/// Darker than something within `MESH_REACH` pixels on each side of both
/// axes.
fn is_hole(gray: &Plane, x: usize, y: usize) -> bool {
    let v = gray.get(x, y) + MESH_CONTRAST;
    let brighter = |nx: usize, ny: usize| gray.get(nx, ny) > v;
    (1..=MESH_REACH).any(|d| brighter(x - d, y))
        && (1..=MESH_REACH).any(|d| brighter(x + d, y))
        && (1..=MESH_REACH).any(|d| brighter(x, y - d))
        && (1..=MESH_REACH).any(|d| brighter(x, y + d))
}

/// Open weave: small dark holes enclosed on every side, repeating at a
/// regular spacing in both directions.
fn mesh(gray: &Plane) -> f32 {
    let (w, h) = (gray.width(), gray.height());
    if w <= 2 * MESH_REACH || h <= 2 * MESH_REACH {
        return 0.0;
    }
    let (inner_w, inner_h) = (w - 2 * MESH_REACH, h - 2 * MESH_REACH);
    let mut cols = vec![0.0f32; inner_w];
    let mut rows = vec![0.0f32; inner_h];
    let mut holes = 0usize;
    for y in MESH_REACH..h - MESH_REACH {
        for x in MESH_REACH..w - MESH_REACH {
            if is_hole(gray, x, y) {
                holes += 1;
                cols[x - MESH_REACH] += 1.0;
                rows[y - MESH_REACH] += 1.0;
            }
        }
    }

    let fraction = holes as f32 / (inner_w * inner_h) as f32;
    if fraction > 0.4 {
        return 0.0;
    }
    (fraction * 25.0).min(1.0) * periodicity(&cols).min(periodicity(&rows))
}

/// Vertical ribs: a column-profile rhythm that dominates the row profile.
fn corduroy(gray: &Plane) -> f32 {
    // amplitude of the strongest non-DC component, in gray levels
    let amplitude = |profile: Vec<f32>| {
        let n = profile.len();
        peak_in_band(&magnitude_spectrum(&profile), 1, n / 2) * 2.0 / n.max(1) as f32
    };
    let vertical = amplitude(gray.col_means());
    let horizontal = amplitude(gray.row_means());
    if vertical + horizontal <= f32::EPSILON {
        return 0.0;
    }
    let dominance = vertical / (vertical + horizontal);
    if dominance > 0.7 {
        (vertical / 40.0).min(1.0) * dominance
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureResult {
    pub roughness: f32,
    pub shine: f32,
    pub signals: IndexMap<Texture, Signal>,
    /// Textures above their reporting threshold, after keyword boosts.
    pub detected: IndexMap<Texture, f32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextureAnalyzer;

impl TextureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, context: &AnalysisContext) -> TextureResult {
        let metrics = match TextureMetrics::measure(context) {
            Ok(metrics) => metrics,
            Err(e) => return Self::degraded(e),
        };
        let gray = &context.gray;
        tracing::debug!(
            "texture roughness={:.3} shine={:.3} softness={:.3}",
            metrics.roughness,
            metrics.shine,
            metrics.softness
        );

        let mut scores: IndexMap<Texture, f32> = IndexMap::new();
        scores.insert(Texture::Rough, metrics.roughness);
        scores.insert(Texture::Smooth, (1.0 - metrics.roughness).max(metrics.shine));
        scores.insert(Texture::Denim, denim(context, &metrics));
        scores.insert(Texture::Leather, leather(&metrics));
        scores.insert(Texture::Knit, knit(gray, &metrics));
        scores.insert(Texture::Woven, woven(gray, &metrics));
        scores.insert(Texture::Velvet, velvet(gray, &metrics));
        scores.insert(Texture::Quilted, quilted(context));
        scores.insert(Texture::Mesh, mesh(gray));
        scores.insert(Texture::Corduroy, corduroy(gray));

        let mut result = TextureResult {
            roughness: metrics.roughness,
            shine: metrics.shine,
            ..Default::default()
        };

        for (texture, score) in scores {
            let signal = Signal::measured(score);
            let confidence = signal.confidence();
            let reported = match texture {
                Texture::Rough => metrics.roughness > ROUGH_ABOVE,
                Texture::Smooth => confidence > 1.0 - SMOOTH_BELOW,
                other => confidence > other.threshold(),
            };
            if reported {
                // keywords only lift what the image already shows, capped at 1.0
                result
                    .detected
                    .insert(texture, boost(texture, confidence, &context.label_text));
            }
            result.signals.insert(texture, signal);
        }
        result
    }

    fn degraded(error: AnalysisError) -> TextureResult {
        tracing::warn!("texture analysis degraded: {}", error);
        let reason = error.to_string();
        let mut result = TextureResult::default();
        for texture in [Texture::Rough, Texture::Smooth]
            .into_iter()
            .chain(Texture::fabrics())
        {
            result.signals.insert(
                texture,
                Signal::Degraded {
                    reason: reason.clone(),
                },
            );
        }
        result
    }
}

/// Raise confidence by up to 20% when label text names the texture.
fn boost(texture: Texture, confidence: f32, label_text: &str) -> f32 {
    if texture.keywords().iter().any(|k| label_text.contains(k)) {
        (confidence * KEYWORD_BOOST).min(1.0)
    } else {
        confidence
    }
}

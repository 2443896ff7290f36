use std::collections::HashMap;

use image::{Rgb, RgbImage};
use indexmap::IndexMap;
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

use super::annotations::ColorSample;

const QUANTIZE_LEVELS: u8 = 16;
const DOMINANT_COLOR_COUNT: usize = 5;
const PALETTE_SAMPLE_LIMIT: usize = 10;

/// Hue in degrees [0, 360), saturation and value in [0, 1].
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let rgb = Srgb::new(r, g, b).into_format::<f32>();
    let hsv: Hsv = Hsv::from_color(rgb);
    (
        hsv.hue.into_positive_degrees() % 360.0,
        hsv.saturation,
        hsv.value,
    )
}

/// Maps RGB triples to fashion color names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorClassifier;

impl ColorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Always returns a name; unmatched input falls back to "gray".
    pub fn classify(&self, r: u8, g: u8, b: u8) -> String {
        let (h, s, v) = rgb_to_hsv(r, g, b);
        normalize_color_name(raw_color_name(h, s, v)).to_string()
    }

    pub fn classify_sample(&self, sample: &ColorSample) -> String {
        let (r, g, b) = sample.rgb;
        self.classify(r, g, b)
    }

    /// Top histogram bins of the image as color samples. `score` is relative
    /// to the most frequent bin, `pixel_fraction` to all sampled pixels.
    pub fn dominant_colors(&self, image: &RgbImage) -> Vec<ColorSample> {
        let mut color_counts: HashMap<(u8, u8, u8), u32> = HashMap::new();

        for y in (0..image.height()).step_by(2) {
            for x in (0..image.width()).step_by(2) {
                let key = quantize_rgb(image.get_pixel(x, y), QUANTIZE_LEVELS);
                *color_counts.entry(key).or_insert(0) += 1;
            }
        }

        let total: u32 = color_counts.values().sum();
        if total == 0 {
            return Vec::new();
        }

        let mut sorted: Vec<_> = color_counts.into_iter().collect();
        sorted.sort_by_key(|&(rgb, c)| (std::cmp::Reverse(c), rgb));
        let top = sorted[0].1 as f32;

        sorted
            .into_iter()
            .take(DOMINANT_COLOR_COUNT)
            .map(|(rgb, c)| ColorSample {
                rgb,
                pixel_fraction: c as f32 / total as f32,
                score: c as f32 / top,
            })
            .collect()
    }

    /// Coverage per color name over the first ten samples.
    pub fn palette(&self, samples: &[ColorSample]) -> ColorPalette {
        let mut dominant = Vec::new();
        let mut color_percentages: IndexMap<String, f32> = IndexMap::new();

        for sample in samples.iter().take(PALETTE_SAMPLE_LIMIT) {
            let name = self.classify_sample(sample);
            let percentage = sample.pixel_fraction * 100.0;
            dominant.push(NamedColor {
                name: name.clone(),
                rgb: sample.rgb,
                percentage: round2(percentage),
            });
            *color_percentages.entry(name).or_insert(0.0) += percentage;
        }

        for value in color_percentages.values_mut() {
            *value = round2(*value);
        }

        let primary_color = color_percentages
            .iter()
            .fold(None::<(&String, f32)>, |best, (name, &pct)| match best {
                Some((_, best_pct)) if best_pct >= pct => best,
                _ => Some((name, pct)),
            })
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let total_colors = color_percentages.len();
        ColorPalette {
            primary_color,
            dominant,
            color_percentages,
            total_colors,
            complexity: PaletteComplexity::from_count(total_colors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub rgb: (u8, u8, u8),
    pub percentage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteComplexity {
    Simple,
    Moderate,
    Complex,
}

impl PaletteComplexity {
    fn from_count(count: usize) -> Self {
        match count {
            0..=2 => PaletteComplexity::Simple,
            3..=4 => PaletteComplexity::Moderate,
            _ => PaletteComplexity::Complex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary_color: String,
    pub dominant: Vec<NamedColor>,
    pub color_percentages: IndexMap<String, f32>,
    pub total_colors: usize,
    pub complexity: PaletteComplexity,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            primary_color: "unknown".to_string(),
            dominant: Vec::new(),
            color_percentages: IndexMap::new(),
            total_colors: 0,
            complexity: PaletteComplexity::Simple,
        }
    }
}

/// Canonical fashion term for a handful of synonyms.
pub fn normalize_color_name(name: &str) -> &str {
    match name {
        "sky blue" | "royal blue" => "blue",
        "sage" => "mint",
        "forest green" => "green",
        "rose" => "pink",
        "grey" => "gray",
        "light gray" | "light grey" => "light-gray",
        "dark gray" | "dark grey" => "dark-gray",
        "powder blue" | "baby blue" => "powder-blue",
        other => other,
    }
}

fn quantize_rgb(px: &Rgb<u8>, q: u8) -> (u8, u8, u8) {
    // q must divide 256 evenly; each channel snaps to its bin center.
    let step = 256 / q as usize;
    let snap = |c: u8| ((c as usize / step) * step + step / 2).min(255) as u8;
    (snap(px[0]), snap(px[1]), snap(px[2]))
}

fn raw_color_name(h: f32, s: f32, v: f32) -> &'static str {
    if s < 0.15 {
        return grayscale(v);
    }
    if v < 0.15 {
        return "black";
    }
    if v > 0.85 && (0.2..=0.8).contains(&s) {
        return pastel(h);
    }
    if v > 0.85 && s < 0.3 {
        return if (20.0..60.0).contains(&h) {
            if s > 0.17 {
                "beige"
            } else {
                "cream"
            }
        } else {
            "white"
        };
    }

    match h {
        h if !(15.0..345.0).contains(&h) => {
            if v < 0.55 {
                "maroon"
            } else if s < 0.45 {
                "pink"
            } else {
                "red"
            }
        }
        h if h < 45.0 => {
            if v < 0.6 {
                "brown"
            } else if s < 0.5 {
                "tan"
            } else {
                "orange"
            }
        }
        h if h < 75.0 => {
            if v < 0.6 {
                "olive"
            } else if s < 0.5 {
                "khaki"
            } else if v < 0.8 {
                "mustard"
            } else {
                "yellow"
            }
        }
        h if h < 150.0 => {
            if v < 0.45 && h < 100.0 {
                "olive"
            } else if v < 0.4 {
                "dark green"
            } else if s < 0.4 {
                "sage"
            } else if h < 90.0 && s > 0.5 && v > 0.7 {
                "lime"
            } else {
                "green"
            }
        }
        h if h < 190.0 => {
            if v < 0.55 {
                "teal"
            } else {
                "turquoise"
            }
        }
        h if h < 270.0 => {
            if v < 0.55 {
                "navy"
            } else if s < 0.4 {
                "light blue"
            } else if h < 215.0 && v > 0.75 {
                "sky blue"
            } else {
                "blue"
            }
        }
        h if h < 345.0 => {
            if v < 0.4 {
                "plum"
            } else if h >= 310.0 {
                if s < 0.5 {
                    "pink"
                } else {
                    "magenta"
                }
            } else if s < 0.4 {
                "lavender"
            } else {
                "purple"
            }
        }
        _ => "gray",
    }
}

fn grayscale(v: f32) -> &'static str {
    if v > 0.9 {
        "white"
    } else if v > 0.75 {
        "light-gray"
    } else if v > 0.45 {
        "gray"
    } else if v > 0.25 {
        "dark-gray"
    } else if v > 0.1 {
        "charcoal"
    } else {
        "black"
    }
}

fn pastel(h: f32) -> &'static str {
    if !(15.0..330.0).contains(&h) {
        "pink"
    } else if h < 65.0 {
        "cream"
    } else if h < 170.0 {
        "mint"
    } else if h < 260.0 {
        "powder-blue"
    } else {
        "lavender"
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

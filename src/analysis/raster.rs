use image::{imageops::FilterType, DynamicImage, RgbImage};

use crate::error::AnalysisError;

/// Decode raw bytes into an image. Any format `image` understands is accepted.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, AnalysisError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Resize to a `resolution` x `resolution` RGB raster.
pub fn normalize_image(image: &DynamicImage, resolution: u32) -> RgbImage {
    image
        .resize_exact(resolution, resolution, FilterType::Triangle)
        .to_rgb8()
}

pub fn rgb_to_luma(r: u8, g: u8, b: u8) -> f32 {
    0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
}

pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

pub fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32
}

/// Nearest-rank percentile, `p` in [0, 1].
pub fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let index = ((sorted.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    sorted[index]
}

/// Single channel float raster.
#[derive(Debug, Clone)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn luma(rgb: &RgbImage) -> Self {
        Self::from_fn(rgb.width() as usize, rgb.height() as usize, |x, y| {
            let [r, g, b] = rgb.get_pixel(x as u32, y as u32).0;
            rgb_to_luma(r, g, b)
        })
    }

    pub fn channel(rgb: &RgbImage, channel: usize) -> Self {
        Self::from_fn(rgb.width() as usize, rgb.height() as usize, |x, y| {
            rgb.get_pixel(x as u32, y as u32).0[channel] as f32
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn mean(&self) -> f32 {
        mean(&self.data)
    }

    pub fn variance(&self) -> f32 {
        variance(&self.data)
    }

    /// Mean of each row, top to bottom.
    pub fn row_means(&self) -> Vec<f32> {
        self.data
            .chunks(self.width.max(1))
            .map(mean)
            .collect()
    }

    /// Mean of each column, left to right.
    pub fn col_means(&self) -> Vec<f32> {
        (0..self.width)
            .map(|x| {
                let sum: f32 = (0..self.height).map(|y| self.get(x, y)).sum();
                sum / self.height.max(1) as f32
            })
            .collect()
    }

    /// Top-left corners of every `size` window that fits, advancing by `step`.
    pub fn windows(&self, size: usize, step: usize) -> Vec<(usize, usize)> {
        if size == 0 || step == 0 || size > self.width || size > self.height {
            return Vec::new();
        }
        let mut corners = Vec::new();
        let mut y = 0;
        while y + size <= self.height {
            let mut x = 0;
            while x + size <= self.width {
                corners.push((x, y));
                x += step;
            }
            y += step;
        }
        corners
    }

    pub fn region(&self, x: usize, y: usize, width: usize, height: usize) -> Vec<f32> {
        let mut values = Vec::with_capacity(width * height);
        for row in y..(y + height).min(self.height) {
            for col in x..(x + width).min(self.width) {
                values.push(self.get(col, row));
            }
        }
        values
    }

    /// Variance of every non-overlapping `size` window.
    pub fn window_variances(&self, size: usize) -> Vec<f32> {
        self.windows(size, size)
            .into_iter()
            .map(|(x, y)| variance(&self.region(x, y, size, size)))
            .collect()
    }
}

/// Forward-difference gradients of a plane. The last column of `gx` and the
/// last row of `gy` are zero.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub gx: Plane,
    pub gy: Plane,
}

impl Gradients {
    pub fn of(plane: &Plane) -> Self {
        let (w, h) = (plane.width(), plane.height());
        let gx = Plane::from_fn(w, h, |x, y| {
            if x + 1 < w {
                plane.get(x + 1, y) - plane.get(x, y)
            } else {
                0.0
            }
        });
        let gy = Plane::from_fn(w, h, |x, y| {
            if y + 1 < h {
                plane.get(x, y + 1) - plane.get(x, y)
            } else {
                0.0
            }
        });
        Self { gx, gy }
    }

    pub fn len(&self) -> usize {
        self.gx.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at(&self, index: usize) -> (f32, f32) {
        (self.gx.data()[index], self.gy.data()[index])
    }

    pub fn magnitudes(&self) -> Vec<f32> {
        self.gx
            .data()
            .iter()
            .zip(self.gy.data())
            .map(|(gx, gy)| gx.hypot(*gy))
            .collect()
    }
}

/// Blend of local contrast and edge strength, 0..1. Used by both pattern and
/// texture analysis.
pub fn visual_complexity(plane: &Plane, gradients: &Gradients) -> f32 {
    let local = mean(&plane.window_variances(8));
    let edges = mean(&gradients.magnitudes());
    0.5 * (local / 2000.0).min(1.0) + 0.5 * (edges / 40.0).min(1.0)
}

/// Share of strong-gradient pixels that sit where a strong horizontal edge
/// crosses a strong vertical edge within a 2x2 block.
pub fn grid_crossing_density(gradients: &Gradients, strength: f32) -> f32 {
    let (w, h) = (gradients.gx.width(), gradients.gx.height());
    if w < 2 || h < 2 {
        return 0.0;
    }
    let mut crossings = 0usize;
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let block = [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)];
            let vertical = block
                .iter()
                .any(|&(bx, by)| gradients.gx.get(bx, by).abs() > strength);
            let horizontal = block
                .iter()
                .any(|&(bx, by)| gradients.gy.get(bx, by).abs() > strength);
            if vertical && horizontal {
                crossings += 1;
            }
        }
    }
    crossings as f32 / ((w - 1) * (h - 1)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_percentile_and_variance() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 5.0);
        assert_eq!(percentile(&values, 0.5), 3.0);
        assert!((variance(&values) - 2.0).abs() < 1e-6);
        assert_eq!(variance(&[]), 0.0);
    }

    #[test]
    fn test_row_and_column_means() {
        let plane = Plane::from_fn(4, 2, |x, y| (x + 10 * y) as f32);
        assert_eq!(plane.row_means(), vec![1.5, 11.5]);
        assert_eq!(plane.col_means(), vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_windows_only_yield_fitting_corners() {
        let plane = Plane::from_fn(10, 10, |_, _| 0.0);
        let corners = plane.windows(9, 3);
        assert_eq!(corners, vec![(0, 0)]);
        assert!(plane.windows(11, 1).is_empty());
        assert_eq!(plane.windows(5, 5).len(), 4);
    }

    #[test]
    fn test_gradients_of_vertical_edge() {
        let plane = Plane::from_fn(4, 4, |x, _| if x < 2 { 0.0 } else { 100.0 });
        let gradients = Gradients::of(&plane);
        assert_eq!(gradients.gx.get(1, 0), 100.0);
        assert_eq!(gradients.gx.get(0, 0), 0.0);
        assert_eq!(gradients.gy.get(1, 1), 0.0);
    }

    #[test]
    fn test_normalize_image_resizes_to_square() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([10, 20, 30])));
        let normalized = normalize_image(&image, 32);
        assert_eq!(normalized.dimensions(), (32, 32));
        assert_eq!(normalized.get_pixel(5, 5).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_grid_crossings_need_both_directions() {
        let stripes = Plane::from_fn(32, 32, |_, y| if (y / 4) % 2 == 0 { 0.0 } else { 200.0 });
        assert_eq!(grid_crossing_density(&Gradients::of(&stripes), 15.0), 0.0);

        let grid = Plane::from_fn(32, 32, |x, y| {
            60.0 + 100.0 * ((x / 8) % 2) as f32 + 80.0 * ((y / 8) % 2) as f32
        });
        assert!(grid_crossing_density(&Gradients::of(&grid), 15.0) > 0.02);
    }
}

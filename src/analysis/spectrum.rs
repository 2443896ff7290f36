use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

/// Magnitude of the forward FFT of a real-valued profile. Index 0 is DC.
pub fn magnitude_spectrum(profile: &[f32]) -> Vec<f32> {
    if profile.is_empty() {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(profile.len());
    let mut buffer: Vec<Complex32> = profile.iter().map(|&v| Complex32::new(v, 0.0)).collect();
    fft.process(&mut buffer);

    buffer.iter().map(|c| c.norm()).collect()
}

/// Largest magnitude in bins `lo..=hi`, clamped to the spectrum.
pub fn peak_in_band(spectrum: &[f32], lo: usize, hi: usize) -> f32 {
    if spectrum.is_empty() || lo >= spectrum.len() {
        return 0.0;
    }
    let hi = hi.min(spectrum.len() - 1);
    if lo > hi {
        return 0.0;
    }
    spectrum[lo..=hi].iter().copied().fold(0.0, f32::max)
}

/// Number of non-DC bins up to Nyquist that exceed both `factor` times the
/// mean non-DC magnitude and the absolute `floor`.
pub fn count_prominent_bins(spectrum: &[f32], factor: f32, floor: f32) -> usize {
    let half = spectrum.len() / 2;
    if half < 1 {
        return 0;
    }
    let band = &spectrum[1..=half];
    let mean = band.iter().sum::<f32>() / band.len() as f32;
    band.iter()
        .filter(|&&m| m > factor * mean && m > floor)
        .count()
}

/// Share of non-DC energy (up to Nyquist) that falls in the lowest
/// `cutoff` fraction of the spectrum.
pub fn low_frequency_ratio(spectrum: &[f32], cutoff: f32) -> f32 {
    let half = spectrum.len() / 2;
    if half < 1 {
        return 0.0;
    }
    let limit = ((spectrum.len() as f32 * cutoff).ceil() as usize).clamp(1, half);
    let energy = |range: &[f32]| range.iter().map(|m| m * m).sum::<f32>();
    let total = energy(&spectrum[1..=half]);
    if total <= f32::EPSILON {
        return 0.0;
    }
    energy(&spectrum[1..=limit]) / total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_wave(n: usize, period: usize) -> Vec<f32> {
        (0..n)
            .map(|i| if (i / (period / 2)) % 2 == 0 { 255.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_square_wave_peaks_at_fundamental() {
        let spectrum = magnitude_spectrum(&square_wave(64, 8));
        let fundamental = spectrum[8];
        assert!(fundamental > 5000.0);
        assert_eq!(peak_in_band(&spectrum, 1, 16), fundamental);
    }

    #[test]
    fn test_constant_profile_has_no_prominent_bins() {
        let spectrum = magnitude_spectrum(&[100.0; 32]);
        assert_eq!(count_prominent_bins(&spectrum, 2.0, 1.0), 0);
        assert_eq!(low_frequency_ratio(&spectrum, 0.125), 0.0);
        assert_eq!(peak_in_band(&spectrum, 1, 8), 0.0);
    }

    #[test]
    fn test_slow_wave_is_low_frequency() {
        let slow = square_wave(64, 32);
        let fast = square_wave(64, 4);
        let slow_ratio = low_frequency_ratio(&magnitude_spectrum(&slow), 0.125);
        let fast_ratio = low_frequency_ratio(&magnitude_spectrum(&fast), 0.125);
        assert!(slow_ratio > 0.8);
        assert!(fast_ratio < 0.1);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(magnitude_spectrum(&[]).is_empty());
        assert_eq!(peak_in_band(&[], 1, 4), 0.0);
        assert_eq!(count_prominent_bins(&[1.0], 2.0, 0.0), 0);
    }
}

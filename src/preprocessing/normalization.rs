//! Pre-emphasis and peak normalization
//!
//! # Example
//!
//! ```
//! use fretboard_dsp::preprocessing::normalization::{peak_normalize, pre_emphasis};
//!
//! let mut samples = vec![0.0f32, 0.25, -0.5, 0.25];
//! pre_emphasis(&mut samples, 0.97);
//! let peak = peak_normalize(&mut samples);
//! assert!(peak > 0.0);
//! assert!(samples.iter().all(|s| s.abs() <= 1.0));
//! ```

/// Apply first-difference pre-emphasis in place
///
/// `y[i] = x[i] - coefficient * x[i - 1]`, with `y[0] = x[0]`. This tilts
/// the spectrum upwards, lifting the upper harmonics of a DI guitar signal
/// relative to its heavy low end.
pub fn pre_emphasis(samples: &mut [f32], coefficient: f32) {
    // walk backwards so each step still sees the unmodified previous sample
    for i in (1..samples.len()).rev() {
        samples[i] -= coefficient * samples[i - 1];
    }
}

/// Scale samples so the largest absolute value becomes 1.0
///
/// A silent buffer is divided by 1.0 and left unchanged. Returns the peak
/// absolute amplitude measured before scaling.
pub fn peak_normalize(samples: &mut [f32]) -> f32 {
    let peak = peak_amplitude(samples);
    let divisor = if peak > 0.0 { peak } else { 1.0 };

    for s in samples.iter_mut() {
        *s /= divisor;
    }

    log::debug!("Peak normalization: peak={:.6}, gain={:.3}", peak, 1.0 / divisor);

    peak
}

/// Largest absolute sample value (0.0 for an empty buffer)
pub fn peak_amplitude(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_emphasis_first_difference() {
        let mut samples = vec![1.0f32, 1.0, 1.0, 0.0];
        pre_emphasis(&mut samples, 0.97);
        assert_eq!(samples[0], 1.0);
        assert!((samples[1] - 0.03).abs() < 1e-6);
        assert!((samples[2] - 0.03).abs() < 1e-6);
        assert!((samples[3] + 0.97).abs() < 1e-6);
    }

    #[test]
    fn test_peak_normalize_scales_to_unit_peak() {
        let mut samples = vec![0.1f32, -0.4, 0.2];
        let peak = peak_normalize(&mut samples);
        assert!((peak - 0.4).abs() < 1e-6);
        assert!((samples[1] + 1.0).abs() < 1e-6);
        assert!((samples[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_peak_normalize_silence_unchanged() {
        let mut samples = vec![0.0f32; 16];
        let peak = peak_normalize(&mut samples);
        assert_eq!(peak, 0.0);
        assert!(samples.iter().all(|&s| s == 0.0));
    }
}

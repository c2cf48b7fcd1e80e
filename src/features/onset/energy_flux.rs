//! Energy flux onset-strength envelope
//!
//! Algorithm:
//! 1. Divide audio into overlapping frames (frame_size, hop_size)
//! 2. Compute RMS energy per frame
//! 3. Half-wave rectified derivative: `E_flux[n] = max(0, E[n] - E[n-1])`
//!
//! The envelope rises at every attack and stays near zero while a note
//! sustains or decays, which makes it a good input for periodicity
//! estimation.
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use crate::error::AnalysisError;
use crate::features::energy::frame_rms;

/// Compute the energy flux envelope of a signal
///
/// # Arguments
///
/// * `samples` - Audio samples (mono)
/// * `frame_size` - Frame size for analysis (typically 2048)
/// * `hop_size` - Hop size between frames (typically 512)
///
/// # Returns
///
/// One value per frame after the first; empty when the signal holds fewer
/// than two frames
///
/// # Errors
///
/// Returns `AnalysisError` if the frame or hop size is 0
pub fn energy_flux_envelope(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<f32>, AnalysisError> {
    if frame_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frame size must be > 0".to_string(),
        ));
    }

    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Hop size must be > 0".to_string(),
        ));
    }

    if samples.len() < frame_size {
        log::debug!(
            "Frame size ({}) larger than audio length ({}), empty flux envelope",
            frame_size,
            samples.len()
        );
        return Ok(Vec::new());
    }

    let energies = frame_rms(samples, frame_size, hop_size);
    let flux: Vec<f32> = energies
        .windows(2)
        .map(|w| (w[1] - w[0]).max(0.0))
        .collect();

    log::debug!(
        "Energy flux: {} frames, frame={}, hop={}",
        flux.len(),
        frame_size,
        hop_size
    );

    Ok(flux)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_peaks_at_attack() {
        let mut samples = vec![0.0f32; 44100];
        for s in samples.iter_mut().skip(22050) {
            *s = 0.5;
        }
        let flux = energy_flux_envelope(&samples, 2048, 512).unwrap();
        let (peak_idx, _) = flux
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });

        // flux[i] compares frame i+1 to frame i; the step enters frames 40..=43
        assert!((39..=43).contains(&peak_idx), "peak at {}", peak_idx);
        assert!(flux.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_flux_zero_for_steady_signal() {
        let samples = vec![0.3f32; 8192];
        let flux = energy_flux_envelope(&samples, 2048, 512).unwrap();
        assert!(flux.iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_flux_short_signal_empty() {
        assert!(energy_flux_envelope(&[0.1; 100], 2048, 512).unwrap().is_empty());
    }

    #[test]
    fn test_flux_invalid_params() {
        assert!(energy_flux_envelope(&[0.1; 4096], 0, 512).is_err());
        assert!(energy_flux_envelope(&[0.1; 4096], 2048, 0).is_err());
    }
}

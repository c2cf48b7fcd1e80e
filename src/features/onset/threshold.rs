//! Adaptive thresholding for the note-gate envelope
//!
//! The gate threshold sits a fixed fraction of the way from the envelope's
//! median (the noise/sustain floor for a sparse take) to its maximum:
//!
//! `threshold = median + ratio * (max - median)`
//!
//! floored at a small positive value so a near-silent take cannot produce a
//! zero threshold that every frame would cross.

use crate::error::AnalysisError;
use crate::features::stats::median;

/// Compute the adaptive gate threshold of an energy envelope
///
/// # Arguments
///
/// * `envelope` - Smoothed frame energies
/// * `ratio` - Position between median (0.0) and maximum (1.0)
/// * `floor` - Smallest threshold returned
///
/// # Errors
///
/// Returns `AnalysisError` if the envelope is empty or the ratio is negative
pub fn adaptive_threshold(envelope: &[f32], ratio: f32, floor: f32) -> Result<f32, AnalysisError> {
    if envelope.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty envelope for threshold calculation".to_string(),
        ));
    }

    if !(ratio >= 0.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "Threshold ratio must be non-negative, got {}",
            ratio
        )));
    }

    let med = median(envelope).unwrap_or(0.0);
    let max = envelope.iter().copied().fold(0.0f32, f32::max);

    let threshold = med + ratio * (max - med);
    Ok(if threshold.is_finite() { threshold.max(floor) } else { floor })
}

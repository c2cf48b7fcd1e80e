//! Audio preprocessing modules
//!
//! This module prepares a take for pitch and onset analysis:
//! - Zero-phase band limiting (80 Hz high-pass, 4 kHz low-pass)
//! - Pre-emphasis
//! - Peak normalization
//! - Channel mixing (multichannel to mono)

pub mod channel_mixer;
pub mod filter;
pub mod normalization;

use crate::config::AnalysisConfig;
use filter::{Biquad, FilterKind};

/// Condition a raw mono signal for analysis
///
/// Applies the high-pass and low-pass stages (each skipped when its cutoff
/// is outside the valid Nyquist range), pre-emphasis, then peak
/// normalization. The output has the same length as the input and stays in
/// [-1, 1]; a silent input stays silent.
///
/// # Example
///
/// ```
/// use fretboard_dsp::{preprocessing::condition, AnalysisConfig};
///
/// let samples: Vec<f32> = (0..4410)
///     .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
///     .collect();
/// let conditioned = condition(&samples, 44100, &AnalysisConfig::default());
/// assert_eq!(conditioned.len(), samples.len());
/// ```
pub fn condition(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Vec<f32> {
    let mut signal = samples.to_vec();

    match Biquad::butterworth(FilterKind::HighPass, config.highpass_hz, sample_rate) {
        Some(hp) => signal = hp.filtfilt(&signal),
        None => log::warn!(
            "Skipping high-pass: {:.1} Hz outside (0, {}) Hz",
            config.highpass_hz,
            sample_rate / 2
        ),
    }

    match Biquad::butterworth(FilterKind::LowPass, config.lowpass_hz, sample_rate) {
        Some(lp) => signal = lp.filtfilt(&signal),
        None => log::warn!(
            "Skipping low-pass: {:.1} Hz outside (0, {}) Hz",
            config.lowpass_hz,
            sample_rate / 2
        ),
    }

    normalization::pre_emphasis(&mut signal, config.pre_emphasis);
    normalization::peak_normalize(&mut signal);

    signal
}

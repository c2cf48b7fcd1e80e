//! Autocorrelation-based tempo estimation
//!
//! Finds periodicity in the onset-strength envelope using FFT-accelerated
//! autocorrelation.
//!
//! # Algorithm
//!
//! 1. Energy flux envelope (frame-based onset strength), mean removed
//! 2. Autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`,
//!    normalized by the number of overlapping frames per lag
//! 3. Weight each lag inside the BPM range by a log-normal tempo prior
//! 4. Octave check: move to half the lag while it carries a comparable peak
//! 5. Refine the winning lag to the centroid of its neighbourhood
//! 6. Convert lag to BPM: `BPM = (60 * sample_rate) / (lag * hop_size)`
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.
//!
//! # Example
//!
//! ```
//! use fretboard_dsp::features::period::{autocorrelation::AutocorrelationTempo, TempoEstimator};
//!
//! let silence = vec![0.0f32; 44100 * 2];
//! let bpm = AutocorrelationTempo::default().estimate_bpm(&silence, 44100)?;
//! assert_eq!(bpm, 0.0);
//! # Ok::<(), fretboard_dsp::AnalysisError>(())
//! ```

use super::TempoEstimator;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::energy_flux::energy_flux_envelope;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const EPSILON: f32 = 1e-10;

/// Weighted lag strength must reach this fraction of the zero-lag power
const MIN_PERIODIC_EVIDENCE: f32 = 0.3;

/// A peak at half the winning lag with this fraction of its strength is the
/// played pulse; the winning lag only counted every other beat
const OCTAVE_PEAK_RATIO: f32 = 0.5;

/// Default tempo estimator: autocorrelation of the energy flux envelope
#[derive(Debug, Clone, PartialEq)]
pub struct AutocorrelationTempo {
    /// Minimum BPM to consider
    pub min_bpm: f32,
    /// Maximum BPM to consider
    pub max_bpm: f32,
    /// Centre of the log-normal tempo prior
    pub prior_bpm: f32,
    /// Prior width in octaves
    pub prior_octaves: f32,
    /// Envelope frame size
    pub frame_size: usize,
    /// Envelope hop size
    pub hop_size: usize,
}

impl Default for AutocorrelationTempo {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl AutocorrelationTempo {
    /// Build from the tempo section of an analysis configuration
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            prior_bpm: config.tempo_prior_bpm,
            prior_octaves: 1.0,
            frame_size: config.tempo_frame_size,
            hop_size: config.tempo_hop_size,
        }
    }

    fn prior(&self, bpm: f32) -> f32 {
        let octaves = (bpm / self.prior_bpm).log2() / self.prior_octaves;
        (-0.5 * octaves * octaves).exp()
    }
}

impl TempoEstimator for AutocorrelationTempo {
    fn name(&self) -> &str {
        "autocorrelation"
    }

    fn estimate_bpm(&self, samples: &[f32], sample_rate: u32) -> Result<f32, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }

        if self.min_bpm <= 0.0 || self.max_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }

        let envelope = energy_flux_envelope(samples, self.frame_size, self.hop_size)?;
        if envelope.len() < 2 {
            log::debug!("Envelope too short for tempo estimation");
            return Ok(0.0);
        }

        let n = envelope.len();
        let mean = envelope.iter().sum::<f32>() / n as f32;
        let centred: Vec<f32> = envelope.iter().map(|&v| v - mean).collect();
        let acf = compute_autocorrelation_fft(&centred);

        // lag = (60 * sample_rate) / (BPM * hop_size)
        let frames_per_minute = 60.0 * sample_rate as f32 / self.hop_size as f32;
        let lag_min = ((frames_per_minute / self.max_bpm).ceil() as usize).max(2);
        // at least half the envelope must overlap at the longest lag
        let lag_max = ((frames_per_minute / self.min_bpm).floor() as usize).min(n / 2);

        if lag_min >= lag_max || acf[0] <= EPSILON {
            log::debug!(
                "No tempo evidence: lag range [{}, {}], ACF(0)={:.3e}",
                lag_min,
                lag_max,
                acf[0]
            );
            return Ok(0.0);
        }

        // Clicks land on either side of a fractional period, so a lag's
        // strength includes its two neighbours
        let strength = |lag: usize| acf[lag - 1] + acf[lag] + acf[lag + 1];

        let is_peak = |lag: usize| {
            let s = strength(lag);
            s > strength(lag - 1).max(0.0) && s >= strength(lag + 1)
        };

        let mut best: Option<(usize, f32)> = None;
        for lag in lag_min..=lag_max {
            if !is_peak(lag) {
                continue;
            }
            let s = strength(lag);
            let weighted = s * self.prior(frames_per_minute / lag as f32);
            if best.map_or(true, |(_, w)| weighted > w) {
                best = Some((lag, weighted));
            }
        }

        let (lag, weighted) = match best {
            Some(b) => b,
            None => {
                log::debug!("No autocorrelation peak in tempo range");
                return Ok(0.0);
            }
        };

        if weighted < MIN_PERIODIC_EVIDENCE * acf[0] {
            log::debug!(
                "Weak periodicity at lag {}: {:.3e} vs ACF(0)={:.3e}",
                lag,
                weighted,
                acf[0]
            );
            return Ok(0.0);
        }

        // Equal-strength peaks at P and 2P: the prior alone would favour
        // the slower reading of any tempo well above its centre.
        let mut lag = lag;
        loop {
            let lo = (lag / 2).saturating_sub(1).max(lag_min);
            let hi = ((lag + 1) / 2 + 1).min(lag - 1);
            let faster = (lo..=hi)
                .filter(|&h| is_peak(h))
                .max_by(|&a, &b| strength(a).total_cmp(&strength(b)));
            match faster {
                Some(h) if strength(h) >= OCTAVE_PEAK_RATIO * strength(lag) => {
                    log::debug!("Octave check: lag {} -> {}", lag, h);
                    lag = h;
                }
                _ => break,
            }
        }

        let refined = peak_centroid(&acf, lag);
        let bpm = (frames_per_minute / refined).clamp(self.min_bpm, self.max_bpm);

        log::debug!("Autocorrelation tempo: lag {:.2} frames -> {:.2} BPM", refined, bpm);

        Ok(bpm)
    }
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²). Each lag is divided by
/// the number of overlapping frames, so the value at lag 0 is the mean
/// power. The returned vector has two trailing zeros so `lag + 2` is
/// addressable for every lag of the signal.
fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();

    // FFT size: next power of 2 >= 2*n (for zero-padding)
    let fft_size = (2 * n).next_power_of_two();

    let mut fft_input: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    fft_input.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut fft_input);

    for x in &mut fft_input {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut fft_input);

    let scale = 1.0 / (fft_size as f32);
    let mut acf: Vec<f32> = fft_input[..n]
        .iter()
        .enumerate()
        .map(|(lag, x)| x.re * scale / (n - lag) as f32)
        .collect();
    acf.extend([0.0, 0.0]);
    acf
}

/// Sub-frame lag as the centroid of the positive ACF around `lag`
fn peak_centroid(acf: &[f32], lag: usize) -> f32 {
    let (weight, moment) = (lag - 1..=lag + 1).fold((0.0f32, 0.0f32), |(w, m), l| {
        let v = acf[l].max(0.0);
        (w + v, m + v * l as f32)
    });
    if weight > EPSILON {
        moment / weight
    } else {
        lag as f32
    }
}

//! Practice score aggregation
//!
//! Combines timing, pitch and sustain into a single 0-100 score. Takes with
//! few notes have unreliable timing statistics, so they are scored on pitch
//! and sustain only.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Weight of each metric in the practice score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of timing accuracy
    pub timing_accuracy: f32,
    /// Weight of timing stability
    pub timing_stability: f32,
    /// Weight of pitch stability
    pub pitch_stability: f32,
    /// Weight of the pitch accuracy term derived from cents deviation
    pub pitch_accuracy: f32,
    /// Weight of sustain
    pub sustain: f32,
}

impl ScoreWeights {
    /// Weights for sparse takes: pitch and sustain only
    pub fn few_notes() -> Self {
        Self {
            timing_accuracy: 0.0,
            timing_stability: 0.0,
            pitch_stability: 0.5,
            pitch_accuracy: 0.2,
            sustain: 0.3,
        }
    }

    /// Weights for takes with enough notes for timing statistics
    pub fn full() -> Self {
        Self {
            timing_accuracy: 0.4,
            timing_stability: 0.25,
            pitch_stability: 0.2,
            pitch_accuracy: 0.1,
            sustain: 0.05,
        }
    }

    /// Reject negative or non-finite weights
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let weights = [
            ("timing_accuracy", self.timing_accuracy),
            ("timing_stability", self.timing_stability),
            ("pitch_stability", self.pitch_stability),
            ("pitch_accuracy", self.pitch_accuracy),
            ("sustain", self.sustain),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(AnalysisError::InvalidInput(format!(
                    "Score weight {} must be a non-negative number, got {}",
                    name, w
                )));
            }
        }
        Ok(())
    }
}

/// Metric inputs of the practice score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Number of detected notes
    pub note_count: usize,
    /// Timing accuracy in [0, 1]
    pub timing_accuracy: f32,
    /// Timing stability in [0, 1]
    pub timing_stability: f32,
    /// Pitch stability in [0, 1]
    pub pitch_stability: f32,
    /// Mean cents deviation from the nearest semitone
    pub pitch_deviation_cents: f32,
    /// Sustain in [0, 1]
    pub sustain: f32,
}

/// Compute the practice score
///
/// `pitch_accuracy_term = 1 - min(deviation / ceiling, 1)`; the weighted sum
/// is scaled to 0-100, clipped and rounded.
///
/// # Example
///
/// ```
/// use fretboard_dsp::analysis::scoring::{compute_score, ScoreInputs};
/// use fretboard_dsp::AnalysisConfig;
///
/// let inputs = ScoreInputs {
///     note_count: 8,
///     timing_accuracy: 1.0,
///     timing_stability: 1.0,
///     pitch_stability: 1.0,
///     pitch_deviation_cents: 0.0,
///     sustain: 1.0,
/// };
/// assert_eq!(compute_score(&inputs, &AnalysisConfig::default()), 100);
/// ```
pub fn compute_score(inputs: &ScoreInputs, config: &AnalysisConfig) -> u8 {
    let weights = if inputs.note_count < config.few_notes_cutoff {
        &config.few_notes_weights
    } else {
        &config.full_weights
    };

    let pitch_accuracy = pitch_accuracy_term(inputs.pitch_deviation_cents, config.deviation_ceiling_cents);

    let sum = weights.timing_accuracy * finite_or(inputs.timing_accuracy, 1.0)
        + weights.timing_stability * finite_or(inputs.timing_stability, 1.0)
        + weights.pitch_stability * finite_or(inputs.pitch_stability, 1.0)
        + weights.pitch_accuracy * pitch_accuracy
        + weights.sustain * finite_or(inputs.sustain, 0.0);

    let score = if sum.is_finite() {
        (sum * 100.0).clamp(0.0, 100.0).round() as u8
    } else {
        0
    };

    log::debug!(
        "Score: {} ({} notes, {} weighting, pitch accuracy term {:.3})",
        score,
        inputs.note_count,
        if inputs.note_count < config.few_notes_cutoff { "few-notes" } else { "full" },
        pitch_accuracy
    );

    score
}

/// `1 - min(deviation / ceiling, 1)`, 1.0 for a non-positive ceiling
pub fn pitch_accuracy_term(deviation_cents: f32, ceiling_cents: f32) -> f32 {
    if !deviation_cents.is_finite() {
        return 0.0;
    }
    if ceiling_cents.is_nan() || ceiling_cents <= 0.0 {
        return 1.0;
    }
    1.0 - (deviation_cents.max(0.0) / ceiling_cents).min(1.0)
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

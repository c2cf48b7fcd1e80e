//! Period estimation (tempo)
//!
//! Tempo is a pluggable capability: the pipeline takes any
//! [`TempoEstimator`] per invocation. [`autocorrelation::AutocorrelationTempo`]
//! is the default.

pub mod autocorrelation;

use crate::error::AnalysisError;

/// Estimates the tempo of a take
///
/// Implementations must be deterministic and return 0.0 (not an error) when
/// the signal carries no periodic evidence.
pub trait TempoEstimator {
    /// Short identifier recorded in analysis metadata
    fn name(&self) -> &str;

    /// Tempo in BPM, or 0.0 when none can be found
    fn estimate_bpm(&self, samples: &[f32], sample_rate: u32) -> Result<f32, AnalysisError>;
}

/// Fixed tempo, e.g. the metronome setting the player practised with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTempo(pub f32);

impl TempoEstimator for FixedTempo {
    fn name(&self) -> &str {
        "fixed"
    }

    fn estimate_bpm(&self, _samples: &[f32], _sample_rate: u32) -> Result<f32, AnalysisError> {
        Ok(self.0)
    }
}

//! Mono audio signal owned by one analysis run

use crate::error::AnalysisError;

/// Mono samples plus their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSignal {
    /// Wrap decoded samples
    ///
    /// Non-finite samples are replaced by 0.0.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `samples` is empty or the
    /// sample rate is 0
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
        }

        let mut replaced = 0usize;
        for s in samples.iter_mut().filter(|s| !s.is_finite()) {
            *s = 0.0;
            replaced += 1;
        }
        if replaced > 0 {
            log::warn!("Replaced {} non-finite samples with 0.0", replaced);
        }

        Ok(Self { samples, sample_rate })
    }

    /// Samples in [-1, 1]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; an empty signal cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

//! Analysis result types

use super::metadata::AnalysisMetadata;
use crate::error::AnalysisError;
use crate::features::descriptors::TakeDescriptors;
use crate::features::onset::segmenter::NoteSegment;
use serde::{Deserialize, Serialize};

/// Practice metrics of one take
///
/// Every field is finite and inside its documented range; the record is
/// built through [`SessionMetrics::new`], which enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Estimated tempo (0.0 when none was found)
    pub bpm: f32,

    /// Closeness of note spacing to the beat period (0.0-1.0)
    pub timing_accuracy: f32,

    /// Evenness of note spacing regardless of tempo (0.0-1.0)
    pub timing_stability: f32,

    /// Steadiness of pitch within notes (0.0-1.0)
    pub pitch_stability: f32,

    /// Mean cents from the nearest equal-tempered semitone (>= 0)
    pub pitch_deviation_cents: f32,

    /// How well note energy is held (0.0-1.0)
    pub sustain: f32,

    /// Number of detected notes
    pub note_count: usize,

    /// Overall practice score (0-100)
    pub practice_score: u8,
}

impl SessionMetrics {
    /// Build a validated metrics record
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::NumericalError` if any field is non-finite or
    /// outside its range
    ///
    /// # Example
    ///
    /// ```
    /// use fretboard_dsp::SessionMetrics;
    ///
    /// let ok = SessionMetrics::new(120.0, 0.9, 0.95, 0.8, 12.0, 0.6, 16, 85);
    /// assert!(ok.is_ok());
    ///
    /// let bad = SessionMetrics::new(120.0, f32::NAN, 0.95, 0.8, 12.0, 0.6, 16, 85);
    /// assert!(bad.is_err());
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bpm: f32,
        timing_accuracy: f32,
        timing_stability: f32,
        pitch_stability: f32,
        pitch_deviation_cents: f32,
        sustain: f32,
        note_count: usize,
        practice_score: u8,
    ) -> Result<Self, AnalysisError> {
        check_non_negative("bpm", bpm)?;
        check_unit("timing_accuracy", timing_accuracy)?;
        check_unit("timing_stability", timing_stability)?;
        check_unit("pitch_stability", pitch_stability)?;
        check_non_negative("pitch_deviation_cents", pitch_deviation_cents)?;
        check_unit("sustain", sustain)?;
        if practice_score > 100 {
            return Err(AnalysisError::NumericalError(format!(
                "practice_score out of range: {}",
                practice_score
            )));
        }

        Ok(Self {
            bpm,
            timing_accuracy,
            timing_stability,
            pitch_stability,
            pitch_deviation_cents,
            sustain,
            note_count,
            practice_score,
        })
    }

    /// Serialize as a flat JSON object
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        serde_json::to_string(self)
            .map_err(|e| AnalysisError::ProcessingError(format!("Failed to serialize metrics: {}", e)))
    }
}

fn check_unit(name: &str, value: f32) -> Result<(), AnalysisError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::NumericalError(format!(
            "{} outside [0, 1]: {}",
            name, value
        )))
    }
}

fn check_non_negative(name: &str, value: f32) -> Result<(), AnalysisError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::NumericalError(format!(
            "{} must be finite and >= 0: {}",
            name, value
        )))
    }
}

/// Per-note breakdown
///
/// Metrics a note had too little evidence for are `None`; they were left
/// out of the take aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMetrics {
    /// Sample range of the note
    pub segment: NoteSegment,

    /// Note start in seconds
    pub start_seconds: f32,

    /// Representative pitch in Hz
    pub pitch_hz: Option<f32>,

    /// Pitch stability (0.0-1.0)
    pub pitch_stability: Option<f32>,

    /// Cents from the nearest semitone
    pub deviation_cents: Option<f32>,

    /// Sustain (0.0-1.0)
    pub sustain: Option<f32>,
}

/// Full result of analyzing a take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeAnalysis {
    /// Practice metrics
    pub metrics: SessionMetrics,

    /// Segment boundaries in samples; the last one is the signal length
    pub boundaries: Vec<usize>,

    /// One entry per segment
    pub notes: Vec<NoteMetrics>,

    /// Raw-signal descriptors
    pub descriptors: TakeDescriptors,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

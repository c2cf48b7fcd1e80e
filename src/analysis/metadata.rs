//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Fallbacks taken while analyzing a take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisFlag {
    /// Too few notes for timing statistics; scored on pitch and sustain
    FewNotesScoring,
    /// No onset survived; the whole take is one segment
    WholeSignalFallback,
    /// The tempo estimator found no periodicity
    NoTempo,
    /// No note had enough voiced frames; pitch metrics are defaults
    NoVoicedNotes,
    /// No note was long or loud enough for a decay estimate
    NoSustainEvidence,
}

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Tempo estimator used
    pub tempo_estimator: String,

    /// Gate threshold on the smoothed energy envelope
    pub segmentation_threshold: f32,

    /// Pitch analysis window actually used
    pub pitch_frame_size: usize,

    /// Analysis flags
    pub flags: Vec<AnalysisFlag>,
}

impl AnalysisMetadata {
    /// True when `flag` was raised
    pub fn has_flag(&self, flag: AnalysisFlag) -> bool {
        self.flags.contains(&flag)
    }
}

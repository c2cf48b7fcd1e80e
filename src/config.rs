//! Configuration parameters for take analysis
//!
//! Every threshold and weight used by the pipeline lives here. The defaults
//! are hand-tuned on DI electric guitar recordings; any subset can be
//! overridden from JSON (missing keys keep their defaults).

use crate::analysis::scoring::ScoreWeights;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Analysis configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Preprocessing
    /// High-pass cutoff removing rumble (default: 80.0 Hz)
    pub highpass_hz: f32,

    /// Low-pass cutoff removing fizz (default: 4000.0 Hz)
    pub lowpass_hz: f32,

    /// Pre-emphasis coefficient (default: 0.97)
    pub pre_emphasis: f32,

    // Note segmentation
    /// RMS frame size for the segmentation envelope (default: 2048)
    pub segment_frame_size: usize,

    /// RMS hop size for the segmentation envelope (default: 256)
    pub segment_hop_size: usize,

    /// Moving-average width applied to the envelope, in frames (default: 9)
    pub envelope_smoothing: usize,

    /// Adaptive threshold ratio above the median (default: 0.06)
    ///
    /// threshold = median + ratio * (max - median)
    pub threshold_ratio: f32,

    /// Lower bound for the adaptive threshold (default: 1e-8)
    pub threshold_floor: f32,

    /// Silence needed to close a note (default: 40 ms)
    pub min_silence_ms: f32,

    /// Shortest note kept; shorter candidates are transients (default: 40 ms)
    pub min_note_ms: f32,

    /// Onsets closer than this are merged into one note (default: 40 ms)
    pub onset_merge_ms: f32,

    /// Leading amplitude, relative to peak, that implies a note at sample 0 (default: 0.05)
    pub leading_energy_ratio: f32,

    // Pitch tracking
    /// Analysis window for F0 estimation (default: 4096)
    pub pitch_frame_size: usize,

    /// Window used when the signal is shorter than `pitch_frame_size` (default: 2048)
    pub pitch_fallback_frame_size: usize,

    /// Hop between F0 frames (default: 256)
    pub pitch_hop_size: usize,

    /// Lowest plausible fundamental (default: 82.0 Hz, low E)
    pub min_pitch_hz: f32,

    /// Highest plausible fundamental (default: 1100.0 Hz)
    pub max_pitch_hz: f32,

    /// YIN absolute threshold on the normalized difference (default: 0.15)
    pub yin_threshold: f32,

    /// Median filter width over the pitch track (default: 5)
    pub pitch_median_width: usize,

    // Pitch analysis
    /// Voiced frames a note needs to be analyzed (default: 3)
    pub min_voiced_frames: usize,

    /// Intra-note deviation beyond which a frame is an outlier (default: 200 cents)
    pub outlier_cents: f32,

    /// Pitch spread, in Hz, at which stability falls to 1/e (default: 40.0)
    pub stability_scale_hz: f32,

    // Sustain
    /// RMS frame size for decay estimation (default: 1024)
    pub sustain_frame_size: usize,

    /// RMS hop size for decay estimation (default: 256)
    pub sustain_hop_size: usize,

    /// Notes shorter than this are ignored for sustain (default: 30 ms)
    pub min_sustain_ms: f32,

    // Tempo
    /// Minimum BPM to consider (default: 30.0)
    pub min_bpm: f32,

    /// Maximum BPM to consider (default: 300.0)
    pub max_bpm: f32,

    /// Centre of the log-normal tempo prior (default: 120.0)
    pub tempo_prior_bpm: f32,

    /// Frame size of the onset-strength envelope (default: 2048)
    pub tempo_frame_size: usize,

    /// Hop size of the onset-strength envelope (default: 512)
    pub tempo_hop_size: usize,

    // Scoring
    /// Takes with fewer notes use the pitch/sustain weighting (default: 4)
    pub few_notes_cutoff: usize,

    /// Cents deviation at which the pitch accuracy term reaches 0 (default: 400.0)
    pub deviation_ceiling_cents: f32,

    /// Weights for takes below `few_notes_cutoff`
    pub few_notes_weights: ScoreWeights,

    /// Weights for takes with enough notes for timing statistics
    pub full_weights: ScoreWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            highpass_hz: 80.0,
            lowpass_hz: 4000.0,
            pre_emphasis: 0.97,
            segment_frame_size: 2048,
            segment_hop_size: 256,
            envelope_smoothing: 9,
            threshold_ratio: 0.06,
            threshold_floor: 1e-8,
            min_silence_ms: 40.0,
            min_note_ms: 40.0,
            onset_merge_ms: 40.0,
            leading_energy_ratio: 0.05,
            pitch_frame_size: 4096,
            pitch_fallback_frame_size: 2048,
            pitch_hop_size: 256,
            min_pitch_hz: 82.0,
            max_pitch_hz: 1100.0,
            yin_threshold: 0.15,
            pitch_median_width: 5,
            min_voiced_frames: 3,
            outlier_cents: 200.0,
            stability_scale_hz: 40.0,
            sustain_frame_size: 1024,
            sustain_hop_size: 256,
            min_sustain_ms: 30.0,
            min_bpm: 30.0,
            max_bpm: 300.0,
            tempo_prior_bpm: 120.0,
            tempo_frame_size: 2048,
            tempo_hop_size: 512,
            few_notes_cutoff: 4,
            deviation_ceiling_cents: 400.0,
            few_notes_weights: ScoreWeights::few_notes(),
            full_weights: ScoreWeights::full(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON, keeping defaults for missing keys
    ///
    /// # Example
    ///
    /// ```
    /// use fretboard_dsp::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::from_json_str(r#"{ "threshold_ratio": 0.1 }"#)?;
    /// assert_eq!(config.threshold_ratio, 0.1);
    /// assert_eq!(config.segment_hop_size, 256);
    /// # Ok::<(), fretboard_dsp::AnalysisError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidInput(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the parameters describe a runnable pipeline
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let sizes = [
            ("segment_frame_size", self.segment_frame_size),
            ("segment_hop_size", self.segment_hop_size),
            ("envelope_smoothing", self.envelope_smoothing),
            ("pitch_frame_size", self.pitch_frame_size),
            ("pitch_fallback_frame_size", self.pitch_fallback_frame_size),
            ("pitch_hop_size", self.pitch_hop_size),
            ("pitch_median_width", self.pitch_median_width),
            ("sustain_frame_size", self.sustain_frame_size),
            ("sustain_hop_size", self.sustain_hop_size),
            ("tempo_frame_size", self.tempo_frame_size),
            ("tempo_hop_size", self.tempo_hop_size),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(AnalysisError::InvalidInput(format!("{} must be > 0", name)));
            }
        }

        let durations = [
            ("min_silence_ms", self.min_silence_ms),
            ("min_note_ms", self.min_note_ms),
            ("onset_merge_ms", self.onset_merge_ms),
            ("min_sustain_ms", self.min_sustain_ms),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::InvalidInput(format!(
                    "{} must be a non-negative duration, got {}",
                    name, value
                )));
            }
        }

        if !(self.min_pitch_hz > 0.0 && self.min_pitch_hz < self.max_pitch_hz) {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid pitch range: [{:.1}, {:.1}] Hz",
                self.min_pitch_hz, self.max_pitch_hz
            )));
        }

        if !(self.min_bpm > 0.0 && self.min_bpm < self.max_bpm) {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }

        if !(0.0..1.0).contains(&self.yin_threshold) {
            return Err(AnalysisError::InvalidInput(format!(
                "YIN threshold must be in [0, 1), got {}",
                self.yin_threshold
            )));
        }

        if self.stability_scale_hz <= 0.0 || self.deviation_ceiling_cents <= 0.0 {
            return Err(AnalysisError::InvalidInput(
                "Stability scale and deviation ceiling must be positive".to_string(),
            ));
        }

        self.few_notes_weights.validate()?;
        self.full_weights.validate()?;

        Ok(())
    }
}

/// Convert a duration in milliseconds to a count of hops, at least 1
pub(crate) fn ms_to_frames(ms: f32, sample_rate: u32, hop_size: usize) -> usize {
    let frames = (ms / 1000.0) * sample_rate as f32 / hop_size.max(1) as f32;
    (frames.round() as usize).max(1)
}

/// Convert a duration in milliseconds to a count of samples, at least 1
pub(crate) fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    (((ms / 1000.0) * sample_rate as f32).round() as usize).max(1)
}

//! Note segmentation from a smoothed energy envelope
//!
//! Algorithm:
//! 1. RMS energy on frames of `segment_frame_size`, hop `segment_hop_size`
//! 2. Moving average over `envelope_smoothing` frames
//! 3. Adaptive threshold `median + ratio * (max - median)`, floored
//! 4. Hysteresis gate (see [`super::gate`]) yields onset frames
//! 5. Frames to samples, leading-note recovery, onset merging
//! 6. Boundaries terminated by the signal length, whole-signal fallback

use super::gate::{run_gate, GateParams};
use super::threshold::adaptive_threshold;
use crate::config::{ms_to_frames, ms_to_samples, AnalysisConfig};
use crate::error::AnalysisError;
use crate::features::energy::{frame_rms, moving_average};
use crate::preprocessing::normalization::peak_amplitude;
use serde::{Deserialize, Serialize};

/// Relative margin below the adaptive threshold that still counts as sounding
///
/// A steady tone's envelope ripples by up to a few percent with the phase of
/// the analysis frame; on a take that is one long note the threshold sits
/// inside that ripple.
const GATE_TOLERANCE: f32 = 0.05;

/// Half-open sample range `[start, end)` of one note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSegment {
    /// First sample of the note
    pub start: usize,
    /// One past the last sample of the note
    pub end: usize,
}

impl NoteSegment {
    /// Length in samples
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for a zero-length segment
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of segmenting a take
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Detected note onsets in samples (empty when nothing was played)
    pub onsets: Vec<usize>,
    /// Strictly increasing boundaries; the last one is the signal length
    pub boundaries: Vec<usize>,
    /// Gate threshold used on the smoothed envelope
    pub threshold: f32,
}

impl Segmentation {
    /// Number of detected notes
    pub fn note_count(&self) -> usize {
        self.onsets.len()
    }

    /// True when no onset survived and the whole signal is one segment
    pub fn is_fallback(&self) -> bool {
        self.onsets.is_empty()
    }

    /// Consecutive boundary pairs as note segments
    pub fn segments(&self) -> Vec<NoteSegment> {
        self.boundaries
            .windows(2)
            .map(|w| NoteSegment {
                start: w[0],
                end: w[1],
            })
            .collect()
    }

    /// Onset times in seconds
    pub fn onset_times(&self, sample_rate: u32) -> Vec<f32> {
        self.onsets
            .iter()
            .map(|&s| s as f32 / sample_rate as f32)
            .collect()
    }
}

/// Split a conditioned signal into note segments
///
/// # Arguments
///
/// * `samples` - Conditioned mono samples (non-empty)
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Analysis configuration
///
/// # Returns
///
/// `Segmentation` whose boundaries always describe at least one segment
///
/// # Errors
///
/// Returns `AnalysisError` if the signal is empty or the sample rate is 0
///
/// # Example
///
/// ```
/// use fretboard_dsp::features::onset::segmenter::segment;
/// use fretboard_dsp::AnalysisConfig;
///
/// let silence = vec![0.0f32; 44100];
/// let seg = segment(&silence, 44100, &AnalysisConfig::default())?;
/// assert_eq!(seg.note_count(), 0);
/// assert_eq!(seg.boundaries, vec![0, 44100]);
/// # Ok::<(), fretboard_dsp::AnalysisError>(())
/// ```
pub fn segment(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<Segmentation, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Cannot segment an empty signal".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    let hop = config.segment_hop_size;
    let energies = frame_rms(samples, config.segment_frame_size, hop);
    let envelope = moving_average(&energies, config.envelope_smoothing);
    let threshold = adaptive_threshold(&envelope, config.threshold_ratio, config.threshold_floor)?;

    let params = gate_params(threshold, sample_rate, config);

    log::debug!(
        "Segmenting {} frames: threshold={:.6}, min_silence={} frames, min_note={} frames",
        envelope.len(),
        threshold,
        params.min_silence_frames,
        params.min_note_frames
    );

    let mut onsets: Vec<usize> = run_gate(&envelope, &params)
        .into_iter()
        .map(|frame| frame * hop)
        .filter(|&s| s < samples.len())
        .collect();

    // A note sounding from the first sample can cross the threshold a few
    // frames late when its envelope hovers around the threshold.
    if let Some(&first) = onsets.first() {
        if first > 0 {
            let peak = peak_amplitude(samples);
            let leading = peak_amplitude(&samples[..first]);
            if leading > config.leading_energy_ratio * peak {
                log::debug!(
                    "Leading energy {:.4} before first onset at {}, adding onset at 0",
                    leading,
                    first
                );
                onsets.insert(0, 0);
            }
        }
    }

    let onsets = merge_onsets(&onsets, ms_to_samples(config.onset_merge_ms, sample_rate));

    let mut boundaries = if onsets.is_empty() {
        log::debug!("No onsets survived, using the whole signal as one segment");
        vec![0]
    } else {
        onsets.clone()
    };
    if boundaries.last() != Some(&samples.len()) {
        boundaries.push(samples.len());
    }

    log::debug!("Segmentation: {} notes, {} boundaries", onsets.len(), boundaries.len());

    Ok(Segmentation {
        onsets,
        boundaries,
        threshold,
    })
}

/// Gate parameters for an adaptive threshold, with the sounding margin applied
fn gate_params(threshold: f32, sample_rate: u32, config: &AnalysisConfig) -> GateParams {
    let hop = config.segment_hop_size;
    GateParams {
        threshold: threshold * (1.0 - GATE_TOLERANCE),
        min_silence_frames: ms_to_frames(config.min_silence_ms, sample_rate, hop),
        min_note_frames: ms_to_frames(config.min_note_ms, sample_rate, hop),
    }
}

/// Drop onsets closer than `window` samples to the previously kept onset
///
/// The later onset is treated as a re-trigger of the same note.
pub fn merge_onsets(onsets: &[usize], window: usize) -> Vec<usize> {
    let mut merged: Vec<usize> = Vec::with_capacity(onsets.len());
    for &onset in onsets {
        match merged.last() {
            Some(&last) if onset < last + window => {}
            _ => merged.push(onset),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_bursts(sample_rate: u32, bursts: &[(f32, f32)], total_s: f32) -> Vec<f32> {
        let n = (total_s * sample_rate as f32) as usize;
        let mut samples = vec![0.0f32; n];
        for &(start_s, dur_s) in bursts {
            let start = (start_s * sample_rate as f32) as usize;
            let end = ((start_s + dur_s) * sample_rate as f32) as usize;
            for (i, s) in samples.iter_mut().enumerate().take(end.min(n)).skip(start) {
                let t = (i - start) as f32 / sample_rate as f32;
                *s = 0.8 * (2.0 * std::f32::consts::PI * 330.0 * t).sin();
            }
        }
        samples
    }

    fn assert_valid_boundaries(seg: &Segmentation, len: usize) {
        assert!(seg.boundaries.len() >= 2);
        assert!(seg.boundaries.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*seg.boundaries.last().unwrap(), len);
    }

    #[test]
    fn test_merge_onsets() {
        assert_eq!(merge_onsets(&[0, 100, 5000, 5100, 9000], 1764), vec![0, 5000, 9000]);
        assert!(merge_onsets(&[], 1764).is_empty());
    }

    #[test]
    fn test_silence_falls_back_to_whole_signal() {
        let samples = vec![0.0f32; 22050];
        let seg = segment(&samples, 44100, &AnalysisConfig::default()).unwrap();
        assert!(seg.is_fallback());
        assert_eq!(seg.segments(), vec![NoteSegment { start: 0, end: 22050 }]);
    }

    #[test]
    fn test_three_separated_notes() {
        let sr = 44100;
        let samples = tone_bursts(sr, &[(0.3, 0.4), (1.0, 0.4), (1.7, 0.4)], 2.5);
        let seg = segment(&samples, sr, &AnalysisConfig::default()).unwrap();

        assert_eq!(seg.note_count(), 3, "onsets: {:?}", seg.onsets);
        assert_valid_boundaries(&seg, samples.len());

        let expected = [0.3f32, 1.0, 1.7];
        for (onset, exp) in seg.onset_times(sr).iter().zip(expected.iter()) {
            // smoothing and the frame length pull onsets earlier by up to ~70 ms
            assert!(
                (onset - exp).abs() < 0.1,
                "onset {:.3}s should be near {:.3}s",
                onset,
                exp
            );
        }
    }

    #[test]
    fn test_note_from_first_sample_gets_onset_zero() {
        let sr = 44100;
        let samples = tone_bursts(sr, &[(0.0, 0.6)], 1.0);
        let seg = segment(&samples, sr, &AnalysisConfig::default()).unwrap();
        assert_eq!(seg.onsets, vec![0]);
        assert_valid_boundaries(&seg, samples.len());
    }

    #[test]
    fn test_late_start_folds_into_onset_zero() {
        // 20 ms of silence, then a note: the first crossing lands a few
        // frames in and the leading-energy onset absorbs it
        let sr = 44100;
        let samples = tone_bursts(sr, &[(0.02, 1.0)], 1.5);
        let seg = segment(&samples, sr, &AnalysisConfig::default()).unwrap();
        assert_eq!(seg.onsets, vec![0]);
        assert_valid_boundaries(&seg, samples.len());
    }

    #[test]
    fn test_frame_just_under_threshold_keeps_note_sounding() {
        use crate::features::onset::gate::GateState;

        let config = AnalysisConfig::default();
        let params = gate_params(1.0, 44100, &config);
        let active = GateState::Active {
            start: 3,
            silent_frames: 2,
        };

        let (next, event) = active.step(10, 0.96, &params);
        assert_eq!(
            next,
            GateState::Active {
                start: 3,
                silent_frames: 0
            }
        );
        assert_eq!(event, None);

        let (next, _) = GateState::Inactive.step(0, 0.96, &params);
        assert!(matches!(next, GateState::Active { start: 0, .. }));

        let (next, _) = active.step(10, 0.9, &params);
        assert_eq!(
            next,
            GateState::Active {
                start: 3,
                silent_frames: 3
            }
        );
    }

    #[test]
    fn test_sustained_tones_stay_one_note() {
        let sr = 44100;
        for &freq in &[82.41f32, 435.0, 440.0, 987.77] {
            let samples: Vec<f32> = (0..2 * sr as usize)
                .map(|i| 0.8 * (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
                .collect();
            let seg = segment(&samples, sr, &AnalysisConfig::default()).unwrap();
            assert_eq!(seg.onsets, vec![0], "{} Hz split into {:?}", freq, seg.onsets);
        }
    }

    #[test]
    fn test_short_signal_single_frame() {
        let samples = vec![0.5f32; 300];
        let seg = segment(&samples, 44100, &AnalysisConfig::default()).unwrap();
        assert_valid_boundaries(&seg, samples.len());
        assert_eq!(seg.boundaries[0], 0);
    }

    #[test]
    fn test_empty_signal_rejected() {
        assert!(segment(&[], 44100, &AnalysisConfig::default()).is_err());
        assert!(segment(&[0.0; 10], 0, &AnalysisConfig::default()).is_err());
    }
}

//! Per-note pitch reduction
//!
//! For each note the voiced estimates are trimmed to their central half
//! (attack and release glides removed), outliers beyond a cents limit of the
//! median are discarded, and the remaining spread gives a stability value.
//! The representative pitch is compared to the nearest equal-tempered
//! semitone for intonation.

use super::PitchTrack;
use crate::config::AnalysisConfig;
use crate::features::onset::segmenter::NoteSegment;
use crate::features::stats::{mean, median, std_dev};

/// Pitch summary of one note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotePitch {
    /// Representative F0 in Hz
    pub pitch_hz: f32,
    /// `exp(-std_hz / scale)`, 1.0 for a perfectly steady note
    pub stability: f32,
    /// Absolute cents from the nearest equal-tempered semitone
    pub deviation_cents: f32,
}

/// Pitch metrics of a take
#[derive(Debug, Clone, PartialEq)]
pub struct PitchAnalysis {
    /// Mean stability over analyzed notes (1.0 when none qualified)
    pub pitch_stability: f32,
    /// Mean intonation error over analyzed notes (0.0 when none qualified)
    pub pitch_deviation_cents: f32,
    /// One entry per segment; `None` when the note lacked voiced frames
    pub notes: Vec<Option<NotePitch>>,
}

impl PitchAnalysis {
    /// Number of notes that contributed to the aggregates
    pub fn analyzed_notes(&self) -> usize {
        self.notes.iter().filter(|n| n.is_some()).count()
    }
}

/// Reduce a pitch track to per-note and aggregate pitch metrics
///
/// # Arguments
///
/// * `track` - Smoothed pitch track
/// * `segments` - Note segments from segmentation
/// * `config` - Analysis configuration
///
/// # Returns
///
/// Aggregates over qualifying notes, or `(1.0, 0.0)` when no note has
/// enough voiced frames
pub fn analyze_pitch(track: &PitchTrack, segments: &[NoteSegment], config: &AnalysisConfig) -> PitchAnalysis {
    let notes: Vec<Option<NotePitch>> = segments
        .iter()
        .map(|segment| analyze_note(&track.voiced_in(segment), config))
        .collect();

    let stabilities: Vec<f32> = notes.iter().flatten().map(|n| n.stability).collect();
    let deviations: Vec<f32> = notes.iter().flatten().map(|n| n.deviation_cents).collect();

    let (pitch_stability, pitch_deviation_cents) = match (mean(&stabilities), mean(&deviations)) {
        (Some(s), Some(d)) => (s, d),
        _ => {
            log::debug!("No note with enough voiced frames, using pitch defaults");
            (1.0, 0.0)
        }
    };

    log::debug!(
        "Pitch: {}/{} notes analyzed, stability={:.3}, deviation={:.1} cents",
        stabilities.len(),
        segments.len(),
        pitch_stability,
        pitch_deviation_cents
    );

    PitchAnalysis {
        pitch_stability,
        pitch_deviation_cents,
        notes,
    }
}

/// Analyze the voiced estimates of a single note
///
/// Returns `None` when fewer than `min_voiced_frames` estimates are present.
pub fn analyze_note(voiced: &[f32], config: &AnalysisConfig) -> Option<NotePitch> {
    if voiced.len() < config.min_voiced_frames.max(1) {
        return None;
    }

    let n = voiced.len();
    let quarter = n / 4;
    let central = &voiced[quarter..n - quarter];

    let centre = median(central)?;
    let cleaned: Vec<f32> = central
        .iter()
        .copied()
        .filter(|&hz| cents_between(hz, centre).abs() <= config.outlier_cents)
        .collect();
    let kept: &[f32] = if cleaned.len() >= 2 { &cleaned } else { central };

    let pitch_hz = median(kept)?;
    let spread = std_dev(kept)?;
    let stability = (-spread / config.stability_scale_hz).exp().clamp(0.0, 1.0);
    let deviation_cents = cents_from_semitone(pitch_hz);

    if !(pitch_hz.is_finite() && stability.is_finite() && deviation_cents.is_finite()) {
        return None;
    }

    Some(NotePitch {
        pitch_hz,
        stability,
        deviation_cents,
    })
}

/// Signed interval from `reference` to `freq` in cents
pub fn cents_between(freq: f32, reference: f32) -> f32 {
    1200.0 * (freq / reference).log2()
}

/// Absolute cents between `freq` and the nearest equal-tempered semitone (A4 = 440 Hz)
///
/// # Example
///
/// ```
/// use fretboard_dsp::features::pitch::analyzer::cents_from_semitone;
///
/// assert!(cents_from_semitone(440.0) < 1e-3);
/// assert!((cents_from_semitone(452.89) - 50.0).abs() < 0.5);
/// ```
pub fn cents_from_semitone(freq: f32) -> f32 {
    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    let nearest = 440.0 * 2.0f32.powf((midi.round() - 69.0) / 12.0);
    cents_between(freq, nearest).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(frames: Vec<Option<f32>>) -> PitchTrack {
        PitchTrack {
            frames,
            hop_size: 256,
            frame_size: 4096,
        }
    }

    #[test]
    fn test_steady_in_tune_note() {
        let config = AnalysisConfig::default();
        let note = analyze_note(&vec![440.0; 40], &config).unwrap();
        assert!((note.pitch_hz - 440.0).abs() < 1e-4);
        assert!((note.stability - 1.0).abs() < 1e-6);
        assert!(note.deviation_cents < 1e-3);
    }

    #[test]
    fn test_too_few_voiced_frames() {
        let config = AnalysisConfig::default();
        assert_eq!(analyze_note(&[440.0, 440.0], &config), None);
    }

    #[test]
    fn test_glides_and_outliers_removed() {
        let config = AnalysisConfig::default();
        // attack glide in the first quarter, release in the last, one octave
        // jump in the middle
        let mut voiced = vec![300.0f32; 10];
        voiced.extend(vec![220.0f32; 20]);
        voiced[20] = 440.0;
        voiced.extend(vec![150.0f32; 10]);

        let note = analyze_note(&voiced, &config).unwrap();
        assert!((note.pitch_hz - 220.0).abs() < 1e-4);
        assert!((note.stability - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wobble_lowers_stability() {
        let config = AnalysisConfig::default();
        let voiced: Vec<f32> = (0..40).map(|i| if i % 2 == 0 { 200.0 } else { 240.0 }).collect();
        let note = analyze_note(&voiced, &config).unwrap();
        // population std of +/-20 Hz is 20 Hz
        assert!((note.stability - (-0.5f32).exp()).abs() < 1e-4);
    }

    #[test]
    fn test_cleaning_fallback_keeps_uncleaned_slice() {
        let config = AnalysisConfig::default();
        // central slice [100, 400, 1000, 100]; median 250 puts every value
        // beyond 200 cents
        let voiced = [100.0f32, 100.0, 400.0, 1000.0, 100.0, 100.0];
        let note = analyze_note(&voiced, &config).unwrap();
        assert!((note.pitch_hz - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_quarter_tone_deviation() {
        // 50 cents above A4
        let freq = 440.0 * 2.0f32.powf(50.0 / 1200.0);
        assert!((cents_from_semitone(freq) - 50.0).abs() < 0.1);
        // 20 cents flat of E2
        let e2 = 82.41 * 2.0f32.powf(-20.0 / 1200.0);
        assert!((cents_from_semitone(e2) - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_aggregate_over_segments() {
        let config = AnalysisConfig::default();
        let mut frames = vec![Some(440.0f32); 20];
        frames.extend(vec![None; 20]);
        let track = track(frames);
        let segments = [
            NoteSegment { start: 0, end: 20 * 256 },
            NoteSegment {
                start: 20 * 256,
                end: 40 * 256,
            },
        ];
        let analysis = analyze_pitch(&track, &segments, &config);
        assert_eq!(analysis.analyzed_notes(), 1);
        assert!(analysis.notes[1].is_none());
        assert!((analysis.pitch_stability - 1.0).abs() < 1e-6);
        assert!(analysis.pitch_deviation_cents < 1e-3);
    }

    #[test]
    fn test_no_voiced_notes_defaults() {
        let config = AnalysisConfig::default();
        let analysis = analyze_pitch(
            &track(vec![None; 50]),
            &[NoteSegment { start: 0, end: 50 * 256 }],
            &config,
        );
        assert_eq!(analysis.pitch_stability, 1.0);
        assert_eq!(analysis.pitch_deviation_cents, 0.0);
        assert_eq!(analysis.analyzed_notes(), 0);
    }
}

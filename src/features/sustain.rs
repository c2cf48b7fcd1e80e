//! Sustain estimation from per-note energy decay
//!
//! A note's sustain is `exp(-(ln first_rms - ln last_rms))`, i.e. the ratio
//! of its final to initial RMS clipped to [0, 1]. Energy that barely drops
//! gives a value near 1; a fast decay approaches 0.

use crate::config::{ms_to_samples, AnalysisConfig};
use crate::features::energy::frame_rms;
use crate::features::onset::segmenter::NoteSegment;
use crate::features::stats::mean;

/// RMS values at or below this are ignored (log of zero)
const MIN_RMS: f32 = 1e-9;

/// Fewest usable RMS frames for a decay estimate
const MIN_DECAY_FRAMES: usize = 3;

/// Sustain of a take
#[derive(Debug, Clone, PartialEq)]
pub struct SustainAnalysis {
    /// Mean sustain over qualifying notes (0.0 when none qualified)
    pub sustain: f32,
    /// Per-segment sustain; `None` when the note was too short or too quiet
    pub notes: Vec<Option<f32>>,
}

/// Estimate sustain for each note and the take
///
/// # Arguments
///
/// * `samples` - Conditioned mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `segments` - Note segments from segmentation
/// * `config` - Analysis configuration
pub fn estimate_sustain(
    samples: &[f32],
    sample_rate: u32,
    segments: &[NoteSegment],
    config: &AnalysisConfig,
) -> SustainAnalysis {
    let min_len = ms_to_samples(config.min_sustain_ms, sample_rate);

    let notes: Vec<Option<f32>> = segments
        .iter()
        .map(|seg| {
            if seg.len() < min_len || seg.end > samples.len() {
                return None;
            }
            note_sustain(
                &samples[seg.start..seg.end],
                config.sustain_frame_size,
                config.sustain_hop_size,
            )
        })
        .collect();

    let values: Vec<f32> = notes.iter().flatten().copied().collect();
    let sustain = mean(&values).unwrap_or_else(|| {
        log::debug!("No note long enough for a decay estimate, sustain is 0");
        0.0
    });

    log::debug!("Sustain: {:.3} over {}/{} notes", sustain, values.len(), segments.len());

    SustainAnalysis { sustain, notes }
}

/// Sustain of one note's samples, `None` without enough energy frames
pub fn note_sustain(note: &[f32], frame_size: usize, hop_size: usize) -> Option<f32> {
    let energies: Vec<f32> = frame_rms(note, frame_size, hop_size)
        .into_iter()
        .filter(|&e| e > MIN_RMS)
        .collect();

    if energies.len() < MIN_DECAY_FRAMES {
        return None;
    }

    let first = energies[0];
    let last = energies[energies.len() - 1];
    let decay = first.ln() - last.ln();
    let value = (-decay).exp().clamp(0.0, 1.0);

    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decaying_sine(len: usize, sample_rate: u32, tau_s: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (-t / tau_s).exp() * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_steady_note_sustains() {
        let note: Vec<f32> = (0..22050)
            .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
            .collect();
        let value = note_sustain(&note, 1024, 256).unwrap();
        assert!(value > 0.95, "steady note sustain {}", value);
    }

    #[test]
    fn test_fast_decay_scores_low() {
        let slow = note_sustain(&decaying_sine(22050, 44100, 1.0), 1024, 256).unwrap();
        let fast = note_sustain(&decaying_sine(22050, 44100, 0.05), 1024, 256).unwrap();
        assert!(fast < 0.01, "fast decay {}", fast);
        assert!(slow > fast);
        assert!(slow > 0.6 && slow < 0.7, "slow decay {}", slow);
    }

    #[test]
    fn test_growing_note_clipped_to_one() {
        let note: Vec<f32> = (0..8192).map(|i| i as f32 / 8192.0).collect();
        assert_eq!(note_sustain(&note, 1024, 256), Some(1.0));
    }

    #[test]
    fn test_silent_note_skipped() {
        assert_eq!(note_sustain(&vec![0.0f32; 8192], 1024, 256), None);
    }

    #[test]
    fn test_short_segments_skipped() {
        let config = AnalysisConfig::default();
        let samples = vec![0.5f32; 44100];
        let segments = [
            NoteSegment { start: 0, end: 1000 },
            NoteSegment {
                start: 1000,
                end: 44100,
            },
        ];
        let analysis = estimate_sustain(&samples, 44100, &segments, &config);
        assert_eq!(analysis.notes[0], None);
        assert!((analysis.sustain - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_silence_sustain_zero() {
        let config = AnalysisConfig::default();
        let samples = vec![0.0f32; 44100];
        let analysis = estimate_sustain(&samples, 44100, &[NoteSegment { start: 0, end: 44100 }], &config);
        assert_eq!(analysis.sustain, 0.0);
    }
}

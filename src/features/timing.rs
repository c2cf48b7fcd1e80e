//! Timing accuracy and stability from note onsets
//!
//! Accuracy compares every inter-onset interval (IOI) to the beat period of
//! the estimated tempo. Stability ignores tempo and measures how evenly the
//! notes are spaced, using median statistics so a single late note does not
//! dominate.

use crate::features::stats::{mean, median};

/// Timing metrics of a take
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingAnalysis {
    /// `1 - mean(|ioi - beat| / beat)`, clipped to [0, 1]
    pub accuracy: f32,
    /// `1 - median(|ioi - median_ioi|) / median_ioi`, clipped to [0, 1]
    pub stability: f32,
}

/// Analyze onset timing against a tempo
///
/// # Arguments
///
/// * `onset_times` - Note onsets in seconds, increasing
/// * `tempo_bpm` - Tempo of the take (0.0 when unknown)
///
/// # Returns
///
/// Accuracy defaults to 1.0 with fewer than 2 onsets or no tempo;
/// stability defaults to 1.0 with fewer than 3 onsets
///
/// # Example
///
/// ```
/// use fretboard_dsp::features::timing::analyze_timing;
///
/// let onsets = [0.0, 0.5, 1.0, 1.5];
/// let timing = analyze_timing(&onsets, 120.0);
/// assert!((timing.accuracy - 1.0).abs() < 1e-6);
/// assert!((timing.stability - 1.0).abs() < 1e-6);
/// ```
pub fn analyze_timing(onset_times: &[f32], tempo_bpm: f32) -> TimingAnalysis {
    let intervals: Vec<f32> = onset_times.windows(2).map(|w| w[1] - w[0]).collect();

    let analysis = TimingAnalysis {
        accuracy: timing_accuracy(&intervals, tempo_bpm),
        stability: timing_stability(&intervals),
    };

    log::debug!(
        "Timing: {} onsets at {:.1} BPM, accuracy={:.3}, stability={:.3}",
        onset_times.len(),
        tempo_bpm,
        analysis.accuracy,
        analysis.stability
    );

    analysis
}

fn timing_accuracy(intervals: &[f32], tempo_bpm: f32) -> f32 {
    if intervals.is_empty() || !(tempo_bpm.is_finite() && tempo_bpm > 0.0) {
        return 1.0;
    }

    let beat = 60.0 / tempo_bpm;
    let errors: Vec<f32> = intervals.iter().map(|&ioi| (ioi - beat).abs() / beat).collect();
    match mean(&errors) {
        Some(err) if err.is_finite() => (1.0 - err).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

fn timing_stability(intervals: &[f32]) -> f32 {
    if intervals.len() < 2 {
        return 1.0;
    }

    let centre = match median(intervals) {
        Some(m) if m > 0.0 => m,
        _ => return 1.0,
    };
    let deviations: Vec<f32> = intervals.iter().map(|&ioi| (ioi - centre).abs()).collect();
    match median(&deviations) {
        Some(mad) if mad.is_finite() => (1.0 - mad / centre).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

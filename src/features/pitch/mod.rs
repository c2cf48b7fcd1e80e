//! Pitch tracking and per-note pitch analysis
//!
//! - [`yin`]: frame-level F0 estimation
//! - [`smoothing`]: voiced-aware median filtering of the track
//! - [`analyzer`]: per-note representative pitch, stability and intonation

pub mod analyzer;
pub mod smoothing;
pub mod yin;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::segmenter::NoteSegment;
use yin::YinEstimator;

/// Frame-level F0 estimates of a take
///
/// Frame `t` is centred on sample `t * hop_size`. Unvoiced frames are
/// `None`, never a numeric sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTrack {
    /// Per-frame F0 in Hz
    pub frames: Vec<Option<f32>>,
    /// Hop between frame centres in samples
    pub hop_size: usize,
    /// Analysis window actually used
    pub frame_size: usize,
}

impl PitchTrack {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when the track holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of voiced frames
    pub fn voiced_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    /// Voiced estimates whose frame centre lies inside `segment`, in time order
    pub fn voiced_in(&self, segment: &NoteSegment) -> Vec<f32> {
        if self.hop_size == 0 {
            return Vec::new();
        }
        let first = segment.start.div_ceil(self.hop_size);
        let last = segment.end.div_ceil(self.hop_size).min(self.frames.len());
        if first >= last {
            return Vec::new();
        }
        self.frames[first..last].iter().flatten().copied().collect()
    }
}

/// Estimate a smoothed F0 track over a conditioned signal
///
/// Uses `pitch_frame_size` when the signal holds at least that many samples,
/// otherwise `pitch_fallback_frame_size`. Frames are zero padded at the
/// signal edges, giving `1 + len / hop` frames.
///
/// # Errors
///
/// Returns `AnalysisError` if the signal is empty, the sample rate is 0 or
/// the hop size is 0
///
/// # Example
///
/// ```
/// use fretboard_dsp::{features::pitch::track_pitch, AnalysisConfig};
///
/// let samples: Vec<f32> = (0..8192)
///     .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 44100.0).sin())
///     .collect();
/// let track = track_pitch(&samples, 44100, &AnalysisConfig::default())?;
/// assert_eq!(track.len(), 1 + 8192 / 256);
/// assert!(track.voiced_count() > 0);
/// # Ok::<(), fretboard_dsp::AnalysisError>(())
/// ```
pub fn track_pitch(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<PitchTrack, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Cannot track pitch of an empty signal".to_string(),
        ));
    }
    if sample_rate == 0 || config.pitch_hop_size == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid pitch tracking setup: sample_rate={}, hop={}",
            sample_rate, config.pitch_hop_size
        )));
    }

    let hop = config.pitch_hop_size;
    let num_frames = 1 + samples.len() / hop;

    let preferred = if samples.len() >= config.pitch_frame_size {
        config.pitch_frame_size
    } else {
        log::debug!(
            "Signal of {} samples shorter than pitch window {}, using {}",
            samples.len(),
            config.pitch_frame_size,
            config.pitch_fallback_frame_size
        );
        config.pitch_fallback_frame_size
    };

    let build = |frame_size: usize| {
        YinEstimator::new(
            frame_size,
            sample_rate,
            config.min_pitch_hz,
            config.max_pitch_hz,
            config.yin_threshold,
        )
    };
    let estimator = match build(preferred).or_else(|| build(config.pitch_fallback_frame_size)) {
        Some(e) => e,
        None => {
            log::warn!(
                "No usable pitch window for {}-{} Hz at {} Hz, track is unvoiced",
                config.min_pitch_hz,
                config.max_pitch_hz,
                sample_rate
            );
            return Ok(PitchTrack {
                frames: vec![None; num_frames],
                hop_size: hop,
                frame_size: preferred,
            });
        }
    };

    let frame_size = estimator.frame_size();
    let half = frame_size / 2;
    let mut frame = vec![0.0f32; frame_size];

    let raw: Vec<Option<f32>> = (0..num_frames)
        .map(|t| {
            let centre = t * hop;
            fill_centred(&mut frame, samples, centre, half);
            estimator.estimate(&frame)
        })
        .collect();

    let frames = smoothing::smooth_track(&raw, config.pitch_median_width);

    log::debug!(
        "Pitch track: {} frames (window {}), {} voiced",
        frames.len(),
        frame_size,
        frames.iter().filter(|f| f.is_some()).count()
    );

    Ok(PitchTrack {
        frames,
        hop_size: hop,
        frame_size,
    })
}

/// Copy the window centred on `centre` into `frame`, zero padding outside the signal
fn fill_centred(frame: &mut [f32], samples: &[f32], centre: usize, half: usize) {
    frame.fill(0.0);
    let src_start = centre.saturating_sub(half);
    let dst_start = half.saturating_sub(centre);
    let src_end = (centre + frame.len() - half).min(samples.len());
    if src_start < src_end {
        frame[dst_start..dst_start + (src_end - src_start)].copy_from_slice(&samples[src_start..src_end]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.8 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_fill_centred_pads_edges() {
        let samples: Vec<f32> = (1..=10).map(|v| v as f32).collect();
        let mut frame = vec![0.0f32; 4];

        fill_centred(&mut frame, &samples, 0, 2);
        assert_eq!(frame, vec![0.0, 0.0, 1.0, 2.0]);

        fill_centred(&mut frame, &samples, 5, 2);
        assert_eq!(frame, vec![4.0, 5.0, 6.0, 7.0]);

        fill_centred(&mut frame, &samples, 9, 2);
        assert_eq!(frame, vec![8.0, 9.0, 10.0, 0.0]);
    }

    #[test]
    fn test_track_sine_is_voiced_at_pitch() {
        let samples = sine(196.0, 44100, 44100);
        let track = track_pitch(&samples, 44100, &AnalysisConfig::default()).unwrap();
        assert_eq!(track.len(), 1 + 44100 / 256);
        assert_eq!(track.frame_size, 4096);

        let mid = &track.frames[40..130];
        assert!(mid.iter().all(|f| f.is_some()));
        for hz in mid.iter().flatten() {
            assert!((hz - 196.0).abs() < 1.0, "got {} Hz", hz);
        }
    }

    #[test]
    fn test_track_silence_unvoiced() {
        let track = track_pitch(&vec![0.0f32; 22050], 44100, &AnalysisConfig::default()).unwrap();
        assert_eq!(track.voiced_count(), 0);
    }

    #[test]
    fn test_short_signal_uses_fallback_window() {
        let samples = sine(330.0, 44100, 3000);
        let track = track_pitch(&samples, 44100, &AnalysisConfig::default()).unwrap();
        assert_eq!(track.frame_size, 2048);
        assert_eq!(track.len(), 1 + 3000 / 256);
    }

    #[test]
    fn test_voiced_in_uses_frame_centres() {
        let track = PitchTrack {
            frames: vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)],
            hop_size: 100,
            frame_size: 400,
        };
        // centres 0, 100, 200, 300, 400
        assert_eq!(track.voiced_in(&NoteSegment { start: 50, end: 350 }), vec![2.0, 4.0]);
        assert_eq!(track.voiced_in(&NoteSegment { start: 0, end: 100 }), vec![1.0]);
        assert_eq!(track.voiced_in(&NoteSegment { start: 400, end: 450 }), vec![5.0]);
    }

    #[test]
    fn test_empty_signal_rejected() {
        assert!(track_pitch(&[], 44100, &AnalysisConfig::default()).is_err());
    }
}

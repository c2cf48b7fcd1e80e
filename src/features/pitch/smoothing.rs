//! Median smoothing of a pitch track
//!
//! Unvoiced frames are bridged by linear interpolation between neighbouring
//! voiced frames (track edges hold the nearest voiced value) so the median
//! filter sees a continuous contour, then re-marked unvoiced afterwards.
//! Smoothing never turns an unvoiced frame into a voiced one.

use crate::features::stats::median;

/// Median-filter a pitch track without fabricating voiced frames
///
/// # Arguments
///
/// * `frames` - Per-frame F0, `None` for unvoiced frames
/// * `width` - Median window in frames; the window shrinks at the edges
///
/// # Returns
///
/// Smoothed track of the same length. A fully unvoiced track is returned
/// unchanged.
pub fn smooth_track(frames: &[Option<f32>], width: usize) -> Vec<Option<f32>> {
    if width <= 1 || frames.iter().all(Option::is_none) {
        return frames.to_vec();
    }

    let filled = fill_gaps(frames);
    let half = width / 2;
    let n = filled.len();

    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            frame.and_then(|_| {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(n);
                median(&filled[lo..hi])
            })
        })
        .collect()
}

/// Replace unvoiced frames with interpolated values
///
/// Requires at least one voiced frame.
fn fill_gaps(frames: &[Option<f32>]) -> Vec<f32> {
    let voiced: Vec<(usize, f32)> = frames
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.map(|hz| (i, hz)))
        .collect();

    let mut filled = vec![0.0f32; frames.len()];
    let (first_idx, first_hz) = voiced[0];
    let (last_idx, last_hz) = voiced[voiced.len() - 1];

    for v in filled.iter_mut().take(first_idx) {
        *v = first_hz;
    }
    for v in filled.iter_mut().skip(last_idx) {
        *v = last_hz;
    }
    for pair in voiced.windows(2) {
        let (a, fa) = pair[0];
        let (b, fb) = pair[1];
        let span = (b - a) as f32;
        for (k, v) in filled[a..b].iter_mut().enumerate() {
            *v = fa + (fb - fa) * k as f32 / span;
        }
    }
    filled[last_idx] = last_hz;

    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_unvoiced_unchanged() {
        let frames = vec![None; 8];
        assert_eq!(smooth_track(&frames, 5), frames);
    }

    #[test]
    fn test_removes_single_frame_spike() {
        let mut frames = vec![Some(220.0f32); 9];
        frames[4] = Some(440.0);
        let smoothed = smooth_track(&frames, 5);
        assert_eq!(smoothed[4], Some(220.0));
    }

    #[test]
    fn test_unvoiced_frames_stay_unvoiced() {
        let frames = vec![
            Some(100.0f32),
            Some(100.0),
            None,
            None,
            Some(200.0),
            Some(200.0),
        ];
        let smoothed = smooth_track(&frames, 5);
        assert_eq!(smoothed[2], None);
        assert_eq!(smoothed[3], None);
        assert!(smoothed[0].is_some() && smoothed[5].is_some());
    }

    #[test]
    fn test_gap_fill_interpolates() {
        let filled = fill_gaps(&[None, Some(100.0), None, Some(200.0), None]);
        assert_eq!(filled, vec![100.0, 100.0, 150.0, 200.0, 200.0]);
    }

    #[test]
    fn test_edges_use_shrunken_window() {
        let frames = vec![Some(100.0f32), Some(300.0), Some(300.0), Some(300.0)];
        let smoothed = smooth_track(&frames, 5);
        // frame 0 sees frames 0..3
        assert_eq!(smoothed[0], Some(300.0));
        assert_eq!(smoothed.len(), 4);
    }
}

//! Short-time RMS energy and envelope smoothing

/// Compute RMS energy on non-centred frames
///
/// Frame `i` covers `[i * hop_size, i * hop_size + frame_size)`. A signal
/// shorter than one frame yields a single frame spanning the whole signal;
/// an empty signal yields no frames.
///
/// # Arguments
///
/// * `samples` - Audio samples
/// * `frame_size` - Frame length in samples (> 0)
/// * `hop_size` - Hop between frame starts in samples (> 0)
pub fn frame_rms(samples: &[f32], frame_size: usize, hop_size: usize) -> Vec<f32> {
    if samples.is_empty() || frame_size == 0 || hop_size == 0 {
        return Vec::new();
    }

    if samples.len() < frame_size {
        return vec![rms(samples)];
    }

    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    (0..num_frames)
        .map(|i| {
            let start = i * hop_size;
            rms(&samples[start..start + frame_size])
        })
        .collect()
}

/// Root-mean-square of a block of samples (0.0 for an empty block)
pub fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = block.iter().map(|&x| x as f64 * x as f64).sum();
    (sum_sq / block.len() as f64).sqrt() as f32
}

/// Centred moving average
///
/// Output has the same length as the input. Near the edges the window is
/// truncated and the mean is taken over the frames that exist, so an
/// envelope that is loud from its first frame stays loud after smoothing.
pub fn moving_average(values: &[f32], width: usize) -> Vec<f32> {
    if width <= 1 || values.is_empty() {
        return values.to_vec();
    }

    let half_left = (width - 1) / 2;
    let n = values.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    for &v in values {
        let last = *prefix.last().unwrap_or(&0.0);
        prefix.push(last + v as f64);
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half_left);
            let hi = (i + width - half_left).min(n);
            ((prefix[hi] - prefix[lo]) / (hi - lo) as f64) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rms_constant_signal() {
        let samples = vec![0.5f32; 4096];
        let frames = frame_rms(&samples, 1024, 256);
        assert_eq!(frames.len(), (4096 - 1024) / 256 + 1);
        assert!(frames.iter().all(|&e| (e - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_frame_rms_short_signal_single_frame() {
        let samples = vec![1.0f32; 100];
        let frames = frame_rms(&samples, 2048, 256);
        assert_eq!(frames.len(), 1);
        assert!((frames[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_rms_empty() {
        assert!(frame_rms(&[], 2048, 256).is_empty());
    }

    #[test]
    fn test_moving_average_suppresses_spike() {
        let mut values = vec![0.0f32; 21];
        values[10] = 9.0;
        let smoothed = moving_average(&values, 9);
        assert_eq!(smoothed.len(), values.len());
        // the spike is spread evenly over 9 frames
        assert!((smoothed[10] - 1.0).abs() < 1e-6);
        assert!((smoothed[6] - 1.0).abs() < 1e-6);
        assert!((smoothed[14] - 1.0).abs() < 1e-6);
        assert_eq!(smoothed[5], 0.0);
        assert_eq!(smoothed[15], 0.0);
    }

    #[test]
    fn test_moving_average_edges_truncated() {
        let values = vec![1.0f32; 20];
        let smoothed = moving_average(&values, 9);
        assert!(smoothed.iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let mut ramp = vec![0.0f32; 10];
        ramp[0] = 5.0;
        let smoothed = moving_average(&ramp, 9);
        // frame 0 averages frames 0..5
        assert!((smoothed[0] - 1.0).abs() < 1e-6);
    }
}

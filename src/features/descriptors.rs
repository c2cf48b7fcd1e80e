//! Raw-signal descriptors of a take
//!
//! Loudness, noisiness, brightness and timbre summaries computed on the
//! signal as recorded, before conditioning. They are reported next to the practice
//! metrics and do not affect the score.

use crate::features::energy::rms;
use crate::features::mfcc::{mfcc_mean, MelFilterbank, N_MELS, N_MFCC};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

/// Frame size for descriptor analysis
pub const DESCRIPTOR_FRAME_SIZE: usize = 2048;

/// Hop size for descriptor analysis
pub const DESCRIPTOR_HOP_SIZE: usize = 512;

const EPSILON: f32 = 1e-10;

/// Mean frame descriptors of a take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeDescriptors {
    /// Mean frame RMS
    pub loudness_rms: f32,
    /// Mean fraction of adjacent sample pairs that change sign
    pub zero_crossing_rate: f32,
    /// Mean magnitude-weighted frequency in Hz (silent frames count as 0)
    pub spectral_centroid: f32,
    /// Mean of each of the first 20 MFCCs over the take
    pub mfcc_mean: Vec<f32>,
}

impl TakeDescriptors {
    /// Compute descriptors over frames of 2048 samples, hop 512
    ///
    /// A signal shorter than one frame is analyzed as a single zero-padded
    /// frame. An empty signal yields all zeros.
    pub fn compute(samples: &[f32], sample_rate: u32) -> Self {
        if samples.is_empty() || sample_rate == 0 {
            return Self {
                loudness_rms: 0.0,
                zero_crossing_rate: 0.0,
                spectral_centroid: 0.0,
                mfcc_mean: vec![0.0; N_MFCC],
            };
        }

        let frame_size = DESCRIPTOR_FRAME_SIZE;
        let hop_size = DESCRIPTOR_HOP_SIZE;
        let num_frames = if samples.len() >= frame_size {
            (samples.len() - frame_size) / hop_size + 1
        } else {
            1
        };

        let window = hann_window(frame_size);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
        let filterbank = MelFilterbank::new(N_MELS, frame_size, sample_rate);
        let mut mel_frames = Vec::with_capacity(num_frames);

        let mut loudness = 0.0f64;
        let mut zcr = 0.0f64;
        let mut centroid = 0.0f64;

        for i in 0..num_frames {
            let start = i * hop_size;
            let end = (start + frame_size).min(samples.len());
            let frame = &samples[start..end];

            loudness += rms(frame) as f64;
            zcr += zero_crossing_rate(frame) as f64;

            for (k, slot) in buffer.iter_mut().enumerate() {
                let x = frame.get(k).copied().unwrap_or(0.0);
                *slot = Complex::new(x * window[k], 0.0);
            }
            fft.process(&mut buffer);
            let spectrum = &buffer[..frame_size / 2 + 1];
            centroid += spectral_centroid(spectrum, sample_rate, frame_size) as f64;

            let power: Vec<f32> = spectrum.iter().map(|c| c.norm_sqr()).collect();
            mel_frames.push(filterbank.apply(&power));
        }

        let n = num_frames as f64;
        let descriptors = Self {
            loudness_rms: (loudness / n) as f32,
            zero_crossing_rate: (zcr / n) as f32,
            spectral_centroid: (centroid / n) as f32,
            mfcc_mean: mfcc_mean(&mel_frames),
        };

        log::debug!(
            "Descriptors over {} frames: rms={:.4}, zcr={:.4}, centroid={:.1} Hz",
            num_frames,
            descriptors.loudness_rms,
            descriptors.zero_crossing_rate,
            descriptors.spectral_centroid
        );

        descriptors
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        .collect()
}

/// Fraction of adjacent sample pairs with a sign change
fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (frame.len() - 1) as f32
}

/// Magnitude-weighted mean frequency of one spectrum (bins 0..=N/2)
fn spectral_centroid(spectrum: &[Complex<f32>], sample_rate: u32, fft_size: usize) -> f32 {
    let bin_hz = sample_rate as f32 / fft_size as f32;
    let (weighted, total) = spectrum
        .iter()
        .enumerate()
        .fold((0.0f32, 0.0f32), |(w, t), (k, c)| {
            let mag = c.norm();
            (w + mag * k as f32 * bin_hz, t + mag)
        });
    if total > EPSILON {
        weighted / total
    } else {
        0.0
    }
}

//! YIN fundamental-frequency estimation
//!
//! # Algorithm
//!
//! 1. Difference function `d(tau) = sum_j (x[j] - x[j + tau])^2` over an
//!    integration window of half the frame, computed with FFT acceleration:
//!    `d(tau) = e(0) + e(tau) - 2 r(tau)` where `r` is the cross-correlation
//!    of the window with the frame and `e` are sliding energies
//! 2. Cumulative mean normalized difference `d'(tau) = d(tau) / mean(d(1..=tau))`
//! 3. First dip under the absolute threshold inside the lag range, walked
//!    down to its local minimum
//! 4. Parabolic interpolation of `d` around the minimum for sub-sample lag
//!
//! A frame without a dip under the threshold is unvoiced; no numeric guess
//! is produced for it.
//!
//! # Reference
//!
//! de Cheveigné, A., & Kawahara, H. (2002). YIN, a fundamental frequency
//! estimator for speech and music. *JASA*, 111(4), 1917-1930.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Frames with less energy per sample than this are unvoiced
const SILENCE_ENERGY: f64 = 1e-10;

/// Reusable YIN estimator for a fixed frame length
pub struct YinEstimator {
    frame_size: usize,
    window: usize,
    min_lag: usize,
    max_lag: usize,
    sample_rate: f32,
    min_freq: f32,
    max_freq: f32,
    threshold: f32,
    fft_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl YinEstimator {
    /// Build an estimator
    ///
    /// Returns `None` when the frame is too short to hold a full period of
    /// `min_freq` in its integration window, or the lag range is empty.
    pub fn new(
        frame_size: usize,
        sample_rate: u32,
        min_freq: f32,
        max_freq: f32,
        threshold: f32,
    ) -> Option<Self> {
        if frame_size < 4 || sample_rate == 0 || min_freq <= 0.0 || max_freq <= min_freq {
            return None;
        }

        let sr = sample_rate as f32;
        let window = frame_size / 2;
        let min_lag = ((sr / max_freq).floor() as usize).max(2);
        let max_lag = ((sr / min_freq).ceil() as usize).min(frame_size - window);
        if min_lag + 1 >= max_lag {
            return None;
        }

        let fft_size = (frame_size + window).next_power_of_two();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        Some(Self {
            frame_size,
            window,
            min_lag,
            max_lag,
            sample_rate: sr,
            min_freq,
            max_freq,
            threshold,
            fft_size,
            forward,
            inverse,
        })
    }

    /// Frame length this estimator expects
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Estimate F0 of one frame, `None` when unvoiced
    ///
    /// `frame` must hold exactly `frame_size` samples.
    pub fn estimate(&self, frame: &[f32]) -> Option<f32> {
        if frame.len() != self.frame_size {
            return None;
        }

        let energy: f64 = frame.iter().map(|&x| x as f64 * x as f64).sum();
        if energy / (frame.len() as f64) < SILENCE_ENERGY {
            return None;
        }

        let diff = self.difference(frame);
        let cmndf = cumulative_mean_normalized(&diff);

        let mut tau = self.min_lag;
        let mut found = None;
        while tau <= self.max_lag {
            if cmndf[tau] < self.threshold {
                while tau < self.max_lag && cmndf[tau + 1] < cmndf[tau] {
                    tau += 1;
                }
                found = Some(tau);
                break;
            }
            tau += 1;
        }
        let tau = found?;

        // d' is skewed by its running mean; the raw difference is symmetric
        // around the true period.
        let refined = parabolic_interpolation(&diff, tau);
        if !refined.is_finite() || refined <= 0.0 {
            return None;
        }

        let freq = self.sample_rate / refined;
        if freq.is_finite() && freq >= self.min_freq && freq <= self.max_freq {
            Some(freq)
        } else {
            None
        }
    }

    /// Difference function for lags `0..=max_lag`
    fn difference(&self, frame: &[f32]) -> Vec<f32> {
        let w = self.window;
        let zero = Complex::new(0.0f32, 0.0);

        let mut head: Vec<Complex<f32>> = frame[..w].iter().map(|&x| Complex::new(x, 0.0)).collect();
        head.resize(self.fft_size, zero);
        let mut full: Vec<Complex<f32>> = frame.iter().map(|&x| Complex::new(x, 0.0)).collect();
        full.resize(self.fft_size, zero);

        self.forward.process(&mut head);
        self.forward.process(&mut full);

        // r(tau) = sum_j head[j] * full[j + tau]
        for (h, f) in head.iter_mut().zip(full.iter()) {
            *h = h.conj() * f;
        }
        self.inverse.process(&mut head);
        let scale = 1.0 / self.fft_size as f32;

        let mut prefix = Vec::with_capacity(frame.len() + 1);
        prefix.push(0.0f64);
        for &x in frame {
            let last = *prefix.last().unwrap_or(&0.0);
            prefix.push(last + x as f64 * x as f64);
        }
        let energy_at = |tau: usize| prefix[tau + w] - prefix[tau];
        let e0 = energy_at(0);

        (0..=self.max_lag)
            .map(|tau| {
                let r = (head[tau].re * scale) as f64;
                (e0 + energy_at(tau) - 2.0 * r).max(0.0) as f32
            })
            .collect()
    }
}

/// Cumulative mean normalized difference, `d'(0) = 1`
pub fn cumulative_mean_normalized(diff: &[f32]) -> Vec<f32> {
    let mut out = vec![1.0f32; diff.len()];
    let mut running = 0.0f64;
    for tau in 1..diff.len() {
        running += diff[tau] as f64;
        out[tau] = if running > 0.0 {
            (diff[tau] as f64 * tau as f64 / running) as f32
        } else {
            1.0
        };
    }
    out
}

/// Sub-sample position of the minimum at `tau` from a parabola through its neighbours
fn parabolic_interpolation(data: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= data.len() {
        return tau as f32;
    }

    let s0 = data[tau - 1];
    let s1 = data[tau];
    let s2 = data[tau + 1];
    let curvature = s0 - 2.0 * s1 + s2;
    if curvature <= 1e-12 {
        return tau as f32;
    }

    let offset = (s0 - s2) / (2.0 * curvature);
    if offset.abs() > 1.0 {
        return tau as f32;
    }
    tau as f32 + offset
}

//! Second-order Butterworth filters and zero-phase filtering
//!
//! Coefficients follow the RBJ Audio EQ Cookbook with Q = 1/sqrt(2), which
//! is the bilinear-transform Butterworth response with pre-warped cutoff.
//! `filtfilt` runs a filter forward then backward so the result has no
//! group delay, padding both ends with an odd reflection and starting each
//! pass from steady-state filter memory to keep edge transients small.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Reflection length used at each end of the signal
const PAD_LEN: usize = 9;

/// Response type of a second-order section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Passes content above the cutoff
    HighPass,
    /// Passes content below the cutoff
    LowPass,
}

/// Normalized biquad coefficients (a0 = 1)
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Design a 2nd-order Butterworth section
    ///
    /// Returns `None` when the cutoff is outside `(0, sample_rate / 2)`,
    /// in which case the stage should be skipped.
    pub fn butterworth(kind: FilterKind, cutoff_hz: f32, sample_rate: u32) -> Option<Self> {
        let nyquist = sample_rate as f64 / 2.0;
        let cutoff = cutoff_hz as f64;
        if !(cutoff > 0.0 && cutoff < nyquist) {
            return None;
        }

        let w0 = 2.0 * PI * cutoff / sample_rate as f64;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * FRAC_1_SQRT_2);

        let (b0, b1, b2) = match kind {
            FilterKind::HighPass => ((1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0),
            FilterKind::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Some(Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        })
    }

    /// Filter memory for a constant unit input (Direct Form II transposed)
    fn steady_state(&self) -> (f64, f64) {
        let dc_gain = (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2);
        (dc_gain - self.b0, self.b2 - self.a2 * dc_gain)
    }

    /// Run the filter over `signal` starting from memory scaled to its first sample
    fn run(&self, signal: &mut [f64]) {
        let Some(&first) = signal.first() else {
            return;
        };
        let (z1, z2) = self.steady_state();
        let mut s1 = z1 * first;
        let mut s2 = z2 * first;

        for x in signal.iter_mut() {
            let input = *x;
            let output = self.b0 * input + s1;
            s1 = self.b1 * input + s2 - self.a1 * output;
            s2 = self.b2 * input - self.a2 * output;
            *x = output;
        }
    }

    /// Zero-phase forward-backward filtering
    ///
    /// The output has the same length as the input.
    pub fn filtfilt(&self, samples: &[f32]) -> Vec<f32> {
        let n = samples.len();
        if n < 2 {
            return samples.to_vec();
        }

        let pad = PAD_LEN.min(n - 1);
        let first = samples[0] as f64;
        let last = samples[n - 1] as f64;

        // Odd extension: 2*x[0] - x[pad..1], signal, 2*x[n-1] - x[n-2..n-1-pad]
        let mut work = Vec::with_capacity(n + 2 * pad);
        work.extend((1..=pad).rev().map(|i| 2.0 * first - samples[i] as f64));
        work.extend(samples.iter().map(|&x| x as f64));
        work.extend((1..=pad).map(|i| 2.0 * last - samples[n - 1 - i] as f64));

        self.run(&mut work);
        work.reverse();
        self.run(&mut work);
        work.reverse();

        work[pad..pad + n].iter().map(|&x| x as f32).collect()
    }
}

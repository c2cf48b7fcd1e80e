//! Mel-frequency cepstral coefficients
//!
//! Timbre summary of a take. Per frame: power spectrum, Slaney-style mel
//! filterbank (area-normalized triangles on the Slaney mel scale), decibel
//! conversion with an 80 dB dynamic range below the loudest band of the
//! take, then an orthonormal DCT-II keeping the first coefficients.

/// Mel bands in the filterbank
pub const N_MELS: usize = 128;

/// Cepstral coefficients kept per frame
pub const N_MFCC: usize = 20;

/// Dynamic range kept below the loudest mel band, in dB
const TOP_DB: f32 = 80.0;

/// Power floor before the log
const AMIN: f32 = 1e-10;

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

/// Hz to mel: linear below 1 kHz, logarithmic above
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Inverse of [`hz_to_mel`]
pub fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular mel filters over the bins `0..=fft_size/2` of a real FFT
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<Vec<f32>>,
}

impl MelFilterbank {
    /// Filterbank spanning 0 Hz to Nyquist
    pub fn new(n_mels: usize, fft_size: usize, sample_rate: u32) -> Self {
        let n_bins = fft_size / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;
        let mel_max = hz_to_mel(nyquist);

        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();
        let bin_hz = sample_rate as f32 / fft_size as f32;

        let filters = (0..n_mels)
            .map(|m| {
                let (lo, centre, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let norm = 2.0 / (hi - lo);
                (0..n_bins)
                    .map(|k| {
                        let f = k as f32 * bin_hz;
                        let rising = (f - lo) / (centre - lo);
                        let falling = (hi - f) / (hi - centre);
                        rising.min(falling).max(0.0) * norm
                    })
                    .collect()
            })
            .collect();

        Self { filters }
    }

    /// Number of bands
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True when the filterbank has no bands
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Mel band energies of one power spectrum
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| filter.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect()
    }
}

/// Orthonormal DCT-II, first `n_out` coefficients
pub fn dct_ii(input: &[f32], n_out: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }
    let n_f = n as f64;
    (0..n_out)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x as f64 * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n_f)).cos()
                })
                .sum();
            let scale = if k == 0 { (1.0 / n_f).sqrt() } else { (2.0 / n_f).sqrt() };
            (sum * scale) as f32
        })
        .collect()
}

/// Mean MFCC vector over frames of mel band energies
///
/// Returns `N_MFCC` zeros when there are no frames.
pub fn mfcc_mean(mel_frames: &[Vec<f32>]) -> Vec<f32> {
    if mel_frames.is_empty() {
        return vec![0.0; N_MFCC];
    }

    let to_db = |p: f32| 10.0 * p.max(AMIN).log10();
    let loudest = mel_frames
        .iter()
        .flat_map(|frame| frame.iter())
        .map(|&p| to_db(p))
        .fold(f32::NEG_INFINITY, f32::max);
    let floor = loudest - TOP_DB;

    let mut sums = vec![0.0f64; N_MFCC];
    for frame in mel_frames {
        let db: Vec<f32> = frame.iter().map(|&p| to_db(p).max(floor)).collect();
        for (sum, c) in sums.iter_mut().zip(dct_ii(&db, N_MFCC)) {
            *sum += c as f64;
        }
    }

    let n = mel_frames.len() as f64;
    sums.into_iter().map(|s| (s / n) as f32).collect()
}

//! # Fretboard DSP
//!
//! Practice-quality metrics for monophonic guitar takes: tempo, timing
//! accuracy and stability, pitch stability and intonation, sustain, and a
//! composite 0-100 practice score.
//!
//! ## Quick Start
//!
//! ```
//! use fretboard_dsp::{analyze_take, AnalysisConfig};
//!
//! // Two seconds of A4
//! let samples: Vec<f32> = (0..88200)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
//!     .collect();
//!
//! let metrics = analyze_take(&samples, 44100, AnalysisConfig::default())?;
//! println!("Score: {} ({} notes)", metrics.practice_score, metrics.note_count);
//! # Ok::<(), fretboard_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Samples → Preprocessing → Segmentation ─┬─ Pitch tracking → Pitch analysis ─┐
//!                                         ├─ Sustain ─────────────────────────┼→ Score → SessionMetrics
//!                                         └─ Tempo → Timing ──────────────────┘
//! ```
//!
//! Every stage is public so it can be run and tested on its own. Degenerate
//! input (silence, a single impulse, noise) never fails: each stage falls
//! back to a defined default and the result records which fallbacks were
//! taken in its metadata flags.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

// Re-export main types
pub use analysis::metadata::{AnalysisFlag, AnalysisMetadata};
pub use analysis::result::{NoteMetrics, SessionMetrics, TakeAnalysis};
pub use analysis::scoring::{compute_score, ScoreInputs, ScoreWeights};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::descriptors::TakeDescriptors;
pub use features::onset::segmenter::{segment, NoteSegment, Segmentation};
pub use features::period::autocorrelation::AutocorrelationTempo;
pub use features::period::{FixedTempo, TempoEstimator};
pub use features::pitch::analyzer::analyze_pitch;
pub use features::pitch::{track_pitch, PitchTrack};
pub use features::sustain::estimate_sustain;
pub use features::timing::analyze_timing;
pub use io::decoder::{decode_file, AudioDecoder, DecodedAudio, SymphoniaDecoder};
pub use io::signal::AudioSignal;
pub use preprocessing::condition;

use std::time::Instant;

/// Main analysis function
///
/// Runs the full pipeline with the default autocorrelation tempo estimator
/// and returns the practice metrics.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the samples are empty, the
/// sample rate is 0 or the configuration is invalid
///
/// # Example
///
/// ```
/// use fretboard_dsp::{analyze_take, AnalysisConfig};
///
/// let silence = vec![0.0f32; 44100];
/// let metrics = analyze_take(&silence, 44100, AnalysisConfig::default())?;
/// assert_eq!(metrics.note_count, 0);
/// assert_eq!(metrics.sustain, 0.0);
/// # Ok::<(), fretboard_dsp::AnalysisError>(())
/// ```
pub fn analyze_take(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
) -> Result<SessionMetrics, AnalysisError> {
    let tempo = AutocorrelationTempo::from_config(&config);
    analyze_take_with(samples, sample_rate, &config, &tempo).map(|analysis| analysis.metrics)
}

/// Decode an encoded audio buffer and analyze it
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the bytes cannot be decoded;
/// no partial metrics are produced
pub fn analyze_audio_bytes(bytes: &[u8], config: AnalysisConfig) -> Result<SessionMetrics, AnalysisError> {
    let audio = SymphoniaDecoder::default().decode(bytes)?;
    analyze_take(audio.samples(), audio.sample_rate(), config)
}

/// Analyze a take with an injected tempo estimator
///
/// Returns the practice metrics together with the segmentation, per-note
/// breakdown, raw-signal descriptors and metadata.
///
/// # Errors
///
/// Returns `AnalysisError` if the input or configuration is invalid, or the
/// tempo estimator fails
///
/// # Example
///
/// ```
/// use fretboard_dsp::{analyze_take_with, AnalysisConfig, AnalysisFlag, FixedTempo};
///
/// let silence = vec![0.0f32; 22050];
/// let analysis = analyze_take_with(&silence, 44100, &AnalysisConfig::default(), &FixedTempo(100.0))?;
/// assert_eq!(analysis.metrics.bpm, 100.0);
/// assert!(analysis.metadata.has_flag(AnalysisFlag::WholeSignalFallback));
/// # Ok::<(), fretboard_dsp::AnalysisError>(())
/// ```
pub fn analyze_take_with(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    tempo: &dyn TempoEstimator,
) -> Result<TakeAnalysis, AnalysisError> {
    let start_time = Instant::now();

    log::debug!("Starting take analysis: {} samples at {} Hz", samples.len(), sample_rate);

    config.validate()?;
    let signal = AudioSignal::new(samples.to_vec(), sample_rate)?;

    let descriptors = TakeDescriptors::compute(signal.samples(), sample_rate);

    // Preprocessing
    let conditioned = condition(signal.samples(), sample_rate, config);

    // Segmentation
    let segmentation = segment(&conditioned, sample_rate, config)?;
    let segments = segmentation.segments();

    // Per-note metrics
    let track = track_pitch(&conditioned, sample_rate, config)?;
    let pitch = analyze_pitch(&track, &segments, config);
    let sustain = estimate_sustain(&conditioned, sample_rate, &segments, config);

    // Tempo and timing
    let raw_bpm = tempo.estimate_bpm(&conditioned, sample_rate)?;
    let bpm = if raw_bpm.is_finite() && raw_bpm > 0.0 {
        raw_bpm
    } else {
        if raw_bpm != 0.0 {
            log::warn!("Tempo estimator '{}' returned {}, using 0", tempo.name(), raw_bpm);
        }
        0.0
    };
    let timing = analyze_timing(&segmentation.onset_times(sample_rate), bpm);

    let note_count = segmentation.note_count();
    let score = compute_score(
        &ScoreInputs {
            note_count,
            timing_accuracy: timing.accuracy,
            timing_stability: timing.stability,
            pitch_stability: pitch.pitch_stability,
            pitch_deviation_cents: pitch.pitch_deviation_cents,
            sustain: sustain.sustain,
        },
        config,
    );

    let metrics = SessionMetrics::new(
        bpm,
        timing.accuracy,
        timing.stability,
        pitch.pitch_stability,
        pitch.pitch_deviation_cents,
        sustain.sustain,
        note_count,
        score,
    )?;

    let notes: Vec<NoteMetrics> = segments
        .iter()
        .zip(pitch.notes.iter().zip(sustain.notes.iter()))
        .map(|(segment, (note_pitch, note_sustain))| NoteMetrics {
            segment: *segment,
            start_seconds: segment.start as f32 / sample_rate as f32,
            pitch_hz: note_pitch.map(|p| p.pitch_hz),
            pitch_stability: note_pitch.map(|p| p.stability),
            deviation_cents: note_pitch.map(|p| p.deviation_cents),
            sustain: *note_sustain,
        })
        .collect();

    let mut flags = Vec::new();
    if note_count < config.few_notes_cutoff {
        flags.push(AnalysisFlag::FewNotesScoring);
    }
    if segmentation.is_fallback() {
        flags.push(AnalysisFlag::WholeSignalFallback);
    }
    if bpm == 0.0 {
        flags.push(AnalysisFlag::NoTempo);
    }
    if pitch.analyzed_notes() == 0 {
        flags.push(AnalysisFlag::NoVoicedNotes);
    }
    if sustain.notes.iter().all(Option::is_none) {
        flags.push(AnalysisFlag::NoSustainEvidence);
    }

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    log::debug!(
        "Take analysis complete in {:.2} ms: score={}, notes={}, bpm={:.1}, flags={:?}",
        processing_time_ms,
        metrics.practice_score,
        note_count,
        bpm,
        flags
    );

    Ok(TakeAnalysis {
        metrics,
        boundaries: segmentation.boundaries,
        notes,
        descriptors,
        metadata: AnalysisMetadata {
            duration_seconds: signal.duration_seconds(),
            sample_rate,
            processing_time_ms,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            tempo_estimator: tempo.name().to_string(),
            segmentation_threshold: segmentation.threshold,
            pitch_frame_size: track.frame_size,
            flags,
        },
    })
}

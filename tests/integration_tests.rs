//! Integration tests for the practice analysis pipeline

use fretboard_dsp::{
    analyze_audio_bytes, analyze_take, analyze_take_with, AnalysisConfig, AnalysisError, AnalysisFlag,
    AutocorrelationTempo, FixedTempo, SessionMetrics, TakeAnalysis, TempoEstimator,
};
use std::io::Cursor;

const SR: u32 = 44100;

fn sine(freq: f32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let n = (seconds * SR as f32) as usize;
    (0..n)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
        .collect()
}

/// Short decaying 1 kHz bursts on a beat grid, starting at `offset` seconds
fn click_train(bpm: f32, clicks: usize, offset: f32, seconds: f32) -> Vec<f32> {
    let mut samples = vec![0.0f32; (seconds * SR as f32) as usize];
    let period = 60.0 / bpm;
    let burst = (0.02 * SR as f32) as usize;
    for k in 0..clicks {
        let start = ((offset + k as f32 * period) * SR as f32) as usize;
        for i in 0..burst {
            if let Some(s) = samples.get_mut(start + i) {
                let t = i as f32 / SR as f32;
                *s = 0.8 * (-200.0 * t).exp() * (2.0 * std::f32::consts::PI * 1000.0 * t).sin();
            }
        }
    }
    samples
}

/// Deterministic white noise
fn noise(seconds: f32) -> Vec<f32> {
    let mut state: u32 = 0x1234_5678;
    (0..(seconds * SR as f32) as usize)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
        })
        .collect()
}

fn wav_bytes(samples: &[f32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn assert_metrics_valid(m: &SessionMetrics) {
    for (name, v) in [
        ("bpm", m.bpm),
        ("timing_accuracy", m.timing_accuracy),
        ("timing_stability", m.timing_stability),
        ("pitch_stability", m.pitch_stability),
        ("pitch_deviation_cents", m.pitch_deviation_cents),
        ("sustain", m.sustain),
    ] {
        assert!(v.is_finite(), "{} is not finite: {}", name, v);
    }
    assert!(m.bpm >= 0.0);
    for v in [m.timing_accuracy, m.timing_stability, m.pitch_stability, m.sustain] {
        assert!((0.0..=1.0).contains(&v), "unit metric out of range: {}", v);
    }
    assert!((0.0..=50.0).contains(&m.pitch_deviation_cents));
    assert!(m.practice_score <= 100);
}

fn assert_boundaries_valid(analysis: &TakeAnalysis, len: usize) {
    let b = &analysis.boundaries;
    assert!(b.len() >= 2);
    assert_eq!(*b.last().unwrap(), len);
    assert!(b.windows(2).all(|w| w[0] < w[1]), "boundaries not increasing: {:?}", b);
    assert_eq!(analysis.notes.len(), b.len() - 1);
    if analysis.metrics.note_count == 0 {
        // whole-signal fallback
        assert_eq!(b, &vec![0, len]);
    } else {
        assert_eq!(b.len(), analysis.metrics.note_count + 1);
        assert_eq!(analysis.notes[0].segment.start, b[0]);
    }
}

#[test]
fn test_sustained_a4() {
    let samples = sine(440.0, 2.0, 0.5);
    let metrics = analyze_take(&samples, SR, AnalysisConfig::default()).unwrap();

    assert_metrics_valid(&metrics);
    assert_eq!(metrics.note_count, 1);
    assert!(metrics.pitch_deviation_cents < 5.0, "deviation {}", metrics.pitch_deviation_cents);
    assert!(metrics.pitch_stability > 0.9, "stability {}", metrics.pitch_stability);
}

#[test]
fn test_sustained_a4_note_breakdown() {
    let samples = sine(440.0, 2.0, 0.5);
    let analysis =
        analyze_take_with(&samples, SR, &AnalysisConfig::default(), &FixedTempo(0.0)).unwrap();

    assert_boundaries_valid(&analysis, samples.len());
    let note = &analysis.notes[0];
    let hz = note.pitch_hz.expect("sustained tone should be voiced");
    assert!((hz - 440.0).abs() < 2.0, "pitch {}", hz);
    assert!(analysis.metadata.has_flag(AnalysisFlag::FewNotesScoring));
    assert!(!analysis.metadata.has_flag(AnalysisFlag::WholeSignalFallback));
}

#[test]
fn test_silence() {
    let samples = vec![0.0f32; 2 * SR as usize];
    let metrics = analyze_take(&samples, SR, AnalysisConfig::default()).unwrap();

    assert_metrics_valid(&metrics);
    assert_eq!(metrics.note_count, 0);
    assert_eq!(metrics.bpm, 0.0);
    assert_eq!(metrics.sustain, 0.0);
    assert_eq!(metrics.timing_accuracy, 1.0);
    assert_eq!(metrics.timing_stability, 1.0);
    assert_eq!(metrics.pitch_stability, 1.0);
    assert_eq!(metrics.pitch_deviation_cents, 0.0);
    assert_eq!(metrics.practice_score, 70);
}

#[test]
fn test_click_train_at_120_bpm() {
    let samples = click_train(120.0, 8, 0.25, 4.5);
    let analysis =
        analyze_take_with(&samples, SR, &AnalysisConfig::default(), &FixedTempo(120.0)).unwrap();

    assert_metrics_valid(&analysis.metrics);
    assert_boundaries_valid(&analysis, samples.len());
    assert_eq!(analysis.metrics.note_count, 8);
    assert!(analysis.metrics.timing_accuracy > 0.97, "accuracy {}", analysis.metrics.timing_accuracy);
    assert!(analysis.metrics.timing_stability > 0.95, "stability {}", analysis.metrics.timing_stability);

    // Onsets land shortly before each click
    for (k, note) in analysis.notes.iter().enumerate() {
        let click = 0.25 + k as f32 * 0.5;
        assert!(
            note.start_seconds <= click + 0.01 && note.start_seconds > click - 0.12,
            "note {} starts at {} for click at {}",
            k,
            note.start_seconds,
            click
        );
    }
}

#[test]
fn test_click_train_tempo_estimate() {
    let samples = click_train(120.0, 8, 0.25, 4.5);
    let metrics = analyze_take(&samples, SR, AnalysisConfig::default()).unwrap();

    assert!((metrics.bpm - 120.0).abs() < 120.0 * 0.03, "bpm {}", metrics.bpm);
    assert!(metrics.timing_accuracy > 0.95, "accuracy {}", metrics.timing_accuracy);

    let bpm = AutocorrelationTempo::default().estimate_bpm(&samples, SR).unwrap();
    assert!((bpm - metrics.bpm).abs() < 5.0);
}

#[test]
fn test_silent_lead_in_gets_no_onset_at_zero() {
    let samples = click_train(120.0, 4, 0.5, 2.5);
    let analysis =
        analyze_take_with(&samples, SR, &AnalysisConfig::default(), &FixedTempo(120.0)).unwrap();

    assert_eq!(analysis.metrics.note_count, 4);
    assert!(analysis.boundaries[0] > SR as usize / 4, "boundaries {:?}", analysis.boundaries);
    assert!(analysis.notes[0].start_seconds > 0.3);
}

#[test]
fn test_click_train_tempo_sweep() {
    for &bpm in &[70.0f32, 100.0, 150.0, 180.0, 200.0, 240.0] {
        let period = 60.0 / bpm;
        let seconds = 0.25 + 12.0 * period + 0.5;
        let samples = click_train(bpm, 12, 0.25, seconds);
        let metrics = analyze_take(&samples, SR, AnalysisConfig::default()).unwrap();

        assert_eq!(metrics.note_count, 12, "{} BPM", bpm);
        assert!((metrics.bpm - bpm).abs() < bpm * 0.04, "{} BPM read as {:.2}", bpm, metrics.bpm);
        assert!(
            metrics.timing_accuracy > 0.95,
            "{} BPM: accuracy {:.3} at {:.2} BPM",
            bpm,
            metrics.timing_accuracy,
            metrics.bpm
        );
        assert!(metrics.timing_stability > 0.95, "{} BPM: stability {:.3}", bpm, metrics.timing_stability);
    }
}

#[test]
fn test_degenerate_inputs_produce_finite_metrics() {
    let mut impulse = vec![0.0f32; SR as usize];
    impulse[SR as usize / 2] = 1.0;

    let inputs: Vec<(&str, Vec<f32>)> = vec![
        ("impulse", impulse),
        ("noise", noise(1.5)),
        ("dc", vec![0.3; SR as usize]),
        ("tiny", vec![0.1; 10]),
        ("quiet sine", sine(196.0, 1.0, 1e-4)),
    ];

    for (name, samples) in inputs {
        let analysis = analyze_take_with(
            &samples,
            SR,
            &AnalysisConfig::default(),
            &AutocorrelationTempo::default(),
        )
        .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
        assert_metrics_valid(&analysis.metrics);
        assert_boundaries_valid(&analysis, samples.len());
        assert!(analysis.metrics.to_json().is_ok(), "{} did not serialize", name);
    }
}

#[test]
fn test_analysis_is_deterministic() {
    let mut samples = click_train(100.0, 5, 0.1, 3.5);
    for (s, t) in samples.iter_mut().zip(sine(329.63, 3.5, 0.2)) {
        *s += t;
    }

    let first = analyze_take(&samples, SR, AnalysisConfig::default()).unwrap();
    let second = analyze_take(&samples, SR, AnalysisConfig::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_analyze_wav_bytes() {
    let bytes = wav_bytes(&sine(440.0, 2.0, 0.5));
    let metrics = analyze_audio_bytes(&bytes, AnalysisConfig::default()).unwrap();

    assert_metrics_valid(&metrics);
    assert_eq!(metrics.note_count, 1);
    assert!(metrics.pitch_deviation_cents < 5.0);
}

#[test]
fn test_undecodable_bytes() {
    let result = analyze_audio_bytes(b"not an audio file, just some text", AnalysisConfig::default());
    assert!(matches!(result, Err(AnalysisError::DecodingError(_))));
}

#[test]
fn test_metrics_json_shape() {
    let metrics = analyze_take(&sine(220.0, 1.0, 0.5), SR, AnalysisConfig::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&metrics.to_json().unwrap()).unwrap();
    let object = value.as_object().unwrap();

    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "bpm",
            "note_count",
            "pitch_deviation_cents",
            "pitch_stability",
            "practice_score",
            "sustain",
            "timing_accuracy",
            "timing_stability",
        ]
    );
}

//! Example: Analyze a single practice take
//!
//! Usage:
//!   cargo run --release --example analyze_file -- [--json] [--config config.json] <file>

use fretboard_dsp::{analyze_take_with, decode_file, AnalysisConfig, AutocorrelationTempo};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut config_path: Option<String> = None;
    let mut path: Option<String> = None;

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--config" => {
                if args.is_empty() {
                    return Err("--config requires a path".into());
                }
                config_path = Some(args.remove(0));
            }
            "--help" | "-h" => {
                eprintln!("Usage: analyze_file [--json] [--config config.json] <file>");
                return Ok(());
            }
            _ => path = Some(a),
        }
    }

    let path = match path {
        Some(p) => p,
        None => {
            eprintln!("ERROR: Provide an audio file path. Use --help for usage.");
            std::process::exit(2);
        }
    };

    let config = match config_path {
        Some(p) => AnalysisConfig::from_json_str(&std::fs::read_to_string(p)?)?,
        None => AnalysisConfig::default(),
    };

    let audio = decode_file(&path)?;
    let tempo = AutocorrelationTempo::from_config(&config);
    let analysis = analyze_take_with(audio.samples(), audio.sample_rate(), &config, &tempo)?;

    if json {
        println!("{}", analysis.metrics.to_json()?);
        return Ok(());
    }

    let m = &analysis.metrics;
    println!("Practice Take: {}", path);
    println!("  Duration:          {:.2} s", analysis.metadata.duration_seconds);
    println!("  Notes:             {}", m.note_count);
    println!("  Tempo:             {:.1} BPM", m.bpm);
    println!("  Timing accuracy:   {:.3}", m.timing_accuracy);
    println!("  Timing stability:  {:.3}", m.timing_stability);
    println!("  Pitch stability:   {:.3}", m.pitch_stability);
    println!("  Pitch deviation:   {:.1} cents", m.pitch_deviation_cents);
    println!("  Sustain:           {:.3}", m.sustain);
    println!("  Practice score:    {}", m.practice_score);
    println!(
        "  Brightness:        {:.0} Hz centroid, ZCR {:.3}",
        analysis.descriptors.spectral_centroid, analysis.descriptors.zero_crossing_rate
    );
    if !analysis.metadata.flags.is_empty() {
        println!("  Flags:             {:?}", analysis.metadata.flags);
    }
    println!("  Processing time:   {:.2} ms", analysis.metadata.processing_time_ms);

    for (i, note) in analysis.notes.iter().enumerate() {
        let pitch = note
            .pitch_hz
            .map(|hz| format!("{:7.2} Hz ({:+.1} c)", hz, note.deviation_cents.unwrap_or(0.0)))
            .unwrap_or_else(|| "   unvoiced".to_string());
        let sustain = note
            .sustain
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        println!("    #{:<3} {:7.3}s  {}  sustain {}", i + 1, note.start_seconds, pitch, sustain);
    }

    Ok(())
}

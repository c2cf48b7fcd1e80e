//! Example: Analyze multiple practice takes in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files (batch-level). Each take is still analyzed on one thread.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use fretboard_dsp::{analyze_take, decode_file, AnalysisConfig, SessionMetrics};
use rayon::prelude::*;
use std::env;
use std::time::Instant;

struct ItemOut {
    path: String,
    elapsed_ms: f32,
    result: Result<SessionMetrics, String>,
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

fn analyze_path(path: &str, config: &AnalysisConfig) -> Result<SessionMetrics, String> {
    let audio = decode_file(path).map_err(|e| format!("decode failed: {e}"))?;
    analyze_take(audio.samples(), audio.sample_rate(), config.clone())
        .map_err(|e| format!("analysis failed: {e}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args.first().ok_or("--jobs requires a value")?.parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let config = AnalysisConfig::default();

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let started = Instant::now();
                let result = analyze_path(path, &config);
                ItemOut {
                    path: path.clone(),
                    elapsed_ms: started.elapsed().as_secs_f32() * 1000.0,
                    result,
                }
            })
            .collect()
    });

    for (idx, o) in outs.iter().enumerate() {
        match (&o.result, json) {
            (Ok(m), true) => {
                let mut value = serde_json::to_value(m)?;
                value["file"] = serde_json::Value::String(o.path.clone());
                println!("{}", serde_json::to_string(&value)?);
            }
            (Err(e), true) => {
                println!("{}", serde_json::json!({ "file": o.path, "error": e }));
            }
            (Ok(m), false) => println!(
                "[{}/{}] {}: score={} notes={} BPM={:.1} timing={:.2}/{:.2} pitch={:.2} ({:.1}c) sustain={:.2} time={:.0}ms",
                idx + 1,
                outs.len(),
                o.path,
                m.practice_score,
                m.note_count,
                m.bpm,
                m.timing_accuracy,
                m.timing_stability,
                m.pitch_stability,
                m.pitch_deviation_cents,
                m.sustain,
                o.elapsed_ms
            ),
            (Err(e), false) => println!("[{}/{}] {}: ERROR: {}", idx + 1, outs.len(), o.path, e),
        }
    }

    let ok_times: Vec<f32> = outs.iter().filter(|o| o.result.is_ok()).map(|o| o.elapsed_ms).collect();
    let wall_ms = t0.elapsed().as_secs_f64() * 1000.0;

    eprintln!("Done: ok={}/{} wall={:.0}ms", ok_times.len(), outs.len(), wall_ms);
    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        let min = ok_times.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = ok_times.iter().cloned().fold(0.0, f32::max);
        eprintln!(
            "time_ms: mean={:.2} p50={:.2} p90={:.2} min={:.2} max={:.2}",
            mean, p50, p90, min, max
        );
    }

    Ok(())
}

// src/bin/jingle_locate.rs

use clap::Parser;
use jingle_trim::audio::{
    decode_audio_file, diagnose, encode_wav, get_audio_info, normalize, Polarity,
    ReferencePattern, TrimOutcome, WavSampleFormat,
};
use jingle_trim::config::{
    MatcherConfig, DEFAULT_ANALYSIS_RATE, DEFAULT_MIN_OFFSET_MS, DEFAULT_REFERENCE_WINDOW_MS,
    DEFAULT_THRESHOLD,
};

/// Command-line tool for inspecting where a jingle sits in one recording
#[derive(Parser, Debug)]
#[command(name = "jingle-locate")]
#[command(about = "Locate a jingle in a single recording and list candidate offsets", long_about = None)]
struct Args {
    /// Recording to search (MP3, FLAC, WAV, OGG, etc.)
    #[arg(short, long)]
    input: String,

    /// Audio file containing the jingle
    #[arg(short, long, default_value = "jingle_sample.mp3")]
    jingle: String,

    /// Leading part of the jingle used as the reference, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REFERENCE_WINDOW_MS)]
    window_ms: u64,

    /// Ignore matches starting earlier than this, in milliseconds
    #[arg(long, default_value_t = DEFAULT_MIN_OFFSET_MS)]
    min_offset_ms: u64,

    /// Minimum normalized correlation to accept a match
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Prefer matches within this many milliseconds of the end
    #[arg(long)]
    tail_window_ms: Option<u64>,

    /// List every peak at or above this confidence
    #[arg(long, default_value_t = 0.3)]
    debug_threshold: f64,

    /// Maximum number of candidates to list
    #[arg(long, default_value_t = 10)]
    max_candidates: usize,

    /// Write the audio before the jingle here (WAV)
    #[arg(long)]
    kept: Option<String>,

    /// Write the jingle and everything after it here (WAV)
    #[arg(long)]
    removed: Option<String>,

    /// Show detailed information
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "jingle_trim=debug"
    } else {
        "jingle_trim=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = MatcherConfig {
        min_offset_ms: args.min_offset_ms,
        threshold: args.threshold,
        tail_window_ms: args.tail_window_ms,
    };
    config.validate()?;

    println!("🎵 Jingle Locator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Step 1: Get audio info
    let info = get_audio_info(&args.input)?;

    println!("\n📊 Input File: {}", args.input);
    println!("   Duration: {:.2} seconds ({:.2} minutes)",
        info.duration_seconds, info.duration_seconds / 60.0);
    println!("   Sample Rate: {} Hz", info.sample_rate);
    println!("   Channels: {}", info.channels);
    println!("   Format: {}", info.format);

    // Step 2: Build the reference
    let reference = ReferencePattern::load(&args.jingle, DEFAULT_ANALYSIS_RATE, args.window_ms)?;

    println!("\n📋 Jingle: {}", args.jingle);
    println!("   Reference: {:.2}s of {:.2}s",
        reference.duration_ms() as f64 / 1000.0,
        reference.source_duration_ms() as f64 / 1000.0);

    // Step 3: Decode and normalize
    println!("\n🔊 Decoding audio...");
    let start_time = std::time::Instant::now();
    let audio = decode_audio_file(&args.input)?;
    let target = normalize(&audio, DEFAULT_ANALYSIS_RATE)?;

    if args.verbose {
        println!("   Loaded {} samples ({:.2} MB)",
            audio.samples.len(),
            (audio.samples.len() * 4) as f64 / 1_048_576.0);
        println!("   Decode time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    // Step 4: Correlate
    println!("\n🔎 Searching...");
    let search_start = std::time::Instant::now();
    let diagnostics = diagnose(
        &target,
        &reference,
        &config,
        args.debug_threshold,
        args.max_candidates,
    )?;

    if args.verbose {
        println!("   Search time: {:.2}s", search_start.elapsed().as_secs_f64());
    }

    if diagnostics.candidates.is_empty() {
        println!("   No peaks at or above {:.2}", args.debug_threshold);
    } else {
        println!("   Candidates (confidence ≥ {:.2}):", args.debug_threshold);
        for (rank, candidate) in diagnostics.candidates.iter().enumerate() {
            let polarity = match candidate.polarity {
                Polarity::Positive => "",
                Polarity::Inverted => " (inverted)",
            };
            println!("   {:>2}. {:>9.3}s  {:.3}{}",
                rank + 1,
                candidate.offset_ms as f64 / 1000.0,
                candidate.confidence,
                polarity);
        }
    }

    // Step 5: Verdict
    let found = match diagnostics.verdict {
        Ok(found) => {
            println!("\n✅ Jingle at {:.3}s (confidence {:.3})",
                found.offset_ms as f64 / 1000.0, found.confidence);
            found
        }
        Err(reason) => {
            println!("\n❌ No match: {}", reason);
            return Ok(());
        }
    };

    // Step 6: Optionally write the split
    if args.kept.is_some() || args.removed.is_some() {
        let outcome = TrimOutcome::split(&audio, found, DEFAULT_ANALYSIS_RATE)?;

        println!("\n💾 Encoding to WAV...");
        if let Some(path) = &args.kept {
            encode_wav(&outcome.kept, path, WavSampleFormat::Float32)?;
            println!("   Kept {:.2}s -> {}", outcome.kept.duration_seconds(), path);
        }
        if let Some(path) = &args.removed {
            encode_wav(&outcome.removed, path, WavSampleFormat::Float32)?;
            println!("   Removed {:.2}s -> {}", outcome.removed.duration_seconds(), path);
        }
    }

    println!("\n   Total time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

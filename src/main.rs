// src/main.rs

use clap::Parser;
use jingle_trim::audio::WavSampleFormat;
use jingle_trim::{collect_recordings, BatchTrimmer, CancelFlag, OutputLayout, TrimConfig};
use std::path::PathBuf;

/// Cut the outro off every recording in a directory, starting at a known jingle
#[derive(Parser, Debug)]
#[command(name = "jingle-trim")]
#[command(about = "Remove everything from a known jingle onwards", long_about = None)]
struct Args {
    /// Directory of recordings to process
    #[arg(long, default_value = "episodes")]
    episodes: PathBuf,

    /// Audio file containing the jingle
    #[arg(long, default_value = "jingle_sample.mp3")]
    jingle: PathBuf,

    /// Where trimmed (or untouched) recordings are written
    #[arg(long, default_value = "smart_trimmed")]
    output_dir: PathBuf,

    /// Where the removed tails are written
    #[arg(long, default_value = "removed")]
    removed_dir: PathBuf,

    /// Leading part of the jingle used as the reference, in milliseconds
    #[arg(long)]
    window_ms: Option<u64>,

    /// Ignore matches starting earlier than this, in milliseconds
    #[arg(long)]
    min_offset_ms: Option<u64>,

    /// Minimum normalized correlation to accept a match
    #[arg(long)]
    threshold: Option<f64>,

    /// Prefer matches within this many milliseconds of the end
    #[arg(long)]
    tail_window_ms: Option<u64>,

    /// Recordings processed concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Input file extension (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Write 16-bit PCM instead of 32-bit float WAV
    #[arg(long)]
    pcm16: bool,

    /// JSON settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON report of the run
    #[arg(long)]
    report: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn trim_config(&self) -> anyhow::Result<TrimConfig> {
        let mut config = match &self.config {
            Some(path) => TrimConfig::from_json_file(path)?,
            None => TrimConfig::default(),
        };

        if let Some(window_ms) = self.window_ms {
            config.reference_window_ms = window_ms;
        }
        if let Some(min_offset_ms) = self.min_offset_ms {
            config.matcher.min_offset_ms = min_offset_ms;
        }
        if let Some(threshold) = self.threshold {
            config.matcher.threshold = threshold;
        }
        if self.tail_window_ms.is_some() {
            config.matcher.tail_window_ms = self.tail_window_ms;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        if self.pcm16 {
            config.output_format = WavSampleFormat::Pcm16;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "jingle_trim=debug"
    } else {
        "jingle_trim=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = args.trim_config()?;

    println!("🎵 Jingle Trimmer");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let trimmer = BatchTrimmer::from_jingle_file(config, &args.jingle)?;
    let reference = trimmer.reference();
    println!("\n📋 Jingle: {}", args.jingle.display());
    println!(
        "   Reference: {:.2}s of {:.2}s at {} Hz",
        reference.duration_ms() as f64 / 1000.0,
        reference.source_duration_ms() as f64 / 1000.0,
        reference.sample_rate()
    );

    let paths = collect_recordings(&args.episodes, &trimmer.config().extensions)?;
    if paths.is_empty() {
        println!("\nNo recordings found in {}", args.episodes.display());
        return Ok(());
    }
    println!(
        "\n🔊 Processing {} recordings from {} ({} jobs)...",
        paths.len(),
        args.episodes.display(),
        trimmer.config().jobs
    );

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        // First Ctrl-C drains the batch, the second one exits immediately
        while tokio::signal::ctrl_c().await.is_ok() {
            if on_signal.interrupt() {
                eprintln!("\nInterrupted again, exiting");
                std::process::exit(130);
            }
            tracing::warn!(
                "Interrupted, finishing recordings already in progress (Ctrl-C again to quit)"
            );
        }
    });

    let start_time = std::time::Instant::now();
    let layout = OutputLayout::new(&args.output_dir, &args.removed_dir);
    let report = trimmer.run(paths, layout, cancel).await?;

    println!();
    for entry in &report.entries {
        println!("   {}", entry);
    }

    println!("\n✅ {}", report.summary);
    println!("   Total time: {:.2}s", start_time.elapsed().as_secs_f64());

    if let Some(path) = &args.report {
        report.write_json(path)?;
        println!("   Report saved to: {}", path.display());
    }

    Ok(())
}

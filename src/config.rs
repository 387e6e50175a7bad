// src/config.rs

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::encoder::WavSampleFormat;
use crate::error::{AudioError, Result};

/// Sample rate every buffer is converted to before correlation
pub const DEFAULT_ANALYSIS_RATE: u32 = 44_100;

/// Leading slice of the jingle file used as the reference pattern
pub const DEFAULT_REFERENCE_WINDOW_MS: u64 = 5_000;

/// Jingles never start in the opening minute of an episode
pub const DEFAULT_MIN_OFFSET_MS: u64 = 60_000;

pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Upper bound for every millisecond setting (one day)
pub const MAX_DURATION_MS: u64 = 24 * 60 * 60 * 1000;

fn check_duration(name: &str, ms: u64) -> Result<()> {
    if ms > MAX_DURATION_MS {
        return Err(AudioError::InvalidConfig(format!(
            "{} must be at most {} ms: {}",
            name, MAX_DURATION_MS, ms
        )));
    }
    Ok(())
}

/// Acceptance policy of the correlation matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Candidates earlier than this are treated as false positives
    pub min_offset_ms: u64,

    /// Minimum normalized correlation magnitude to accept, in [0, 1]
    pub threshold: f64,

    /// Prefer matches inside the last `tail_window_ms` of the recording
    pub tail_window_ms: Option<u64>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_offset_ms: DEFAULT_MIN_OFFSET_MS,
            threshold: DEFAULT_THRESHOLD,
            tail_window_ms: None,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AudioError::InvalidConfig(format!(
                "Threshold must be within [0, 1]: {}",
                self.threshold
            )));
        }
        if self.tail_window_ms == Some(0) {
            return Err(AudioError::InvalidConfig(
                "Tail window must be greater than 0 ms".to_string(),
            ));
        }
        if let Some(tail_window_ms) = self.tail_window_ms {
            check_duration("Tail window", tail_window_ms)?;
        }
        check_duration("Minimum offset", self.min_offset_ms)
    }
}

/// Everything a batch run needs, passed explicitly to the trimmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub analysis_rate: u32,
    pub reference_window_ms: u64,
    pub matcher: MatcherConfig,

    /// File extensions picked up from the input directory (no dot)
    pub extensions: Vec<String>,

    /// Recordings processed concurrently
    pub jobs: usize,

    pub output_format: WavSampleFormat,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            analysis_rate: DEFAULT_ANALYSIS_RATE,
            reference_window_ms: DEFAULT_REFERENCE_WINDOW_MS,
            matcher: MatcherConfig::default(),
            extensions: vec!["mp3".to_string()],
            jobs: default_jobs(),
            output_format: WavSampleFormat::default(),
        }
    }
}

impl TrimConfig {
    /// Load a JSON config file; missing fields fall back to defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AudioError::FileOpen {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        serde_json::from_str(&text).map_err(|e| {
            AudioError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.analysis_rate == 0 {
            return Err(AudioError::InvalidConfig(
                "Analysis sample rate must be greater than 0".to_string(),
            ));
        }
        if self.reference_window_ms == 0 {
            return Err(AudioError::InvalidConfig(
                "Reference window must be greater than 0 ms".to_string(),
            ));
        }
        check_duration("Reference window", self.reference_window_ms)?;
        if self.jobs == 0 {
            return Err(AudioError::InvalidConfig(
                "Job count must be at least 1".to_string(),
            ));
        }
        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err(AudioError::InvalidConfig(
                "At least one input file extension is required".to_string(),
            ));
        }
        self.matcher.validate()
    }
}

/// One worker per available CPU thread
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

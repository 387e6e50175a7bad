// src/audio/matcher.rs
//! Jingle location by normalized cross-correlation
//!
//! # Algorithm
//!
//! 1. Check that target and reference share the canonical format
//! 2. Correlate the reference against every offset where it fully fits
//! 3. Scale the correlation by its largest magnitude and take `|c|`, so a
//!    polarity-inverted copy of the jingle scores like the original
//! 4. Pick the strongest offset (optionally preferring the recording's
//!    tail window)
//! 5. Reject candidates that start before `min_offset_ms` or score below
//!    the acceptance threshold
//!
//! "Not found" is a normal outcome, not an error. Errors are reserved for
//! inputs that cannot be compared at all.

use serde::Serialize;
use std::fmt;

use crate::audio::correlate::cross_correlate_valid;
use crate::audio::reference::ReferencePattern;
use crate::audio::types::{frames_to_ms, ms_to_frames, AudioData};
use crate::config::MatcherConfig;
use crate::error::{AudioError, Result};

/// Correlation peaks at or below this magnitude carry no signal
const EPSILON: f32 = 1e-12;

/// An accepted jingle position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JingleMatch {
    /// Start of the jingle, in milliseconds from the start of the recording
    pub offset_ms: u64,

    /// Start of the jingle in analysis-rate frames
    pub offset_frames: u64,

    /// Normalized correlation magnitude at the offset, in [0, 1]
    pub confidence: f64,
}

/// Sign of the raw correlation at a candidate offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Inverted,
}

/// One ranked correlation peak reported in diagnostic mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub offset_ms: u64,
    pub offset_frames: u64,
    pub confidence: f64,
    pub polarity: Polarity,
}

/// Why a recording produced no accepted match
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoMatchReason {
    /// The recording is shorter than the reference window
    TargetTooShort {
        target_frames: usize,
        reference_frames: usize,
    },

    /// Correlation is zero everywhere (e.g. a silent recording)
    DegenerateCorrelation,

    /// Best candidate starts before the plausibility gate
    BeforeMinOffset { offset_ms: u64, confidence: f64 },

    /// Best candidate scored below the acceptance threshold
    BelowThreshold { offset_ms: u64, confidence: f64 },
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMatchReason::TargetTooShort {
                target_frames,
                reference_frames,
            } => write!(
                f,
                "recording ({} frames) is shorter than the reference ({} frames)",
                target_frames, reference_frames
            ),
            NoMatchReason::DegenerateCorrelation => write!(f, "correlation is zero everywhere"),
            NoMatchReason::BeforeMinOffset {
                offset_ms,
                confidence,
            } => write!(
                f,
                "best candidate at {:.1}s (confidence {:.3}) is before the minimum offset",
                *offset_ms as f64 / 1000.0,
                confidence
            ),
            NoMatchReason::BelowThreshold {
                offset_ms,
                confidence,
            } => write!(
                f,
                "best candidate at {:.1}s has confidence {:.3}, below threshold",
                *offset_ms as f64 / 1000.0,
                confidence
            ),
        }
    }
}

/// Verdict plus the ranked candidate list from [`diagnose`]
#[derive(Debug, Clone)]
pub struct MatchDiagnostics {
    pub verdict: std::result::Result<JingleMatch, NoMatchReason>,
    pub candidates: Vec<MatchCandidate>,
}

impl MatchDiagnostics {
    pub fn accepted(&self) -> Option<JingleMatch> {
        self.verdict.ok()
    }
}

/// Locate the reference pattern inside a normalized target
///
/// Returns `Ok(None)` when the jingle is absent, implausibly early, or too
/// weak. Fails only when the two buffers are not in the same format.
///
/// # Example
/// ```
/// use jingle_trim::audio::{locate, AudioData, ReferencePattern};
/// use jingle_trim::config::MatcherConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let jingle = AudioData {
///     samples: (0..800).map(|i| ((i * i) as f32 * 0.001).sin()).collect(),
///     sample_rate: 8000,
///     channels: 1,
/// };
/// let reference = ReferencePattern::from_audio(&jingle, 8000, 100)?;
///
/// // Two seconds of silence, then the jingle
/// let mut samples = vec![0.0; 16000];
/// samples.extend_from_slice(reference.samples());
/// let target = AudioData { samples, sample_rate: 8000, channels: 1 };
///
/// let config = MatcherConfig { min_offset_ms: 1000, ..MatcherConfig::default() };
/// let found = locate(&target, &reference, &config)?.expect("jingle present");
/// assert_eq!(found.offset_ms, 2000);
/// # Ok(())
/// # }
/// ```
pub fn locate(
    target: &AudioData,
    reference: &ReferencePattern,
    config: &MatcherConfig,
) -> Result<Option<JingleMatch>> {
    Ok(evaluate(target, reference, config, None)?.accepted())
}

/// Run the matcher and also report every correlation peak whose
/// confidence reaches `debug_threshold`, strongest first
///
/// Peaks closer than one reference length to a stronger peak are folded
/// into it. At most `max_candidates` peaks are returned.
pub fn diagnose(
    target: &AudioData,
    reference: &ReferencePattern,
    config: &MatcherConfig,
    debug_threshold: f64,
    max_candidates: usize,
) -> Result<MatchDiagnostics> {
    evaluate(
        target,
        reference,
        config,
        Some((debug_threshold, max_candidates)),
    )
}

fn evaluate(
    target: &AudioData,
    reference: &ReferencePattern,
    config: &MatcherConfig,
    debug: Option<(f64, usize)>,
) -> Result<MatchDiagnostics> {
    if target.channels != 1 || target.sample_rate != reference.sample_rate() {
        return Err(AudioError::IncompatibleFormat {
            expected: reference.audio().format_label(),
            found: target.format_label(),
        });
    }

    let rate = reference.sample_rate();
    let target_frames = target.frame_count();
    let reference_frames = reference.frame_count();

    if target_frames < reference_frames {
        return Ok(MatchDiagnostics {
            verdict: Err(NoMatchReason::TargetTooShort {
                target_frames,
                reference_frames,
            }),
            candidates: Vec::new(),
        });
    }

    let correlation = cross_correlate_valid(&target.samples, reference.samples());

    let (peak_index, peak) = correlation
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |(best_i, best), (i, &c)| {
            if c.abs() > best {
                (i, c.abs())
            } else {
                (best_i, best)
            }
        });

    if peak <= EPSILON {
        tracing::debug!("Correlation peak {:e} carries no signal", peak);
        return Ok(MatchDiagnostics {
            verdict: Err(NoMatchReason::DegenerateCorrelation),
            candidates: Vec::new(),
        });
    }

    let confidence_at = |i: usize| (correlation[i].abs() as f64 / peak as f64).min(1.0);

    let mut best = peak_index;
    if let Some(tail_ms) = config.tail_window_ms {
        let tail_frames = ms_to_frames(tail_ms, rate);
        let window_start = target_frames.saturating_sub(tail_frames);
        let in_window = (window_start..correlation.len())
            .filter(|&i| confidence_at(i) >= config.threshold)
            .fold(None, |acc: Option<usize>, i| match acc {
                Some(b) if correlation[b].abs() >= correlation[i].abs() => Some(b),
                _ => Some(i),
            });

        match in_window {
            Some(i) => best = i,
            None => tracing::debug!(
                "No candidate above {:.3} in the last {} ms, using the global peak",
                config.threshold,
                tail_ms
            ),
        }
    }

    let offset_frames = best as u64;
    let offset_ms = frames_to_ms(offset_frames, rate);
    let confidence = confidence_at(best);

    tracing::debug!(
        "Best candidate at {} ms ({} frames), confidence {:.4}",
        offset_ms,
        offset_frames,
        confidence
    );

    let verdict = if offset_ms < config.min_offset_ms {
        Err(NoMatchReason::BeforeMinOffset {
            offset_ms,
            confidence,
        })
    } else if confidence < config.threshold {
        Err(NoMatchReason::BelowThreshold {
            offset_ms,
            confidence,
        })
    } else {
        Ok(JingleMatch {
            offset_ms,
            offset_frames,
            confidence,
        })
    };

    let candidates = match debug {
        Some((threshold, limit)) => {
            rank_candidates(&correlation, peak, threshold, limit, reference_frames, rate)
        }
        None => Vec::new(),
    };

    Ok(MatchDiagnostics {
        verdict,
        candidates,
    })
}

/// Local maxima of `|c|` above `threshold`, strongest first, at least
/// `min_distance` frames apart
fn rank_candidates(
    correlation: &[f32],
    peak: f32,
    threshold: f64,
    limit: usize,
    min_distance: usize,
    rate: u32,
) -> Vec<MatchCandidate> {
    let magnitude = |i: usize| correlation[i].abs();
    let last = correlation.len().saturating_sub(1);

    let mut peaks: Vec<usize> = (0..correlation.len())
        .filter(|&i| magnitude(i) as f64 / peak as f64 >= threshold)
        .filter(|&i| {
            (i == 0 || magnitude(i) >= magnitude(i - 1))
                && (i == last || magnitude(i) >= magnitude(i + 1))
        })
        .collect();

    peaks.sort_by(|&a, &b| {
        magnitude(b)
            .partial_cmp(&magnitude(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut kept: Vec<usize> = Vec::new();
    for i in peaks {
        if kept.len() >= limit {
            break;
        }
        if kept.iter().all(|&k| k.abs_diff(i) >= min_distance) {
            kept.push(i);
        }
    }

    kept.into_iter()
        .map(|i| MatchCandidate {
            offset_ms: frames_to_ms(i as u64, rate),
            offset_frames: i as u64,
            confidence: (magnitude(i) as f64 / peak as f64).min(1.0),
            polarity: if correlation[i] >= 0.0 {
                Polarity::Positive
            } else {
                Polarity::Inverted
            },
        })
        .collect()
}

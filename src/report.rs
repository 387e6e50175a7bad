// src/report.rs
//! Per-recording audit trail of a batch run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::audio::trim::TrimOutcome;
use crate::config::TrimConfig;
use crate::error::Result;

/// What happened to one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub identifier: String,
    pub matched: bool,
    pub offset_ms: Option<u64>,
    pub confidence: Option<f64>,
    pub kept_duration_ms: u64,
    pub removed_duration_ms: u64,
    pub error: Option<String>,
}

impl ReportEntry {
    pub fn from_outcome(identifier: impl Into<String>, outcome: &TrimOutcome) -> Self {
        Self {
            identifier: identifier.into(),
            matched: outcome.matched.is_some(),
            offset_ms: outcome.matched.map(|m| m.offset_ms),
            confidence: outcome.matched.map(|m| m.confidence),
            kept_duration_ms: outcome.kept.duration_ms(),
            removed_duration_ms: outcome.removed.duration_ms(),
            error: None,
        }
    }

    pub fn failed(identifier: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            identifier: identifier.into(),
            matched: false,
            offset_ms: None,
            confidence: None,
            kept_duration_ms: 0,
            removed_duration_ms: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn status(&self) -> EntryStatus {
        if self.error.is_some() {
            EntryStatus::Errored
        } else if self.matched {
            EntryStatus::Trimmed
        } else {
            EntryStatus::PassedThrough
        }
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = |ms: u64| ms as f64 / 1000.0;
        match (&self.error, self.offset_ms) {
            (Some(error), _) => write!(f, "{}: error: {}", self.identifier, error),
            (None, Some(offset)) => write!(
                f,
                "{}: {:.1}s -> {:.1}s (removed {:.1}s from {:.1}s)",
                self.identifier,
                secs(self.kept_duration_ms + self.removed_duration_ms),
                secs(self.kept_duration_ms),
                secs(self.removed_duration_ms),
                secs(offset)
            ),
            (None, None) => write!(
                f,
                "{}: {:.1}s (no jingle found, copied as-is)",
                self.identifier,
                secs(self.kept_duration_ms)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Trimmed,
    PassedThrough,
    Errored,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub trimmed: usize,
    pub passed_through: usize,
    pub errored: usize,

    /// Recordings never started because the batch was cancelled
    pub cancelled: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} recordings: {} trimmed, {} passed through, {} errored",
            self.total, self.trimmed, self.passed_through, self.errored
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        Ok(())
    }
}

/// Entries in input order plus their tally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: Vec<ReportEntry>,
    pub summary: BatchSummary,

    /// Effective settings of the run that produced this report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TrimConfig>,
}

impl BatchReport {
    pub fn new(entries: Vec<ReportEntry>, cancelled: usize) -> Self {
        let mut summary = BatchSummary {
            total: entries.len(),
            cancelled,
            ..BatchSummary::default()
        };
        for entry in &entries {
            match entry.status() {
                EntryStatus::Trimmed => summary.trimmed += 1,
                EntryStatus::PassedThrough => summary.passed_through += 1,
                EntryStatus::Errored => summary.errored += 1,
            }
        }
        Self {
            entries,
            summary,
            config: None,
        }
    }

    pub fn with_config(mut self, config: TrimConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::matcher::JingleMatch;
    use crate::audio::types::AudioData;

    fn mono(seconds: usize) -> AudioData {
        AudioData {
            samples: vec![0.1; seconds * 1000],
            sample_rate: 1000,
            channels: 1,
        }
    }

    #[test]
    fn test_entry_from_trimmed_outcome() {
        let outcome = TrimOutcome {
            kept: mono(20),
            removed: mono(15),
            matched: Some(JingleMatch {
                offset_ms: 20_000,
                offset_frames: 882_000,
                confidence: 1.0,
            }),
        };
        let entry = ReportEntry::from_outcome("001_intro.mp3", &outcome);

        assert_eq!(entry.status(), EntryStatus::Trimmed);
        assert_eq!(entry.offset_ms, Some(20_000));
        assert_eq!(entry.removed_duration_ms, 15_000);
        assert_eq!(
            entry.to_string(),
            "001_intro.mp3: 35.0s -> 20.0s (removed 15.0s from 20.0s)"
        );
    }

    #[test]
    fn test_summary_counts_each_status() {
        let passed = ReportEntry::from_outcome("b.mp3", &TrimOutcome::pass_through(&mono(3)));
        assert_eq!(passed.to_string(), "b.mp3: 3.0s (no jingle found, copied as-is)");

        let report = BatchReport::new(
            vec![
                ReportEntry::from_outcome(
                    "a.mp3",
                    &TrimOutcome {
                        kept: mono(1),
                        removed: mono(1),
                        matched: Some(JingleMatch {
                            offset_ms: 1000,
                            offset_frames: 44100,
                            confidence: 0.9,
                        }),
                    },
                ),
                passed,
                ReportEntry::failed("c.mp3", "Audio decoding failed: bad header"),
            ],
            2,
        );

        assert_eq!(
            report.summary,
            BatchSummary {
                total: 3,
                trimmed: 1,
                passed_through: 1,
                errored: 1,
                cancelled: 2,
            }
        );
        assert_eq!(
            report.summary.to_string(),
            "Processed 3 recordings: 1 trimmed, 1 passed through, 1 errored, 2 cancelled"
        );
    }

    #[test]
    fn test_json_shape() {
        let report = BatchReport::new(vec![ReportEntry::failed("x.mp3", "boom")], 0);
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["entries"][0]["identifier"], "x.mp3");
        assert_eq!(json["entries"][0]["matched"], false);
        assert!(json["entries"][0]["offset_ms"].is_null());
        assert_eq!(json["entries"][0]["error"], "boom");
        assert_eq!(json["summary"]["errored"], 1);
        assert!(json.get("config").is_none());

        let report = report.with_config(TrimConfig::default());
        let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["config"]["matcher"]["min_offset_ms"], 60_000);
        assert_eq!(json["config"]["output_format"], "float32");
    }

    #[test]
    fn test_write_json_round_trips_through_file() {
        let report = BatchReport::new(vec![ReportEntry::failed("x.mp3", "boom")], 1);
        let path = std::env::temp_dir().join("jingle_trim_test_report.json");

        report.write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: BatchReport = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, report);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_json_errors_convert() {
        let error: crate::error::AudioError =
            serde_json::from_str::<BatchReport>("{ not json").unwrap_err().into();
        assert!(matches!(error, crate::error::AudioError::Json(_)));
        assert!(error.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::new(Vec::new(), 0);
        assert!(report.is_empty());
        assert_eq!(report.summary, BatchSummary::default());
    }
}

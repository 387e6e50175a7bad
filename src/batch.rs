// src/batch.rs
//! Batch trimming: one independent unit of work per recording
//!
//! The reference pattern and configuration are shared read-only. File
//! batches run on tokio's blocking pool, bounded by a semaphore sized to
//! `TrimConfig::jobs`. Cancellation stops new recordings from starting;
//! recordings already running are allowed to finish.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::audio::decoder::decode_audio_file;
use crate::audio::encoder::encode_wav;
use crate::audio::matcher::locate;
use crate::audio::normalize::normalize;
use crate::audio::reference::ReferencePattern;
use crate::audio::trim::TrimOutcome;
use crate::audio::types::AudioData;
use crate::config::TrimConfig;
use crate::error::{AudioError, Result};
use crate::report::{BatchReport, ReportEntry};

/// Where trimmed, removed, and passed-through recordings are written
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// Receives `<stem>.wav` before the jingle, or the untouched source file
    pub kept_dir: PathBuf,

    /// Receives `<stem>.wav` from the jingle onwards
    pub removed_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(kept_dir: impl Into<PathBuf>, removed_dir: impl Into<PathBuf>) -> Self {
        Self {
            kept_dir: kept_dir.into(),
            removed_dir: removed_dir.into(),
        }
    }

    /// Create both output directories if missing
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.kept_dir)?;
        std::fs::create_dir_all(&self.removed_dir)?;
        Ok(())
    }

    pub fn kept_path(&self, source: &Path) -> PathBuf {
        self.kept_dir.join(wav_name(source))
    }

    pub fn removed_path(&self, source: &Path) -> PathBuf {
        self.removed_dir.join(wav_name(source))
    }

    pub fn pass_through_path(&self, source: &Path) -> PathBuf {
        self.kept_dir.join(identifier(source))
    }

    /// Fail if either output directory is the directory of one of `sources`
    pub fn check_disjoint(&self, sources: &[PathBuf]) -> Result<()> {
        for dir in [&self.kept_dir, &self.removed_dir] {
            // A directory that does not exist yet cannot hold any source
            let Ok(dir) = std::fs::canonicalize(dir) else {
                continue;
            };
            for source in sources {
                let parent = source
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                if std::fs::canonicalize(parent).is_ok_and(|p| p == dir) {
                    return Err(AudioError::OverwritesSource(
                        source.to_string_lossy().to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Fail if writing to `dest` would replace `source`
fn ensure_not_source(source: &Path, dest: &Path) -> Result<()> {
    let Ok(dest) = std::fs::canonicalize(dest) else {
        return Ok(());
    };
    if dest == std::fs::canonicalize(source)? {
        return Err(AudioError::OverwritesSource(
            source.to_string_lossy().to_string(),
        ));
    }
    Ok(())
}

/// Shared stop switch for a running batch
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancel, returning true if the flag was already set
    ///
    /// A repeated interrupt means the user wants out now.
    pub fn interrupt(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }
}

/// List files in `dir` whose extension is one of `extensions`, sorted
///
/// Not recursive. Extension matching ignores case and a leading dot.
pub fn collect_recordings<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| AudioError::FileOpen {
        path: dir.to_string_lossy().to_string(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}

/// Check a file's extension against an allow-list
fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed.trim().trim_start_matches('.')))
        })
        .unwrap_or(false)
}

fn identifier(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn wav_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| identifier(path));
    format!("{}.wav", stem)
}

/// Cuts recordings at the jingle described by one reference pattern
#[derive(Debug, Clone)]
pub struct BatchTrimmer {
    config: Arc<TrimConfig>,
    reference: Arc<ReferencePattern>,
}

impl BatchTrimmer {
    pub fn new(config: TrimConfig, reference: ReferencePattern) -> Result<Self> {
        config.validate()?;
        if reference.sample_rate() != config.analysis_rate {
            return Err(AudioError::IncompatibleFormat {
                expected: format!("reference at {} Hz", config.analysis_rate),
                found: reference.audio().format_label(),
            });
        }

        Ok(Self {
            config: Arc::new(config),
            reference: Arc::new(reference),
        })
    }

    /// Build the reference from a jingle file using the config's window
    pub fn from_jingle_file<P: AsRef<Path>>(config: TrimConfig, jingle_path: P) -> Result<Self> {
        config.validate()?;
        let reference = ReferencePattern::load(
            jingle_path,
            config.analysis_rate,
            config.reference_window_ms,
        )?;
        Self::new(config, reference)
    }

    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    pub fn reference(&self) -> &ReferencePattern {
        &self.reference
    }

    /// Locate the jingle in one decoded recording and cut it there
    ///
    /// Without an accepted match the recording is passed through whole.
    pub fn process(&self, recording_id: &str, audio: &AudioData) -> Result<TrimOutcome> {
        let target = normalize(audio, self.config.analysis_rate)?;
        let found = locate(&target, &self.reference, &self.config.matcher)?;

        let outcome = match found {
            Some(found) => TrimOutcome::split(audio, found, self.config.analysis_rate)?,
            None => TrimOutcome::pass_through(audio),
        };

        match outcome.matched {
            Some(found) => tracing::info!(
                "{}: jingle at {:.1}s (confidence {:.3}), removing {:.1}s",
                recording_id,
                found.offset_ms as f64 / 1000.0,
                found.confidence,
                outcome.removed.duration_seconds()
            ),
            None => tracing::info!("{}: no jingle found, passing through", recording_id),
        }

        Ok(outcome)
    }

    /// Process in-memory recordings; failures become error entries
    pub fn process_batch<I>(&self, recordings: I) -> BatchReport
    where
        I: IntoIterator<Item = (String, AudioData)>,
    {
        let entries = recordings
            .into_iter()
            .map(|(identifier, audio)| match self.process(&identifier, &audio) {
                Ok(outcome) => ReportEntry::from_outcome(identifier, &outcome),
                Err(e) => {
                    tracing::warn!("{}: {}", identifier, e);
                    ReportEntry::failed(identifier, e)
                }
            })
            .collect();

        BatchReport::new(entries, 0).with_config(self.config.as_ref().clone())
    }

    /// Decode, trim, and write one file. Never fails: errors are reported
    pub fn process_file(&self, path: &Path, layout: &OutputLayout) -> ReportEntry {
        let id = identifier(path);
        match self.trim_file(&id, path, layout) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("{}: {}", id, e);
                ReportEntry::failed(id, e)
            }
        }
    }

    fn trim_file(&self, id: &str, path: &Path, layout: &OutputLayout) -> Result<ReportEntry> {
        ensure_not_source(path, &layout.kept_path(path))?;
        ensure_not_source(path, &layout.removed_path(path))?;
        ensure_not_source(path, &layout.pass_through_path(path))?;

        let audio = decode_audio_file(path)?;
        let outcome = self.process(id, &audio)?;

        if outcome.matched.is_some() {
            encode_wav(&outcome.kept, layout.kept_path(path), self.config.output_format)?;
            encode_wav(
                &outcome.removed,
                layout.removed_path(path),
                self.config.output_format,
            )?;
        } else {
            std::fs::copy(path, layout.pass_through_path(path))?;
        }

        Ok(ReportEntry::from_outcome(id, &outcome))
    }

    /// Trim every file in `paths` on a bounded worker pool
    ///
    /// Entries come back in input order. Fails only when the output
    /// directories cannot be created or overlap the input directories.
    pub async fn run(
        &self,
        paths: Vec<PathBuf>,
        layout: OutputLayout,
        cancel: CancelFlag,
    ) -> Result<BatchReport> {
        layout.check_disjoint(&paths)?;
        layout.prepare()?;
        let layout = Arc::new(layout);
        let semaphore = Arc::new(Semaphore::new(self.config.jobs));
        let total = paths.len();
        let identifiers: Vec<String> = paths.iter().map(|p| identifier(p)).collect();

        tracing::info!("Batch: {} recordings, jobs={}", total, self.config.jobs);

        let mut tasks = JoinSet::new();
        let mut started = 0;
        for (index, path) in paths.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            if cancel.is_cancelled() {
                break;
            }

            started += 1;
            let trimmer = self.clone();
            let layout = Arc::clone(&layout);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, trimmer.process_file(&path, &layout))
            });
        }

        let mut slots: Vec<Option<ReportEntry>> = vec![None; started];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry)) => slots[index] = Some(entry),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        let entries = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    ReportEntry::failed(identifiers[index].clone(), "worker task did not complete")
                })
            })
            .collect();

        let cancelled = total - started;
        if cancelled > 0 {
            tracing::warn!("Batch cancelled, {} recordings not started", cancelled);
        }

        Ok(BatchReport::new(entries, cancelled).with_config(self.config.as_ref().clone()))
    }
}

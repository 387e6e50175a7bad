pub mod audio;
pub mod batch;
pub mod config;
pub mod error;
pub mod report;

// Re-export for convenience
pub use audio::*;
pub use batch::{collect_recordings, BatchTrimmer, CancelFlag, OutputLayout};
pub use config::{MatcherConfig, TrimConfig};
pub use error::{AudioError, Result};
pub use report::{BatchReport, BatchSummary, EntryStatus, ReportEntry};

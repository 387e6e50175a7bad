use thiserror::Error;

/// All possible errors that can occur while locating and cutting jingles
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to open or read the audio file from disk
    #[error("Failed to open audio file '{path}': {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    /// The audio format is not supported by symphonia
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Error occurred while decoding the audio data
    #[error("Audio decoding failed: {0}")]
    DecodeFailed(String),

    /// Error occurred while encoding to WAV
    #[error("WAV encoding failed: {0}")]
    EncodeFailed(String),

    /// Target and reference are not in the same canonical form
    #[error("Incompatible audio format: expected {expected}, found {found}")]
    IncompatibleFormat { expected: String, found: String },

    /// The jingle window cannot be used as a reference
    #[error("Invalid reference pattern: {0}")]
    InvalidReference(String),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sample rate conversion failed
    #[error("Resampling failed: {0}")]
    Resample(String),

    /// Split point lies outside the buffer
    #[error("Split point (frame {frame}) exceeds audio length ({frames} frames)")]
    SplitOutOfBounds { frame: usize, frames: usize },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from hound WAV encoder
    #[error("Hound WAV error: {0}")]
    Hound(#[from] hound::Error),

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An output path resolves to the recording being processed
    #[error("Refusing to overwrite source recording '{0}'")]
    OverwritesSource(String),
}

/// Convenient Result type that uses our AudioError
pub type Result<T> = std::result::Result<T, AudioError>;

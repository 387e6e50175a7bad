// src/audio/mod.rs

pub mod correlate;
pub mod decoder;
pub mod encoder;
pub mod matcher;
pub mod normalize;
pub mod reference;
pub mod trim;
pub mod types;

// Re-export commonly used items
pub use correlate::cross_correlate_valid;
pub use decoder::{decode_audio_file, get_audio_info};
pub use encoder::{encode_wav, WavSampleFormat};
pub use matcher::{
    diagnose, locate, JingleMatch, MatchCandidate, MatchDiagnostics, NoMatchReason, Polarity,
};
pub use normalize::{downmix_mono, normalize};
pub use reference::ReferencePattern;
pub use trim::{split_audio, TrimOutcome};
pub use types::{AudioData, AudioInfo};

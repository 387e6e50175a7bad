use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};

/// Represents decoded audio data in memory as PCM samples
///
/// Samples are stored interleaved: [L, R, L, R, ...] for stereo
/// or [M, M, M, ...] for mono, where each sample is a 32-bit float
/// in the range [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// PCM audio samples as 32-bit floats, interleaved by channel
    /// Example for stereo: [left_0, right_0, left_1, right_1, ...]
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl AudioData {
    /// Calculate the total duration of the audio in seconds
    ///
    /// Duration = total_samples / (sample_rate * channels)
    pub fn duration_seconds(&self) -> f64 {
        let total_frames = self.samples.len() as f64 / self.channels as f64;
        total_frames / self.sample_rate as f64
    }

    /// Duration in whole milliseconds (floor of frames * 1000 / sample_rate)
    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frame_count() as u64, self.sample_rate)
    }

    /// Get the number of audio frames (one sample per channel)
    ///
    /// For stereo: 1000 samples = 500 frames
    /// For mono: 1000 samples = 1000 frames
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Zero-length buffer with the same sample rate and channel layout
    pub fn empty_like(&self) -> AudioData {
        AudioData {
            samples: Vec::new(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Copy out frames `start..end` into a new buffer
    pub fn slice_frames(&self, start: usize, end: usize) -> Result<AudioData> {
        let frames = self.frame_count();
        if start > end || end > frames {
            return Err(AudioError::SplitOutOfBounds {
                frame: start.max(end),
                frames,
            });
        }

        let channels = self.channels as usize;
        Ok(AudioData {
            samples: self.samples[start * channels..end * channels].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }

    /// Human-readable layout, e.g. "44100 Hz, 2 ch"
    pub fn format_label(&self) -> String {
        format!("{} Hz, {} ch", self.sample_rate, self.channels)
    }
}

/// Convert a frame position to whole milliseconds, rounding down
pub fn frames_to_ms(frames: u64, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (frames as u128 * 1000 / sample_rate as u128).min(u64::MAX as u128) as u64
}

/// Convert milliseconds to a frame count, rounding down and saturating
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    (ms as u128 * sample_rate as u128 / 1000).min(usize::MAX as u128) as usize
}

/// Metadata about an audio file without loading all samples
///
/// Use this for quick info queries without decoding the entire file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Total duration in seconds
    pub duration_seconds: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels
    pub channels: u16,

    /// Audio format/codec name (e.g., "MP3", "FLAC", "Vorbis")
    pub format: String,

    /// Bit depth if available (e.g., 16, 24)
    pub bit_depth: Option<u16>,
}

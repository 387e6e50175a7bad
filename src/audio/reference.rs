// src/audio/reference.rs

use std::path::Path;

use crate::audio::decoder::decode_audio_file;
use crate::audio::normalize::normalize;
use crate::audio::types::{ms_to_frames, AudioData};
use crate::error::{AudioError, Result};

/// The jingle in analysis form: mono, analysis rate, leading window only
///
/// Built once per batch and shared read-only between workers.
#[derive(Debug, Clone)]
pub struct ReferencePattern {
    audio: AudioData,
    source_duration_ms: u64,
}

impl ReferencePattern {
    /// Normalize `jingle` and keep its first `window_ms` milliseconds
    ///
    /// A jingle shorter than the window is used whole.
    ///
    /// # Example
    /// ```
    /// use jingle_trim::audio::{AudioData, ReferencePattern};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let jingle = AudioData {
    ///     samples: (0..16000).map(|i| (i as f32 * 0.05).sin()).collect(),
    ///     sample_rate: 8000,
    ///     channels: 1,
    /// };
    ///
    /// let reference = ReferencePattern::from_audio(&jingle, 8000, 1000)?;
    /// assert_eq!(reference.frame_count(), 8000);
    /// assert_eq!(reference.source_duration_ms(), 2000);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_audio(jingle: &AudioData, analysis_rate: u32, window_ms: u64) -> Result<Self> {
        if window_ms == 0 {
            return Err(AudioError::InvalidConfig(
                "Reference window must be greater than 0 ms".to_string(),
            ));
        }

        let normalized = normalize(jingle, analysis_rate)?;
        let window_frames = ms_to_frames(window_ms, analysis_rate);
        let frames = window_frames.min(normalized.frame_count());
        let audio = normalized.slice_frames(0, frames)?;

        if audio.is_empty() {
            return Err(AudioError::InvalidReference(
                "Jingle window contains no samples".to_string(),
            ));
        }
        if audio.samples.iter().all(|&s| s == 0.0) {
            return Err(AudioError::InvalidReference(
                "Jingle window is silent".to_string(),
            ));
        }

        Ok(Self {
            audio,
            source_duration_ms: jingle.duration_ms(),
        })
    }

    /// Decode a jingle file and build the reference from it
    pub fn load<P: AsRef<Path>>(path: P, analysis_rate: u32, window_ms: u64) -> Result<Self> {
        let jingle = decode_audio_file(path)?;
        Self::from_audio(&jingle, analysis_rate, window_ms)
    }

    pub fn audio(&self) -> &AudioData {
        &self.audio
    }

    pub fn samples(&self) -> &[f32] {
        &self.audio.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.audio.frame_count()
    }

    pub fn duration_ms(&self) -> u64 {
        self.audio.duration_ms()
    }

    /// Duration of the full jingle the window was cut from
    pub fn source_duration_ms(&self) -> u64 {
        self.source_duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chirp(seconds: f32, sample_rate: u32, channels: u16) -> AudioData {
        let frames = (seconds * sample_rate as f32) as usize;
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let value = (2.0 * std::f32::consts::PI * (200.0 * t + 150.0 * t * t)).sin() * 0.5;
            for _ in 0..channels {
                samples.push(value);
            }
        }
        AudioData {
            samples,
            sample_rate,
            channels,
        }
    }

    #[test]
    fn test_window_is_cut_from_start() {
        let jingle = chirp(3.0, 8000, 1);
        let reference = ReferencePattern::from_audio(&jingle, 8000, 1000).unwrap();

        assert_eq!(reference.frame_count(), 8000);
        assert_eq!(reference.duration_ms(), 1000);
        assert_eq!(reference.samples(), &jingle.samples[..8000]);
        assert_eq!(reference.source_duration_ms(), 3000);
    }

    #[test]
    fn test_short_jingle_used_whole() {
        let jingle = chirp(0.5, 8000, 1);
        let reference = ReferencePattern::from_audio(&jingle, 8000, 5000).unwrap();

        assert_eq!(reference.frame_count(), 4000);
        assert!(reference.duration_ms() <= reference.source_duration_ms());

        let reference = ReferencePattern::from_audio(&jingle, 8000, u64::MAX).unwrap();
        assert_eq!(reference.frame_count(), 4000);
    }

    #[test]
    fn test_reference_is_canonical() {
        let jingle = chirp(1.0, 48000, 2);
        let reference = ReferencePattern::from_audio(&jingle, 44100, 500).unwrap();

        assert_eq!(reference.audio().channels, 1);
        assert_eq!(reference.sample_rate(), 44100);
        assert_eq!(reference.frame_count(), 22050);
    }

    #[test]
    fn test_silent_or_empty_jingle_rejected() {
        let silent = AudioData {
            samples: vec![0.0; 8000],
            sample_rate: 8000,
            channels: 1,
        };
        assert!(matches!(
            ReferencePattern::from_audio(&silent, 8000, 1000),
            Err(AudioError::InvalidReference(_))
        ));

        let empty = AudioData {
            samples: Vec::new(),
            sample_rate: 8000,
            channels: 1,
        };
        assert!(matches!(
            ReferencePattern::from_audio(&empty, 8000, 1000),
            Err(AudioError::InvalidReference(_))
        ));

        assert!(matches!(
            ReferencePattern::from_audio(&chirp(1.0, 8000, 1), 8000, 0),
            Err(AudioError::InvalidConfig(_))
        ));
    }
}

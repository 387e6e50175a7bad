// src/audio/trim.rs

use crate::audio::matcher::JingleMatch;
use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Result of cutting one recording at its jingle
///
/// Without a match the recording is passed through: `kept` is the input and
/// `removed` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimOutcome {
    /// Everything before the jingle
    pub kept: AudioData,

    /// The jingle and everything after it
    pub removed: AudioData,

    pub matched: Option<JingleMatch>,
}

impl TrimOutcome {
    /// Keep the whole recording
    pub fn pass_through(audio: &AudioData) -> Self {
        Self {
            kept: audio.clone(),
            removed: audio.empty_like(),
            matched: None,
        }
    }

    /// Cut `audio` at a match found at `analysis_rate`
    pub fn split(audio: &AudioData, found: JingleMatch, analysis_rate: u32) -> Result<Self> {
        let frame = source_frame(
            found.offset_frames,
            analysis_rate,
            audio.sample_rate,
            audio.frame_count(),
        );
        let (kept, removed) = split_audio(audio, frame)?;

        Ok(Self {
            kept,
            removed,
            matched: Some(found),
        })
    }
}

/// Split audio at `frame`: `[0, frame)` and `[frame, end)`
///
/// A hard cut, no crossfade or padding.
///
/// # Example
/// ```
/// use jingle_trim::audio::{split_audio, AudioData};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // 10 seconds of stereo at 44.1kHz
/// let audio = AudioData {
///     samples: vec![0.5; 882000],
///     sample_rate: 44100,
///     channels: 2,
/// };
///
/// let (kept, removed) = split_audio(&audio, 44100 * 4)?;
///
/// assert_eq!(kept.duration_seconds(), 4.0);
/// assert_eq!(removed.duration_seconds(), 6.0);
/// assert_eq!(removed.channels, 2);
/// # Ok(())
/// # }
/// ```
pub fn split_audio(audio: &AudioData, frame: usize) -> Result<(AudioData, AudioData)> {
    let frames = audio.frame_count();
    if frame > frames {
        return Err(AudioError::SplitOutOfBounds { frame, frames });
    }

    Ok((
        audio.slice_frames(0, frame)?,
        audio.slice_frames(frame, frames)?,
    ))
}

/// Map an analysis-rate frame position onto the source's own rate
///
/// Rounded to the nearest frame and clamped to the source length.
pub fn source_frame(
    analysis_frame: u64,
    analysis_rate: u32,
    source_rate: u32,
    source_frames: usize,
) -> usize {
    if analysis_rate == 0 {
        return 0;
    }
    let scaled = analysis_frame as u128 * source_rate as u128;
    let rounded = (scaled + analysis_rate as u128 / 2) / analysis_rate as u128;
    (rounded.min(source_frames as u128)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create test audio data
    fn create_test_audio(duration_seconds: f64, sample_rate: u32, channels: u16) -> AudioData {
        let total_samples = (duration_seconds * sample_rate as f64 * channels as f64) as usize;
        let samples = (0..total_samples).map(|i| (i % 7) as f32 * 0.1).collect();

        AudioData {
            samples,
            sample_rate,
            channels,
        }
    }

    fn found_at(offset_frames: u64, rate: u32) -> JingleMatch {
        JingleMatch {
            offset_ms: offset_frames * 1000 / rate as u64,
            offset_frames,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_split_preserves_every_frame() {
        let audio = create_test_audio(10.0, 44100, 2);

        let (kept, removed) = split_audio(&audio, 130_000).unwrap();

        assert_eq!(kept.frame_count() + removed.frame_count(), audio.frame_count());
        let mut joined = kept.samples.clone();
        joined.extend_from_slice(&removed.samples);
        assert_eq!(joined, audio.samples);
    }

    #[test]
    fn test_split_at_edges() {
        let audio = create_test_audio(1.0, 8000, 1);

        let (kept, removed) = split_audio(&audio, 0).unwrap();
        assert!(kept.is_empty());
        assert_eq!(removed, audio);

        let (kept, removed) = split_audio(&audio, 8000).unwrap();
        assert_eq!(kept, audio);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_split_out_of_bounds() {
        let audio = create_test_audio(1.0, 8000, 2);
        match split_audio(&audio, 8001) {
            Err(AudioError::SplitOutOfBounds { .. }) => (),
            _ => panic!("Expected SplitOutOfBounds error"),
        }
    }

    #[test]
    fn test_pass_through_keeps_original() {
        let audio = create_test_audio(2.0, 22050, 2);
        let outcome = TrimOutcome::pass_through(&audio);

        assert_eq!(outcome.kept, audio);
        assert!(outcome.removed.is_empty());
        assert_eq!(outcome.removed.duration_ms(), 0);
        assert_eq!(outcome.matched, None);
    }

    #[test]
    fn test_split_maps_analysis_rate_to_source_rate() {
        // 48kHz stereo source analysed at 44.1kHz: 20s in both clocks
        let audio = create_test_audio(30.0, 48000, 2);
        let outcome = TrimOutcome::split(&audio, found_at(882_000, 44100), 44100).unwrap();

        assert_eq!(outcome.kept.frame_count(), 960_000);
        assert_eq!(outcome.kept.duration_ms(), 20_000);
        assert_eq!(outcome.removed.duration_ms(), 10_000);
        assert_eq!(
            outcome.kept.frame_count() + outcome.removed.frame_count(),
            audio.frame_count()
        );
    }

    #[test]
    fn test_source_frame_rounds_and_clamps() {
        assert_eq!(source_frame(1, 44100, 48000, 100), 1);
        assert_eq!(source_frame(44100, 44100, 22050, 100_000), 22050);
        assert_eq!(source_frame(44100, 44100, 48000, 1000), 1000);
        assert_eq!(source_frame(5, 0, 48000, 1000), 0);
    }
}

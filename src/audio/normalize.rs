// src/audio/normalize.rs
//! Bring any decoded buffer into the canonical analysis form: mono, one
//! fixed sample rate. Reference and targets go through the same path so
//! correlation offsets map back to real time.

use rubato::{FftFixedIn, Resampler};

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Input chunk size handed to the FFT resampler
const RESAMPLE_CHUNK: usize = 1024;

/// Convert audio to mono at `target_rate`
///
/// Channels are averaged per frame, then the signal is resampled with a
/// band-limited FFT resampler. Input that is already mono at `target_rate`
/// comes back as an unchanged copy, so normalizing twice is a no-op.
///
/// # Example
/// ```
/// use jingle_trim::audio::{normalize, AudioData};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let stereo = AudioData {
///     samples: vec![0.25, 0.75, -0.5, 0.5],
///     sample_rate: 44100,
///     channels: 2,
/// };
///
/// let mono = normalize(&stereo, 44100)?;
/// assert_eq!(mono.channels, 1);
/// assert_eq!(mono.samples, vec![0.5, 0.0]);
/// # Ok(())
/// # }
/// ```
pub fn normalize(audio: &AudioData, target_rate: u32) -> Result<AudioData> {
    if target_rate == 0 {
        return Err(AudioError::InvalidConfig(
            "Analysis sample rate must be greater than 0".to_string(),
        ));
    }
    if audio.sample_rate == 0 || audio.channels == 0 {
        return Err(AudioError::IncompatibleFormat {
            expected: "a positive sample rate and channel count".to_string(),
            found: audio.format_label(),
        });
    }

    let mono = downmix_mono(audio);

    if audio.sample_rate == target_rate {
        return Ok(AudioData {
            samples: mono,
            sample_rate: target_rate,
            channels: 1,
        });
    }

    tracing::debug!(
        "Resampling {} frames from {} Hz to {} Hz",
        mono.len(),
        audio.sample_rate,
        target_rate
    );

    Ok(AudioData {
        samples: resample_mono(&mono, audio.sample_rate, target_rate)?,
        sample_rate: target_rate,
        channels: 1,
    })
}

/// Average all channels of each frame into a single mono sample
pub fn downmix_mono(audio: &AudioData) -> Vec<f32> {
    let channels = audio.channels as usize;
    if channels == 1 {
        return audio.samples.clone();
    }

    let scale = 1.0 / channels as f32;
    audio
        .samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Number of frames a signal of `frames` frames has after rate conversion
pub fn resampled_len(frames: usize, from_rate: u32, to_rate: u32) -> usize {
    let numerator = frames as u64 * to_rate as u64;
    numerator.div_ceil(from_rate as u64) as usize
}

fn resample_mono(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let expected = resampled_len(input.len(), from_rate, to_rate);
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, RESAMPLE_CHUNK, 2, 1)
            .map_err(|e| AudioError::Resample(format!("Failed to create resampler: {}", e)))?;

    // The resampler front-loads `delay` frames of latency; drop them so
    // output frame 0 lines up with input frame 0.
    let delay = resampler.output_delay();
    let wanted = delay + expected;
    let mut output: Vec<f64> = Vec::with_capacity(wanted + RESAMPLE_CHUNK);

    let mut pos = 0;
    while pos < input.len() && output.len() < wanted {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(input.len());
        let waves = vec![input[pos..end].iter().map(|&s| s as f64).collect::<Vec<f64>>()];

        let resampled = if end - pos == needed {
            resampler.process(waves.as_slice(), None)
        } else {
            resampler.process_partial(Some(waves.as_slice()), None)
        }
        .map_err(|e| AudioError::Resample(e.to_string()))?;

        output.extend_from_slice(&resampled[0]);
        pos = end;
    }

    // Flush the tail still held inside the resampler
    while output.len() < wanted {
        let resampled = resampler
            .process_partial(None::<&[Vec<f64>]>, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        if resampled[0].is_empty() {
            break;
        }
        output.extend_from_slice(&resampled[0]);
    }

    let mut samples: Vec<f32> = output
        .iter()
        .skip(delay)
        .take(expected)
        .map(|&s| s as f32)
        .collect();
    samples.resize(expected, 0.0);

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, seconds: f32, sample_rate: u32, channels: u16) -> AudioData {
        let frames = (seconds * sample_rate as f32) as usize;
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let value = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.5;
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

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count()
    }

    #[test]
    fn test_downmix_averages_channels() {
        let audio = AudioData {
            samples: vec![1.0, 0.0, 0.5, -0.5, -1.0, -1.0],
            sample_rate: 8000,
            channels: 2,
        };
        assert_eq!(downmix_mono(&audio), vec![0.5, 0.0, -1.0]);
    }

    #[test]
    fn test_canonical_input_is_unchanged() {
        let audio = tone(440.0, 0.5, 44100, 1);
        let normalized = normalize(&audio, 44100).unwrap();
        assert_eq!(normalized, audio);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let audio = tone(440.0, 1.0, 48000, 2);

        let once = normalize(&audio, 44100).unwrap();
        let twice = normalize(&once, 44100).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_resample_length_and_layout() {
        let audio = tone(440.0, 1.0, 48000, 2);
        let normalized = normalize(&audio, 44100).unwrap();

        assert_eq!(normalized.channels, 1);
        assert_eq!(normalized.sample_rate, 44100);
        assert_eq!(normalized.frame_count(), 44100);
        assert_eq!(resampled_len(48000, 48000, 44100), 44100);
    }

    #[test]
    fn test_resample_preserves_frequency() {
        let audio = tone(440.0, 1.0, 48000, 1);
        let normalized = normalize(&audio, 44100).unwrap();

        // 440 Hz crosses zero ~880 times a second
        let crossings = zero_crossings(&normalized.samples[2000..42100]) as f32;
        let expected = 880.0 * (40100.0 / 44100.0);
        assert!(
            (crossings - expected).abs() < 10.0,
            "Expected ~{} crossings, got {}",
            expected,
            crossings
        );
    }

    #[test]
    fn test_short_and_empty_buffers_are_valid() {
        let short = tone(440.0, 0.01, 22050, 1);
        let normalized = normalize(&short, 44100).unwrap();
        assert_eq!(normalized.frame_count(), resampled_len(short.frame_count(), 22050, 44100));

        let empty = AudioData {
            samples: Vec::new(),
            sample_rate: 48000,
            channels: 2,
        };
        assert!(normalize(&empty, 44100).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let audio = tone(440.0, 0.1, 44100, 1);
        assert!(matches!(
            normalize(&audio, 0),
            Err(AudioError::InvalidConfig(_))
        ));

        let broken = AudioData {
            samples: vec![0.0; 10],
            sample_rate: 0,
            channels: 1,
        };
        assert!(matches!(
            normalize(&broken, 44100),
            Err(AudioError::IncompatibleFormat { .. })
        ));
    }
}

// src/audio/encoder.rs

use dasp::Sample;
use hound::{SampleFormat, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::types::AudioData;
use crate::error::Result;

/// Sample encoding used for WAV output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavSampleFormat {
    /// 32-bit float, lossless for decoded data
    #[default]
    Float32,

    /// 16-bit signed integer PCM, half the size
    Pcm16,
}

/// Encode PCM audio data to a WAV file
///
/// # Arguments
/// * `audio` - The audio data to encode
/// * `output_path` - Where to save the WAV file
/// * `format` - Sample encoding of the written file
///
/// # Example
/// ```
/// use jingle_trim::audio::{encode_wav, AudioData, WavSampleFormat};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Create some test audio data
/// let audio = AudioData {
///     samples: vec![0.0, 0.5, -0.5, 1.0, -1.0],
///     sample_rate: 44100,
///     channels: 1,
/// };
///
/// // Encode to WAV file
/// # let temp_dir = std::env::temp_dir();
/// # let output_path = temp_dir.join("jingle_trim_doc_output.wav");
/// encode_wav(&audio, &output_path, WavSampleFormat::Float32)?;
/// # std::fs::remove_file(&output_path).ok();
/// # Ok(())
/// # }
/// ```
pub fn encode_wav<P: AsRef<Path>>(
    audio: &AudioData,
    output_path: P,
    format: WavSampleFormat,
) -> Result<()> {
    let (bits_per_sample, sample_format) = match format {
        WavSampleFormat::Float32 => (32, SampleFormat::Float),
        WavSampleFormat::Pcm16 => (16, SampleFormat::Int),
    };

    let spec = WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample,
        sample_format,
    };

    let mut writer = WavWriter::create(output_path, spec)?;

    match format {
        WavSampleFormat::Float32 => {
            for &sample in &audio.samples {
                writer.write_sample(sample)?;
            }
        }
        WavSampleFormat::Pcm16 => {
            for &sample in &audio.samples {
                writer.write_sample(sample.clamp(-1.0, 1.0).to_sample::<i16>())?;
            }
        }
    }

    // Finalize the file (writes headers, etc.)
    writer.finalize()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    fn test_audio() -> AudioData {
        AudioData {
            samples: vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25],
            sample_rate: 44100,
            channels: 2,
        }
    }

    #[test]
    fn test_encode_float_wav() {
        let test_audio = test_audio();

        let temp_path = std::env::temp_dir().join("jingle_trim_test_encode_f32.wav");
        encode_wav(&test_audio, &temp_path, WavSampleFormat::Float32).unwrap();

        let mut reader = WavReader::open(&temp_path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_format, SampleFormat::Float);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();

        assert_eq!(samples, test_audio.samples);

        std::fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_encode_pcm16_wav() {
        let test_audio = test_audio();

        let temp_path = std::env::temp_dir().join("jingle_trim_test_encode_i16.wav");
        encode_wav(&test_audio, &temp_path, WavSampleFormat::Pcm16).unwrap();

        let mut reader = WavReader::open(&temp_path).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();

        assert_eq!(samples.len(), test_audio.samples.len());
        for (original, decoded) in test_audio.samples.iter().zip(samples.iter()) {
            assert!((original - *decoded as f32 / 32768.0).abs() < 0.001);
        }

        std::fs::remove_file(temp_path).ok();
    }
}

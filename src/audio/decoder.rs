// src/audio/decoder.rs

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use std::fs::File;
use std::path::Path;

use crate::audio::types::{AudioData, AudioInfo};
use crate::error::{AudioError, Result};

/// Decodes an audio file to PCM samples in memory
///
/// Supports: MP3, FLAC, WAV, OGG Vorbis, AAC, and more via symphonia.
/// Samples come back interleaved regardless of how the codec lays out its
/// planes. Corrupt packets are skipped with a warning rather than failing
/// the whole file.
///
/// # Arguments
/// * `path` - Path to the audio file
///
/// # Returns
/// AudioData containing all decoded PCM samples
///
/// # Example
/// ```no_run
/// use jingle_trim::audio::decode_audio_file;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let audio = decode_audio_file("episodes/001_pilot.mp3")?;
/// println!("Loaded {} seconds of audio", audio.duration_seconds());
/// println!("Sample rate: {} Hz", audio.sample_rate);
/// println!("Channels: {}", audio.channels);
/// # Ok(())
/// # }
/// ```
pub fn decode_audio_file<P: AsRef<Path>>(path: P) -> Result<AudioData> {
    let path = path.as_ref();
    let mut format = probe_file(path)?;

    // Find the default audio track (skip video/subtitle tracks)
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeFailed("No audio track found in file".to_string()))?;

    let track_id = track.id;

    // Extract audio parameters
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::DecodeFailed("Sample rate not found".to_string()))?;

    // Channel metadata is missing for some MP3s; the first decoded packet fills it in
    let mut channels_opt = track.codec_params.channels.map(|c| c.count() as u16);

    // Create decoder for this track
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeFailed(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) if is_end_of_stream(&e) => break,
            Err(e) => {
                return Err(AudioError::DecodeFailed(format!(
                    "Failed to read packet after {} samples: {}",
                    samples.len(),
                    e
                )))
            }
        };

        // Skip packets from other tracks (e.g., video, album art)
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                tracing::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(AudioError::DecodeFailed(format!("Decode error: {}", e))),
        };

        let spec = *decoded.spec();
        let decoded_channels = spec.channels.count() as u16;
        match channels_opt {
            None => channels_opt = Some(decoded_channels),
            Some(ch) if ch != decoded_channels => {
                return Err(AudioError::DecodeFailed(format!(
                    "Channel count changed mid-stream ({} -> {})",
                    ch, decoded_channels
                )));
            }
            Some(_) => {}
        }

        if sample_buf
            .as_ref()
            .map(|b| b.capacity() < decoded.capacity())
            .unwrap_or(true)
        {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    if skipped_packets > 0 {
        tracing::warn!("{}: skipped {} corrupt packets", path.display(), skipped_packets);
    }

    let channels = channels_opt
        .filter(|&ch| ch > 0)
        .ok_or_else(|| AudioError::DecodeFailed("Could not determine channel count".to_string()))?;

    tracing::debug!(
        "Decoded {}: {} frames, {} Hz, {} ch",
        path.display(),
        samples.len() / channels as usize,
        sample_rate,
        channels
    );

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
    })
}

/// Get audio file metadata without decoding all samples
///
/// Much faster than decode_audio_file() for just getting duration/info
///
/// # Example
/// ```no_run
/// use jingle_trim::audio::get_audio_info;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let info = get_audio_info("jingle_sample.mp3")?;
/// println!("Duration: {:.2} seconds", info.duration_seconds);
/// println!("Format: {}", info.format);
/// # Ok(())
/// # }
/// ```
pub fn get_audio_info<P: AsRef<Path>>(path: P) -> Result<AudioInfo> {
    let format = probe_file(path.as_ref())?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeFailed("No audio track".to_string()))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    // Calculate duration from frame count
    let duration_seconds = if let (Some(n_frames), Some(sr)) =
        (track.codec_params.n_frames, track.codec_params.sample_rate)
    {
        n_frames as f64 / sr as f64
    } else {
        0.0
    };

    let format_name = symphonia::default::get_codecs()
        .get_codec(track.codec_params.codec)
        .map(|d| d.short_name.to_uppercase())
        .unwrap_or_else(|| format!("{:?}", track.codec_params.codec));

    Ok(AudioInfo {
        duration_seconds,
        sample_rate,
        channels,
        format: format_name,
        bit_depth: track.codec_params.bits_per_sample.map(|b| b as u16),
    })
}

/// symphonia reports a clean end of stream as an unexpected EOF
fn is_end_of_stream(error: &SymphoniaError) -> bool {
    matches!(error, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}

/// Open a file and let symphonia detect its container
fn probe_file(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = File::open(path).map_err(|e| AudioError::FileOpen {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    // Create a media source stream (buffered reader)
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create a hint to help symphonia detect the format
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| match e {
            SymphoniaError::Unsupported(what) => AudioError::UnsupportedFormat(format!(
                "{}: {}",
                path.display(),
                what
            )),
            other => AudioError::DecodeFailed(format!("Failed to probe format: {}", other)),
        })?;

    Ok(probed.format)
}

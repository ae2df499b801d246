//! Normalization of captured audio into the canonical waveform
//!
//! Every transcriber-facing waveform is mono f32 at 16 kHz. Input audio
//! arrives as encoded bytes (WAV or MP3) at whatever rate and channel
//! count the source produced; decoding and normalization are separate
//! steps so the pipeline can hand the original bytes to the remote
//! validator while the local model gets the canonical form.

use std::io::Cursor;

use rubato::{FftFixedIn, Resampler};

use super::SAMPLE_RATE;
use crate::{Error, Result};

/// Resampler input chunk size
const RESAMPLE_CHUNK: usize = 1024;

/// Decoded PCM audio, still in source format
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved f32 samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decode encoded audio bytes into PCM samples
///
/// Accepts WAV (integer or float PCM) and MP3.
///
/// # Errors
///
/// Returns `Error::Decode` if the bytes cannot be parsed as either format
pub fn decode(bytes: &[u8]) -> Result<DecodedAudio> {
    if bytes.starts_with(b"RIFF") {
        return decode_wav(bytes);
    }
    decode_mp3(bytes)
}

/// Normalize PCM samples to the canonical mono 16 kHz waveform
///
/// Multi-channel input is downmixed by averaging; off-rate input is
/// resampled. Already-canonical input passes through unchanged. The input
/// buffer is never mutated.
///
/// # Errors
///
/// Returns `Error::Decode` for impossible formats (zero channels or rate)
/// and `Error::Audio` if the resampler fails
pub fn normalize(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<f32>> {
    if channels == 0 {
        return Err(Error::Decode("audio has no channels".to_string()));
    }
    if sample_rate == 0 {
        return Err(Error::Decode("audio has a zero sample rate".to_string()));
    }

    let mono = if channels == 1 {
        samples.to_vec()
    } else {
        downmix(samples, channels)
    };

    if sample_rate == SAMPLE_RATE {
        return Ok(mono);
    }

    resample(&mono, sample_rate, SAMPLE_RATE)
}

/// Downmix interleaved samples by averaging the channels of each frame
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels);
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Resample mono audio between rates using band-limited FFT resampling
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, RESAMPLE_CHUNK, 2, 1)
            .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let mut output = Vec::new();
    let mut pos = 0;

    while pos + RESAMPLE_CHUNK <= samples.len() {
        let chunk = &samples[pos..pos + RESAMPLE_CHUNK];
        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend_from_slice(&resampled[0]);
        pos += RESAMPLE_CHUNK;
    }

    // Zero-pad the final partial chunk, then trim the output back to the
    // proportional length so the tail doesn't gain trailing silence
    if pos < samples.len() {
        let remaining = samples.len() - pos;
        let mut last = vec![0.0; RESAMPLE_CHUNK];
        last[..remaining].copy_from_slice(&samples[pos..]);

        let resampled = resampler
            .process(&[&last[..]], None)
            .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;

        let keep = (remaining as u64 * u64::from(to_rate) / u64::from(from_rate)) as usize;
        output.extend_from_slice(&resampled[0][..keep.min(resampled[0].len())]);
    }

    Ok(output)
}

/// Decode WAV bytes via hound
fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| Error::Decode(format!("WAV parse error: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Decode(format!("WAV read error: {e}")))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Decode(format!("WAV read error: {e}")))?
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Decode MP3 bytes via minimp3
fn decode_mp3(bytes: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = 0_u32;
    let mut channels = 0_u16;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if channels == 0 {
                    sample_rate = frame.sample_rate as u32;
                    channels = frame.channels as u16;
                }
                samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Decode(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode(
            "could not parse audio as WAV or MP3".to_string(),
        ));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = vec![0.2, 0.4, -0.6, -0.2, 1.0, 0.0];
        let mono = downmix(&stereo, 2);

        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] - (-0.4)).abs() < 1e-6);
        assert!((mono[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_canonical_input_passes_through() {
        let samples = vec![0.1, -0.1, 0.25, 0.0];
        let normalized = normalize(&samples, SAMPLE_RATE, 1).unwrap();
        assert_eq!(normalized, samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples = vec![0.0_f32; 32000];
        let normalized = normalize(&samples, 32000, 1).unwrap();

        // 32 kHz -> 16 kHz should roughly halve the sample count; the
        // resampler's startup latency eats a little of the tail
        let expected = samples.len() / 2;
        let tolerance = RESAMPLE_CHUNK * 2;
        assert!(
            normalized.len().abs_diff(expected) <= tolerance,
            "got {} samples, expected about {expected}",
            normalized.len()
        );
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert!(matches!(
            normalize(&[0.0], SAMPLE_RATE, 0),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02]),
            Err(Error::Decode(_))
        ));
    }
}

//! Audio normalization tests
//!
//! Tests decode + normalize without requiring audio hardware.

use parley::audio::{self, SAMPLE_RATE, samples_to_wav};

/// Generate sine wave audio samples at an arbitrary rate
fn generate_sine_samples(frequency: f32, duration_secs: f32, rate: u32) -> Vec<f32> {
    let num_samples = (rate as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / rate as f32;
            0.5 * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

#[test]
fn test_samples_to_wav_header() {
    let samples = generate_sine_samples(440.0, 0.1, SAMPLE_RATE);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
    assert!(wav_data.len() > 44); // WAV header is 44 bytes
}

#[test]
fn test_wav_roundtrip_through_decode() {
    let original = generate_sine_samples(440.0, 0.1, SAMPLE_RATE);
    let wav_data = samples_to_wav(&original, SAMPLE_RATE).unwrap();

    let decoded = audio::decode(&wav_data).unwrap();
    assert_eq!(decoded.sample_rate, SAMPLE_RATE);
    assert_eq!(decoded.channels, 1);
    assert_eq!(decoded.samples.len(), original.len());

    // 16-bit quantization loses a little precision, nothing more
    for (a, b) in decoded.samples.iter().zip(original.iter()) {
        assert!((a - b).abs() < 0.001);
    }
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(audio::decode(&[0x01, 0x02, 0x03, 0x04, 0x05]).is_err());
    assert!(audio::decode(b"RIFFnot actually a wav file").is_err());
}

#[test]
fn test_canonical_audio_is_untouched() {
    let samples = generate_sine_samples(440.0, 0.1, SAMPLE_RATE);
    let normalized = audio::normalize(&samples, SAMPLE_RATE, 1).unwrap();
    assert_eq!(normalized, samples);
}

#[test]
fn test_stereo_off_rate_input_becomes_canonical() {
    let mono = generate_sine_samples(440.0, 0.25, 44100);

    // Interleave into stereo
    let stereo: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();

    let normalized = audio::normalize(&stereo, 44100, 2).unwrap();

    // 44.1 kHz -> 16 kHz shrinks the sample count proportionally
    let expected = mono.len() * SAMPLE_RATE as usize / 44100;
    assert!(
        normalized.len().abs_diff(expected) < 2048,
        "got {} samples, expected about {expected}",
        normalized.len()
    );
}

#[test]
fn test_downmix_averages_opposing_channels_to_silence() {
    // Left and right cancel exactly
    let stereo: Vec<f32> = (0..200).flat_map(|_| [0.5, -0.5]).collect();
    let normalized = audio::normalize(&stereo, SAMPLE_RATE, 2).unwrap();

    assert_eq!(normalized.len(), 200);
    assert!(normalized.iter().all(|s| s.abs() < f32::EPSILON));
}

//! Audio processing module
//!
//! Capture from the microphone, normalization to the canonical waveform
//! (mono f32 at 16 kHz), and playback of synthesized speech.

mod capture;
mod normalize;
mod playback;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use normalize::{DecodedAudio, decode, normalize};
pub use playback::AudioPlayback;

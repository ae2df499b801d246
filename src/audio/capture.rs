//! Audio capture from microphone
//!
//! Captures at the canonical 16 kHz mono and segments one utterance per
//! call: recording starts when the input energy crosses a threshold and
//! stops after a sustained run of silence, a bounded listen timeout, or
//! the max phrase duration.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to keep an utterance (in samples)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Buffer polling interval while recording
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captures audio from the default input device
pub struct AudioCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Start capturing audio
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let stream = device
            .build_input_stream(
                &self.config.clone(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing audio
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("audio capture stopped");
        }
    }

    /// Record a single utterance
    ///
    /// Blocks until an utterance has been segmented. Recording begins when
    /// the input energy first crosses the speech threshold; if that doesn't
    /// happen within `listen_timeout`, the attempt is abandoned. Once
    /// speech has started, the utterance ends after half a second of
    /// silence or when `phrase_limit` worth of samples has accumulated.
    ///
    /// # Errors
    ///
    /// Returns `Error::CaptureTimeout` if no speech starts in time, or
    /// `Error::Audio` if the device fails
    pub fn record_utterance(
        &mut self,
        listen_timeout: Duration,
        phrase_limit: Duration,
    ) -> Result<Vec<f32>> {
        self.start()?;
        self.clear_buffer();

        let phrase_samples = (phrase_limit.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize;
        let started_at = Instant::now();
        let mut utterance: Vec<f32> = Vec::new();
        let mut speech_started = false;
        let mut silence_run = 0_usize;

        loop {
            std::thread::sleep(POLL_INTERVAL);
            let chunk = self.take_buffer();

            if !speech_started {
                if started_at.elapsed() > listen_timeout {
                    self.stop();
                    return Err(Error::CaptureTimeout);
                }

                if !chunk.is_empty() && rms_energy(&chunk) > ENERGY_THRESHOLD {
                    tracing::debug!("speech detected");
                    speech_started = true;
                    utterance.extend_from_slice(&chunk);
                }
                continue;
            }

            if !chunk.is_empty() {
                utterance.extend_from_slice(&chunk);
                if rms_energy(&chunk) > ENERGY_THRESHOLD {
                    silence_run = 0;
                } else {
                    silence_run += chunk.len();
                }
            }

            if silence_run > SILENCE_SAMPLES && utterance.len() > MIN_SPEECH_SAMPLES {
                tracing::debug!(samples = utterance.len(), "utterance complete");
                break;
            }

            if utterance.len() >= phrase_samples {
                tracing::debug!(samples = utterance.len(), "phrase limit reached");
                break;
            }
        }

        self.stop();
        Ok(utterance)
    }

    /// Get captured audio buffer and clear it
    ///
    /// Returns the audio samples captured since last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Clear the audio buffer
    pub fn clear_buffer(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    /// Get the sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// Calculate RMS energy of audio samples
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Convert f32 samples to WAV bytes (16-bit PCM) for the remote validator
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

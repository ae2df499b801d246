//! Exchange orchestration
//!
//! The assistant drives one exchange at a time: text exchanges run inline
//! on the caller's task, voice exchanges are dispatched to their own task
//! so multi-second capture and transcription never freeze the interactive
//! surface. Results flow back over an event channel; the presentation
//! layer is never touched directly from a worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::audio::{self, AudioCapture, AudioPlayback, SAMPLE_RATE};
use crate::resolver::ResponseResolver;
use crate::transcribe::{DEFAULT_LANGUAGE, ReconciliationPipeline};
use crate::tts::TextToSpeech;
use crate::Error;

/// Events emitted to the presentation layer
#[derive(Debug, Clone)]
pub enum AssistantEvent {
    /// A voice exchange produced a transcript
    Transcript { text: String, language: String },
    /// An exchange produced a response
    Response { text: String },
    /// A voice exchange was abandoned before producing anything
    Abandoned { reason: String },
}

/// Orchestrates exchanges between capture, transcription, memory, and speech
pub struct Assistant {
    resolver: ResponseResolver,
    /// `None` when the whisper model is unavailable (text-only mode)
    pipeline: Option<ReconciliationPipeline>,
    /// `None` when no TTS credentials are configured
    tts: Option<Arc<TextToSpeech>>,
    listen_timeout: Duration,
    phrase_limit: Duration,
    events: mpsc::UnboundedSender<AssistantEvent>,
}

impl Assistant {
    /// Create a new assistant
    #[must_use]
    pub fn new(
        resolver: ResponseResolver,
        pipeline: Option<ReconciliationPipeline>,
        tts: Option<Arc<TextToSpeech>>,
        listen_timeout: Duration,
        phrase_limit: Duration,
        events: mpsc::UnboundedSender<AssistantEvent>,
    ) -> Self {
        Self {
            resolver,
            pipeline,
            tts,
            listen_timeout,
            phrase_limit,
            events,
        }
    }

    /// Whether voice exchanges are available
    #[must_use]
    pub const fn voice_available(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Handle one text exchange synchronously
    ///
    /// Empty input is a no-op. The response is returned to the caller and
    /// spoken best-effort.
    pub async fn handle_text(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let response = self.resolver.resolve(input);
        self.speak(&response, DEFAULT_LANGUAGE).await;
        Some(response)
    }

    /// Dispatch a voice exchange to its own task
    pub fn spawn_voice_exchange(self: &Arc<Self>) {
        let assistant = Arc::clone(self);
        tokio::spawn(async move {
            assistant.voice_exchange().await;
        });
    }

    /// Run one voice exchange to completion
    ///
    /// Capture and playback run on blocking threads (cpal streams are not
    /// Send); within the exchange the steps are strictly sequential:
    /// capture -> normalize -> local -> remote -> reconcile -> resolve ->
    /// persist -> speak.
    pub async fn voice_exchange(&self) {
        let Some(pipeline) = &self.pipeline else {
            self.emit(AssistantEvent::Abandoned {
                reason: "voice is unavailable (no whisper model loaded)".to_string(),
            });
            return;
        };

        let listen_timeout = self.listen_timeout;
        let phrase_limit = self.phrase_limit;

        let captured = tokio::task::spawn_blocking(move || {
            let mut capture = AudioCapture::new()?;
            capture.record_utterance(listen_timeout, phrase_limit)
        })
        .await;

        let samples = match captured {
            Ok(Ok(samples)) => samples,
            Ok(Err(Error::CaptureTimeout)) => {
                self.emit(AssistantEvent::Abandoned {
                    reason: "no speech detected".to_string(),
                });
                return;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "audio capture failed");
                self.emit(AssistantEvent::Abandoned {
                    reason: format!("capture failed: {e}"),
                });
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "capture task panicked");
                self.emit(AssistantEvent::Abandoned {
                    reason: "capture failed".to_string(),
                });
                return;
            }
        };

        let wav = match audio::samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode captured audio");
                self.emit(AssistantEvent::Abandoned {
                    reason: "capture failed".to_string(),
                });
                return;
            }
        };

        let transcript = pipeline.transcribe(&wav).await;

        // Empty transcript means "no input, do nothing": nothing is
        // resolved and nothing is written
        if transcript.is_empty() {
            self.emit(AssistantEvent::Abandoned {
                reason: "could not understand the audio".to_string(),
            });
            return;
        }

        self.emit(AssistantEvent::Transcript {
            text: transcript.text.clone(),
            language: transcript.language.clone(),
        });

        let response = self.resolver.resolve(&transcript.text);
        self.emit(AssistantEvent::Response {
            text: response.clone(),
        });

        self.speak(&response, &transcript.language).await;
    }

    /// Speak a response best-effort
    ///
    /// Synthesis and playback failures are logged and absorbed; the
    /// response has already been delivered as text.
    async fn speak(&self, text: &str, language: &str) {
        let Some(tts) = &self.tts else {
            return;
        };

        match tts.synthesize(text, language).await {
            Ok(mp3) => {
                let played =
                    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&mp3)).await;
                match played {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!(error = %e, "playback failed"),
                    Err(e) => tracing::error!(error = %e, "playback task panicked"),
                }
            }
            Err(e) => tracing::warn!(error = %e, "speech synthesis failed"),
        }
    }

    fn emit(&self, event: AssistantEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

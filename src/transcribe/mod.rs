//! Transcription reconciliation
//!
//! A local Whisper model always produces a transcript; when the network
//! is reachable and credentials are present, a remote transcription API
//! validates it. The pipeline reconciles the two candidates into the
//! single transcript exposed to the rest of the assistant.

mod local;
mod pipeline;
mod probe;
mod remote;

use async_trait::async_trait;

use crate::Result;

pub use local::WhisperTranscriber;
pub use pipeline::ReconciliationPipeline;
pub use probe::HttpProbe;
pub use remote::RemoteWhisper;

/// Language reported when a transcriber doesn't detect one
pub const DEFAULT_LANGUAGE: &str = "en";

/// Which transcriber produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptSource {
    Local,
    Remote,
}

/// One transcriber's output for an utterance
#[derive(Debug, Clone)]
pub struct TranscriptCandidate {
    /// Transcript text, trimmed of surrounding whitespace
    pub text: String,
    /// Short language code (e.g. "en", "hi")
    pub language: String,
    pub source: TranscriptSource,
}

impl TranscriptCandidate {
    /// Candidate from the local model; missing language defaults to "en"
    #[must_use]
    pub fn local(text: &str, language: Option<String>) -> Self {
        Self {
            text: text.trim().to_string(),
            language: language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            source: TranscriptSource::Local,
        }
    }

    /// Candidate from the remote validator
    ///
    /// The remote service is treated as a pure text corrector, so its
    /// candidate carries no language of its own.
    #[must_use]
    pub fn remote(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            source: TranscriptSource::Remote,
        }
    }
}

/// The pipeline's output: the single reconciled transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledTranscript {
    pub text: String,
    pub language: String,
}

impl ReconciledTranscript {
    /// The empty-transcript sentinel ("no input, do nothing")
    #[must_use]
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Whether this is the empty sentinel
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Offline speech-to-text collaborator
///
/// CPU-bound and synchronous; the pipeline runs it on a blocking thread.
pub trait LocalTranscriber: Send + Sync {
    /// Transcribe a canonical waveform (mono f32 at 16 kHz)
    ///
    /// # Errors
    ///
    /// Returns error if inference fails
    fn transcribe(&self, waveform: &[f32]) -> Result<TranscriptCandidate>;
}

/// Online transcription collaborator
#[async_trait]
pub trait RemoteTranscriber: Send + Sync {
    /// Transcribe the original encoded audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails; the pipeline absorbs it
    async fn transcribe(&self, audio: &[u8]) -> Result<TranscriptCandidate>;
}

/// Network reachability collaborator
///
/// Implementations must fail closed: any probe error means offline.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

//! The transcription reconciliation pipeline
//!
//! Orchestrates normalize -> local transcribe -> conditional online
//! validation -> tie-break. The contract is "always return a best-effort
//! transcript or the empty sentinel, never an error": decode and local
//! inference failures collapse to `("", "en")`, remote failures fall back
//! to the local candidate.

use std::sync::Arc;

use crate::audio;
use crate::transcribe::{
    Connectivity, LocalTranscriber, ReconciledTranscript, RemoteTranscriber, TranscriptCandidate,
};

/// Reconciles local and remote transcription of one utterance
#[derive(Clone)]
pub struct ReconciliationPipeline {
    local: Arc<dyn LocalTranscriber>,
    remote: Option<Arc<dyn RemoteTranscriber>>,
    probe: Arc<dyn Connectivity>,
}

impl ReconciliationPipeline {
    /// Create a new pipeline
    ///
    /// `remote` is `None` when validation is disabled or unconfigured;
    /// the pipeline then never consults the probe.
    #[must_use]
    pub fn new(
        local: Arc<dyn LocalTranscriber>,
        remote: Option<Arc<dyn RemoteTranscriber>>,
        probe: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            local,
            remote,
            probe,
        }
    }

    /// Transcribe one utterance from its encoded bytes
    ///
    /// The bytes are held in memory only for the duration of this call:
    /// the local model reads the normalized waveform derived from them,
    /// the remote validator reads them as-is. An empty transcript means
    /// "no input, do nothing"; callers must check before acting on it.
    pub async fn transcribe(&self, raw_audio: &[u8]) -> ReconciledTranscript {
        let waveform = match decode_and_normalize(raw_audio) {
            Ok(waveform) => waveform,
            Err(e) => {
                tracing::warn!(error = %e, "audio could not be normalized");
                return ReconciledTranscript::empty();
            }
        };

        // The local model always runs and never touches the network
        let local = Arc::clone(&self.local);
        let local_candidate =
            match tokio::task::spawn_blocking(move || local.transcribe(&waveform)).await {
                Ok(Ok(candidate)) => candidate,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "local transcription failed");
                    return ReconciledTranscript::empty();
                }
                Err(e) => {
                    tracing::error!(error = %e, "local transcription task panicked");
                    return ReconciledTranscript::empty();
                }
            };

        tracing::debug!(
            text = %local_candidate.text,
            language = %local_candidate.language,
            "local transcript"
        );

        if let Some(remote) = &self.remote {
            if self.probe.is_online().await {
                match remote.transcribe(raw_audio).await {
                    Ok(remote_candidate) => {
                        return reconcile(local_candidate, Some(remote_candidate));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "remote validation failed, keeping local transcript");
                    }
                }
            } else {
                tracing::debug!("offline, skipping remote validation");
            }
        }

        reconcile(local_candidate, None)
    }
}

/// Decode encoded audio bytes and normalize to the canonical waveform
fn decode_and_normalize(raw_audio: &[u8]) -> crate::Result<Vec<f32>> {
    let decoded = audio::decode(raw_audio)?;
    audio::normalize(&decoded.samples, decoded.sample_rate, decoded.channels)
}

/// Apply the tie-break policy
///
/// A remote candidate wins only when it is non-empty and differs from the
/// local text ignoring case; even then the local candidate's detected
/// language is kept, since the remote service corrects text rather than
/// detecting languages. In every other case the local candidate is
/// returned verbatim.
fn reconcile(
    local: TranscriptCandidate,
    remote: Option<TranscriptCandidate>,
) -> ReconciledTranscript {
    if let Some(remote) = remote {
        if !remote.text.is_empty() && remote.text.to_lowercase() != local.text.to_lowercase() {
            tracing::info!(
                local = %local.text,
                remote = %remote.text,
                "remote validation corrected transcript"
            );
            return ReconciledTranscript {
                text: remote.text,
                language: local.language,
            };
        }
    }

    ReconciledTranscript {
        text: local.text,
        language: local.language,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_differing_remote_wins_with_local_language() {
        let local = TranscriptCandidate::local("hello wrld", Some("en".to_string()));
        let remote = TranscriptCandidate::remote("hello world");

        let result = reconcile(local, Some(remote));
        assert_eq!(result.text, "hello world");
        assert_eq!(result.language, "en");
    }

    #[test]
    fn test_identical_remote_keeps_local_casing() {
        let local = TranscriptCandidate::local("Hello World", Some("en".to_string()));
        let remote = TranscriptCandidate::remote("hello world");

        let result = reconcile(local, Some(remote));
        assert_eq!(result.text, "Hello World");
    }

    #[test]
    fn test_empty_remote_never_overrides() {
        let local = TranscriptCandidate::local("hello", Some("en".to_string()));
        let remote = TranscriptCandidate::remote("   ");

        let result = reconcile(local, Some(remote));
        assert_eq!(result.text, "hello");
    }

    #[test]
    fn test_no_remote_returns_local_verbatim() {
        let local = TranscriptCandidate::local("  bonjour  ", Some("fr".to_string()));

        let result = reconcile(local, None);
        assert_eq!(result.text, "bonjour");
        assert_eq!(result.language, "fr");
    }

    #[test]
    fn test_local_language_survives_correction() {
        let local = TranscriptCandidate::local("namaste duniya", Some("hi".to_string()));
        let remote = TranscriptCandidate::remote("namaste dunia");

        let result = reconcile(local, Some(remote));
        assert_eq!(result.text, "namaste dunia");
        assert_eq!(result.language, "hi");
    }

    #[test]
    fn test_missing_local_language_defaults() {
        let local = TranscriptCandidate::local("hello", None);
        assert_eq!(local.language, "en");
    }
}

//! Online transcript validation via an OpenAI-compatible Whisper API

use std::time::Duration;

use async_trait::async_trait;

use crate::transcribe::{RemoteTranscriber, TranscriptCandidate};
use crate::{Error, Result};

/// Response from the transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Validates transcripts against a remote Whisper endpoint
pub struct RemoteWhisper {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl RemoteWhisper {
    /// Create a new remote validator
    ///
    /// `timeout` bounds the whole request; validation is best-effort and
    /// must never stall an exchange.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the client can't be built
    pub fn new(api_base: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for remote validation".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl RemoteTranscriber for RemoteWhisper {
    async fn transcribe(&self, audio: &[u8]) -> Result<TranscriptCandidate> {
        tracing::debug!(audio_bytes = audio.len(), "starting remote validation");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Remote(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!("API error {status}: {body}")));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        tracing::debug!(transcript = %result.text, "remote validation complete");
        Ok(TranscriptCandidate::remote(&result.text))
    }
}

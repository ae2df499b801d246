//! Text-to-speech (TTS) processing
//!
//! Synthesizes speech through an OpenAI-compatible speech endpoint. The
//! voice is chosen per utterance from a language-prefix table so the
//! assistant can answer in a voice matching the detected language.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    default_voice: String,
    /// Language-prefix to voice overrides, checked in order
    voices: BTreeMap<String, String>,
    speed: f64,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        default_voice: &str,
        voices: BTreeMap<String, String>,
        speed: f64,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            default_voice: default_voice.to_string(),
            voices,
            speed,
        })
    }

    /// Pick the voice for a language tag
    ///
    /// The first configured prefix contained in the tag wins (so "hi"
    /// matches both "hi" and "hi-IN"); otherwise the default voice.
    #[must_use]
    pub fn voice_for(&self, language: &str) -> &str {
        self.voices
            .iter()
            .find(|(prefix, _)| language.contains(prefix.as_str()))
            .map_or(self.default_voice.as_str(), |(_, voice)| voice.as_str())
    }

    /// Synthesize text to speech
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let voice = self.voice_for(language);
        tracing::debug!(voice, language, chars = text.len(), "synthesizing speech");

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Tts(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("speech API error {status}: {body}")));
        }

        let audio = response.bytes().await.map_err(|e| Error::Tts(e.to_string()))?;
        Ok(audio.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tts_with_hindi_override() -> TextToSpeech {
        let mut voices = BTreeMap::new();
        voices.insert("hi".to_string(), "onyx".to_string());
        TextToSpeech::new("https://api.example.com/v1", "key", "tts-1", "alloy", voices, 1.0)
            .unwrap()
    }

    #[test]
    fn test_voice_override_matches_language_prefix() {
        let tts = tts_with_hindi_override();

        assert_eq!(tts.voice_for("hi"), "onyx");
        assert_eq!(tts.voice_for("hi-IN"), "onyx");
        assert_eq!(tts.voice_for("en"), "alloy");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(
            TextToSpeech::new("https://api.example.com/v1", "", "tts-1", "alloy", BTreeMap::new(), 1.0)
                .is_err()
        );
    }
}

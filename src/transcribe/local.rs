//! Offline transcription via a local GGML Whisper model

use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::transcribe::{LocalTranscriber, TranscriptCandidate};
use crate::{Error, Result};

/// Transcribes speech with a local Whisper model
pub struct WhisperTranscriber {
    ctx: WhisperContext,
    /// Forced language; `None` = auto-detect per utterance
    language: Option<String>,
}

impl WhisperTranscriber {
    /// Load a GGML Whisper model from disk
    ///
    /// Loading is expensive; do it once at startup and share the instance.
    ///
    /// # Errors
    ///
    /// Returns error if the model file is missing or cannot be loaded
    pub fn new(model_path: &Path, language: Option<String>) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::Stt(format!(
                "whisper model not found: {} (set PARLEY_MODEL or voice.model_path)",
                model_path.display()
            )));
        }

        let path = model_path
            .to_str()
            .ok_or_else(|| Error::Stt(format!("invalid model path: {}", model_path.display())))?;

        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| Error::Stt(format!("failed to load whisper model: {e}")))?;

        tracing::info!(model = %model_path.display(), "whisper model loaded");

        Ok(Self { ctx, language })
    }
}

impl LocalTranscriber for WhisperTranscriber {
    fn transcribe(&self, waveform: &[f32]) -> Result<TranscriptCandidate> {
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| Error::Stt(format!("failed to create whisper state: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        // Leave one core for the rest of the process
        let threads = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(4);
        params.set_n_threads(threads as i32);

        match &self.language {
            Some(lang) => params.set_language(Some(lang.as_str())),
            None => params.set_language(Some("auto")),
        }

        state
            .full(params, waveform)
            .map_err(|e| Error::Stt(format!("whisper inference failed: {e}")))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| Error::Stt(format!("whisper segment count failed: {e}")))?;

        let mut text = String::new();
        for i in 0..segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| Error::Stt(format!("whisper segment read failed: {e}")))?;
            text.push_str(&segment);
        }

        let language = self.language.clone().or_else(|| {
            state
                .full_lang_id_from_state()
                .ok()
                .and_then(whisper_rs::get_lang_str)
                .map(ToString::to_string)
        });

        tracing::debug!(segments, language = ?language, "local inference complete");
        Ok(TranscriptCandidate::local(&text, language))
    }
}

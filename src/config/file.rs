//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfigFile {
    /// Data directory override
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Remote validation configuration
    #[serde(default)]
    pub remote: RemoteFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Path to the GGML Whisper model file
    pub model_path: Option<String>,

    /// Force a transcription language; omit for auto-detection
    pub language: Option<String>,

    /// Seconds to wait for speech to start
    pub listen_timeout_secs: Option<f64>,

    /// Max seconds per captured phrase
    pub phrase_limit_secs: Option<f64>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// Default TTS voice (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,

    /// Language-prefix to voice overrides
    pub tts_voices: Option<std::collections::BTreeMap<String, String>>,
}

/// Remote validation configuration
#[derive(Debug, Default, Deserialize)]
pub struct RemoteFileConfig {
    /// Enable online validation
    pub enabled: Option<bool>,

    /// API base URL
    pub api_base: Option<String>,

    /// Remote transcription model
    pub model: Option<String>,

    /// Validation request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Connectivity probe URL
    pub probe_url: Option<String>,

    /// Connectivity probe timeout in seconds
    pub probe_timeout_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ParleyConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> ParleyConfigFile {
    let Some(path) = config_file_path() else {
        return ParleyConfigFile::default();
    };

    if !path.exists() {
        return ParleyConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ParleyConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ParleyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/parley/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("parley").join("config.toml"))
}

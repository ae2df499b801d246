//! Configuration management for Parley
//!
//! Configuration is layered: built-in defaults, then the optional TOML
//! config file, then environment variables.

pub mod file;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Parley configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database, models)
    pub data_dir: PathBuf,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Remote validation configuration
    pub remote: RemoteConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Path to the GGML Whisper model file
    pub model_path: PathBuf,

    /// Force a transcription language (e.g. "en"); `None` = auto-detect
    pub language: Option<String>,

    /// How long to wait for speech to start before abandoning capture
    pub listen_timeout: Duration,

    /// Hard cap on the length of a single captured phrase
    pub phrase_limit: Duration,

    /// TTS model identifier (e.g. "tts-1")
    pub tts_model: String,

    /// Default TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// Language-prefix to voice overrides (e.g. "hi" -> "onyx")
    pub tts_voices: BTreeMap<String, String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            language: None,
            listen_timeout: Duration::from_secs(5),
            phrase_limit: Duration::from_secs(8),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            tts_voices: BTreeMap::new(),
        }
    }
}

/// Remote transcription validation configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Enable online validation of local transcripts
    pub enabled: bool,

    /// API base URL for the transcription endpoint
    pub api_base: String,

    /// Remote transcription model (e.g. "whisper-1")
    pub model: String,

    /// Hard timeout for a validation request
    pub timeout: Duration,

    /// URL probed to decide whether the network is reachable
    pub probe_url: String,

    /// Timeout for the connectivity probe
    pub probe_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            timeout: Duration::from_secs(5),
            probe_url: "https://www.google.com".to_string(),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (remote Whisper validation and TTS)
    pub openai: Option<String>,
}

impl Config {
    /// Load configuration from defaults, the config file, and the environment
    ///
    /// # Errors
    ///
    /// Returns error if no data directory can be determined
    pub fn load(data_dir_override: Option<PathBuf>) -> Result<Self> {
        let overlay = file::load_config_file();

        let data_dir = data_dir_override
            .or_else(|| std::env::var_os("PARLEY_DATA_DIR").map(PathBuf::from))
            .or_else(|| overlay.data_dir.clone().map(PathBuf::from))
            .or_else(default_data_dir)
            .ok_or_else(|| Error::Config("could not determine a data directory".to_string()))?;

        let mut voice = VoiceConfig {
            model_path: data_dir.join("models").join("ggml-base.bin"),
            ..VoiceConfig::default()
        };

        if let Some(path) = overlay.voice.model_path {
            voice.model_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("PARLEY_MODEL") {
            voice.model_path = PathBuf::from(path);
        }
        if let Some(lang) = overlay.voice.language {
            voice.language = Some(lang);
        }
        if let Some(secs) = overlay.voice.listen_timeout_secs {
            voice.listen_timeout = Duration::from_secs_f64(secs);
        }
        if let Some(secs) = overlay.voice.phrase_limit_secs {
            voice.phrase_limit = Duration::from_secs_f64(secs);
        }
        if let Some(model) = overlay.voice.tts_model {
            voice.tts_model = model;
        }
        if let Some(v) = overlay.voice.tts_voice {
            voice.tts_voice = v;
        }
        if let Some(speed) = overlay.voice.tts_speed {
            voice.tts_speed = speed;
        }
        if let Some(voices) = overlay.voice.tts_voices {
            voice.tts_voices = voices.into_iter().collect();
        }

        let mut remote = RemoteConfig::default();
        if let Some(enabled) = overlay.remote.enabled {
            remote.enabled = enabled;
        }
        if let Some(base) = overlay.remote.api_base {
            remote.api_base = base;
        }
        if let Some(model) = overlay.remote.model {
            remote.model = model;
        }
        if let Some(secs) = overlay.remote.timeout_secs {
            remote.timeout = Duration::from_secs(secs);
        }
        if let Some(url) = overlay.remote.probe_url {
            remote.probe_url = url;
        }
        if let Some(secs) = overlay.remote.probe_timeout_secs {
            remote.probe_timeout = Duration::from_secs(secs);
        }

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .or(overlay.api_keys.openai),
        };

        Ok(Self {
            data_dir,
            voice,
            remote,
            api_keys,
        })
    }

    /// Path to the exchange database
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("parley.db")
    }

    /// Whether remote validation can run (enabled and credentials present)
    #[must_use]
    pub fn remote_configured(&self) -> bool {
        self.remote.enabled && self.api_keys.openai.is_some()
    }
}

/// Default data directory: `~/.local/share/parley` (platform equivalent)
fn default_data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.data_dir().join("parley"))
}

//! Error types for Parley

use thiserror::Error;

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Parley
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Audio bytes could not be parsed into PCM samples
    #[error("decode error: {0}")]
    Decode(String),

    /// No speech started within the listen timeout
    #[error("no speech detected within the listen timeout")]
    CaptureTimeout,

    /// Local speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Remote transcription unavailable (network, auth, timeout)
    #[error("remote transcription error: {0}")]
    Remote(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

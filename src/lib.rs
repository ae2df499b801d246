//! Parley - hybrid offline/online voice assistant
//!
//! This library provides the core functionality for the Parley assistant:
//! - Audio capture and normalization (mono 16 kHz canonical waveform)
//! - Two-stage transcription: a local Whisper model, optionally validated
//!   against a remote transcription API when the network is reachable
//! - A memory-augmented response resolver backed by a persistent exchange log
//! - Speech synthesis and playback
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Presentation                      │
//! │        CLI REPL  │  ask  │  listen  │  ...       │
//! └───────────────────────┬──────────────────────────┘
//!                         │ events
//! ┌───────────────────────▼──────────────────────────┐
//! │                  Assistant                        │
//! │  capture → normalize → local STT ─┬─► reconcile  │
//! │                 remote validation ─┘      │       │
//! │           recall / rules / write-back ◄───┘       │
//! └───────────────────────┬──────────────────────────┘
//!                         │
//! ┌───────────────────────▼──────────────────────────┐
//! │          Exchange log (SQLite, append-only)       │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod assistant;
pub mod audio;
pub mod config;
pub mod db;
pub mod error;
pub mod resolver;
pub mod transcribe;
pub mod tts;

pub use assistant::{Assistant, AssistantEvent};
pub use config::Config;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use resolver::ResponseResolver;
pub use transcribe::{
    Connectivity, LocalTranscriber, ReconciledTranscript, ReconciliationPipeline,
    RemoteTranscriber, TranscriptCandidate, TranscriptSource,
};
pub use tts::TextToSpeech;

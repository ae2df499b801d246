//! Reconciliation pipeline integration tests
//!
//! Drives the pipeline with stub collaborators; no model or network is
//! required.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use parley::audio::{SAMPLE_RATE, samples_to_wav};
use parley::transcribe::{
    Connectivity, LocalTranscriber, ReconciliationPipeline, RemoteTranscriber, TranscriptCandidate,
};
use parley::{Error, Result};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// A valid WAV fixture for pipeline input
fn wav_fixture() -> Vec<u8> {
    let samples = generate_sine_samples(440.0, 0.2, 0.3);
    samples_to_wav(&samples, SAMPLE_RATE).unwrap()
}

struct StubLocal {
    text: &'static str,
    language: &'static str,
}

impl LocalTranscriber for StubLocal {
    fn transcribe(&self, _waveform: &[f32]) -> Result<TranscriptCandidate> {
        Ok(TranscriptCandidate::local(
            self.text,
            Some(self.language.to_string()),
        ))
    }
}

struct FailingLocal;

impl LocalTranscriber for FailingLocal {
    fn transcribe(&self, _waveform: &[f32]) -> Result<TranscriptCandidate> {
        Err(Error::Stt("model exploded".to_string()))
    }
}

struct StubRemote {
    text: &'static str,
    invoked: Arc<AtomicBool>,
}

#[async_trait]
impl RemoteTranscriber for StubRemote {
    async fn transcribe(&self, _audio: &[u8]) -> Result<TranscriptCandidate> {
        self.invoked.store(true, Ordering::SeqCst);
        Ok(TranscriptCandidate::remote(self.text))
    }
}

struct FailingRemote;

#[async_trait]
impl RemoteTranscriber for FailingRemote {
    async fn transcribe(&self, _audio: &[u8]) -> Result<TranscriptCandidate> {
        Err(Error::Remote("connection reset".to_string()))
    }
}

struct StubProbe {
    online: bool,
}

#[async_trait]
impl Connectivity for StubProbe {
    async fn is_online(&self) -> bool {
        self.online
    }
}

fn pipeline(
    local: impl LocalTranscriber + 'static,
    remote: Option<Arc<dyn RemoteTranscriber>>,
    online: bool,
) -> ReconciliationPipeline {
    ReconciliationPipeline::new(Arc::new(local), remote, Arc::new(StubProbe { online }))
}

#[tokio::test]
async fn test_remote_corrects_text_but_not_language() {
    let local = StubLocal {
        text: "hello wrld",
        language: "en",
    };
    let remote = StubRemote {
        text: "hello world",
        invoked: Arc::new(AtomicBool::new(false)),
    };

    let result = pipeline(local, Some(Arc::new(remote)), true)
        .transcribe(&wav_fixture())
        .await;

    assert_eq!(result.text, "hello world");
    assert_eq!(result.language, "en");
}

#[tokio::test]
async fn test_identical_candidates_keep_local_casing() {
    let local = StubLocal {
        text: "Hello World",
        language: "en",
    };
    let remote = StubRemote {
        text: "hello world",
        invoked: Arc::new(AtomicBool::new(false)),
    };

    let result = pipeline(local, Some(Arc::new(remote)), true)
        .transcribe(&wav_fixture())
        .await;

    assert_eq!(result.text, "Hello World");
}

#[tokio::test]
async fn test_offline_never_consults_remote() {
    let invoked = Arc::new(AtomicBool::new(false));
    let local = StubLocal {
        text: "local transcript",
        language: "en",
    };
    let remote = StubRemote {
        text: "remote transcript",
        invoked: Arc::clone(&invoked),
    };

    let result = pipeline(local, Some(Arc::new(remote)), false)
        .transcribe(&wav_fixture())
        .await;

    assert_eq!(result.text, "local transcript");
    assert!(!invoked.load(Ordering::SeqCst), "remote must not be invoked offline");
}

#[tokio::test]
async fn test_remote_failure_falls_back_to_local() {
    let local = StubLocal {
        text: "local transcript",
        language: "en",
    };

    let result = pipeline(local, Some(Arc::new(FailingRemote)), true)
        .transcribe(&wav_fixture())
        .await;

    assert_eq!(result.text, "local transcript");
    assert_eq!(result.language, "en");
}

#[tokio::test]
async fn test_no_remote_returns_local() {
    let local = StubLocal {
        text: "bonjour tout le monde",
        language: "fr",
    };

    let result = pipeline(local, None, true).transcribe(&wav_fixture()).await;

    assert_eq!(result.text, "bonjour tout le monde");
    assert_eq!(result.language, "fr");
}

#[tokio::test]
async fn test_malformed_audio_yields_empty_sentinel() {
    let local = StubLocal {
        text: "should never be used",
        language: "en",
    };

    let result = pipeline(local, None, true)
        .transcribe(&[0xde, 0xad, 0xbe, 0xef])
        .await;

    assert!(result.is_empty());
    assert_eq!(result.language, "en");
}

#[tokio::test]
async fn test_local_failure_yields_empty_sentinel() {
    let result = pipeline(FailingLocal, None, true)
        .transcribe(&wav_fixture())
        .await;

    assert!(result.is_empty());
    assert_eq!(result.language, "en");
}

#[tokio::test]
async fn test_empty_remote_text_never_overrides() {
    let local = StubLocal {
        text: "kept transcript",
        language: "en",
    };
    let remote = StubRemote {
        text: "   ",
        invoked: Arc::new(AtomicBool::new(false)),
    };

    let result = pipeline(local, Some(Arc::new(remote)), true)
        .transcribe(&wav_fixture())
        .await;

    assert_eq!(result.text, "kept transcript");
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use parley::audio::{AudioCapture, AudioPlayback};
use parley::db::{self, ExchangeRepo};
use parley::transcribe::{
    Connectivity, HttpProbe, ReconciliationPipeline, RemoteTranscriber, RemoteWhisper,
    WhisperTranscriber,
};
use parley::{Assistant, AssistantEvent, Config, ResponseResolver, TextToSpeech};

/// Parley - hybrid offline/online voice assistant
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Data directory (database and models)
    #[arg(long, env = "PARLEY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one text exchange and print the response
    Ask {
        /// The input text
        text: Vec<String>,
    },
    /// Capture and resolve one voice exchange
    Listen,
    /// Show recent exchanges from memory
    History {
        /// Number of exchanges to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Synthesize and speak a line of text
    Say {
        /// Text to speak
        text: Vec<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.data_dir)?;

    match cli.command {
        Some(Command::Ask { text }) => {
            let resolver = ResponseResolver::new(open_repo(&config)?);
            println!("{}", resolver.resolve(&text.join(" ")));
            Ok(())
        }
        Some(Command::Listen) => listen(&config).await,
        Some(Command::History { limit }) => show_history(&config, limit),
        Some(Command::Say { text }) => say(&config, &text.join(" ")).await,
        Some(Command::TestMic { duration }) => test_mic(duration).await,
        Some(Command::TestSpeaker) => test_speaker().await,
        None => repl(&config).await,
    }
}

/// Open the exchange log at the configured path
fn open_repo(config: &Config) -> anyhow::Result<ExchangeRepo> {
    Ok(ExchangeRepo::new(db::init(config.db_path())?))
}

/// Wire up a full assistant from configuration
///
/// The whisper model and TTS are both optional at runtime: a missing
/// model degrades to text-only mode, missing credentials disable speech
/// output and remote validation.
fn build_assistant(
    config: &Config,
    events: mpsc::UnboundedSender<AssistantEvent>,
) -> anyhow::Result<Arc<Assistant>> {
    let resolver = ResponseResolver::new(open_repo(config)?);

    let tts = config.api_keys.openai.as_ref().and_then(|key| {
        match TextToSpeech::new(
            &config.remote.api_base,
            key,
            &config.voice.tts_model,
            &config.voice.tts_voice,
            config.voice.tts_voices.clone(),
            config.voice.tts_speed,
        ) {
            Ok(tts) => Some(Arc::new(tts)),
            Err(e) => {
                tracing::warn!(error = %e, "TTS unavailable");
                None
            }
        }
    });

    let pipeline = match WhisperTranscriber::new(
        &config.voice.model_path,
        config.voice.language.clone(),
    ) {
        Ok(local) => {
            let remote: Option<Arc<dyn RemoteTranscriber>> = if config.remote_configured() {
                let key = config.api_keys.openai.as_deref().unwrap_or_default();
                match RemoteWhisper::new(
                    &config.remote.api_base,
                    key,
                    &config.remote.model,
                    config.remote.timeout,
                ) {
                    Ok(remote) => Some(Arc::new(remote)),
                    Err(e) => {
                        tracing::warn!(error = %e, "remote validation unavailable");
                        None
                    }
                }
            } else {
                tracing::debug!("remote validation disabled or unconfigured");
                None
            };

            let probe: Arc<dyn Connectivity> = Arc::new(HttpProbe::new(
                &config.remote.probe_url,
                config.remote.probe_timeout,
            )?);

            Some(ReconciliationPipeline::new(Arc::new(local), remote, probe))
        }
        Err(e) => {
            tracing::warn!(error = %e, "voice disabled - running in text-only mode");
            None
        }
    };

    Ok(Arc::new(Assistant::new(
        resolver,
        pipeline,
        tts,
        config.voice.listen_timeout,
        config.voice.phrase_limit,
        events,
    )))
}

fn print_event(event: &AssistantEvent) {
    match event {
        AssistantEvent::Transcript { text, language } => println!("you ({language}): {text}"),
        AssistantEvent::Response { text } => println!("bot: {text}"),
        AssistantEvent::Abandoned { reason } => println!("({reason})"),
    }
}

/// Interactive REPL: type to chat, `:voice` to speak, `:quit` to exit
#[allow(clippy::future_not_send)]
async fn repl(config: &Config) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let assistant = build_assistant(config, tx)?;

    if assistant.voice_available() {
        println!("Parley ready. Type to chat, :voice to speak, :quit to exit.");
    } else {
        println!("Parley ready (text-only mode). Type to chat, :quit to exit.");
    }

    // Voice exchanges report back through the event channel
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            ":quit" | ":q" => break,
            ":voice" | ":v" => assistant.spawn_voice_exchange(),
            input => {
                if let Some(response) = assistant.handle_text(input).await {
                    println!("bot: {response}");
                }
            }
        }
    }

    Ok(())
}

/// Capture and resolve a single voice exchange
#[allow(clippy::future_not_send)]
async fn listen(config: &Config) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let assistant = build_assistant(config, tx)?;

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    println!("Listening...");
    assistant.voice_exchange().await;

    drop(assistant);
    printer.await?;
    Ok(())
}

/// Print recent exchanges, oldest first
fn show_history(config: &Config, limit: usize) -> anyhow::Result<()> {
    let repo = open_repo(config)?;
    let records = repo.recent(limit)?;

    if records.is_empty() {
        println!("no exchanges recorded yet");
        return Ok(());
    }

    for record in records.iter().rev() {
        println!(
            "[{}] you: {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.user_input
        );
        println!("{:18}bot: {}", "", record.bot_response);
    }

    Ok(())
}

/// Synthesize and play a line of text
#[allow(clippy::future_not_send)]
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let key = config
        .api_keys
        .openai
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY required for speech synthesis"))?;

    let tts = TextToSpeech::new(
        &config.remote.api_base,
        key,
        &config.voice.tts_model,
        &config.voice.tts_voice,
        config.voice.tts_voices.clone(),
        config.voice.tts_speed,
    )?;

    let mp3 = tts.synthesize(text, "en").await?;
    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&mp3)).await??;

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for _ in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let peak = samples.iter().fold(0.0_f32, |max, s| max.max(s.abs()));
        let bars = ((peak * 40.0) as usize).min(40);
        println!("level: {:<40} {peak:.3}", "#".repeat(bars));
    }

    capture.stop();
    println!("\nMicrophone test complete");
    Ok(())
}

/// Test speaker output with a one-second tone
#[allow(clippy::future_not_send)]
async fn test_speaker() -> anyhow::Result<()> {
    println!("Playing test tone...");

    let samples: Vec<f32> = (0..24000)
        .map(|i| {
            let t = i as f32 / 24000.0;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();

    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play(samples)).await??;

    println!("Speaker test complete");
    Ok(())
}

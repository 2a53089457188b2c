use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aikya::api::{ApiServer, AppState};
use aikya::news::REGIONS;
use aikya::voice::{SpeechStatus, VoiceCatalog, select_backend};
use aikya::{Config, DialogOrchestrator};

/// Aikya - conversational assistant with progressive reveal and speech
#[derive(Parser)]
#[command(name = "aikya", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable speech output
    #[arg(long, env = "AIKYA_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one or more turns and print the revealed text
    Ask {
        /// Prompts, submitted in order
        #[arg(required = true)]
        prompts: Vec<String>,
    },
    /// List available voices
    Voices,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// List region names understood by the news lookup
    Regions,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,aikya=info",
        1 => "info,aikya=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_with_options(cli.disable_voice)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { prompts } => ask(&config, &prompts).await,
            Command::Voices => {
                list_voices(&config);
                Ok(())
            }
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Regions => {
                list_regions();
                Ok(())
            }
        };
    }

    tracing::info!(
        port = config.server.port,
        voice = config.voice.enabled,
        "starting aikya"
    );

    let state = AppState::from_config(&config);
    ApiServer::new(state.into(), config.server.port)
        .with_static_dir(config.server.static_dir.clone())
        .run()
        .await?;

    Ok(())
}

/// Run turns in-process, streaming each reveal to stdout
async fn ask(config: &Config, prompts: &[String]) -> anyhow::Result<()> {
    let dialog = DialogOrchestrator::from_config(config);
    let mut display = dialog.subscribe_display();
    let mut stdout = std::io::stdout();
    let poll = dialog.timing().reveal_interval.max(Duration::from_millis(10)) * 2;

    for prompt in prompts {
        writeln!(stdout, "> {prompt}")?;
        dialog.submit(prompt).await;

        let mut shown = 0;
        loop {
            // Read the flag first: once it is down the buffer is complete
            let done = !dialog.is_revealing();
            let text = display.borrow_and_update().clone();
            if let Some(fresh) = text.get(shown..) {
                write!(stdout, "{fresh}")?;
                stdout.flush()?;
                shown = text.len();
            }
            if done {
                break;
            }
            let _ = tokio::time::timeout(poll, display.changed()).await;
        }
        writeln!(stdout)?;
    }

    // Let the last turn finish speaking
    let speech = dialog.speech();
    if speech.tts_available() && !speech.is_muted() {
        tokio::time::sleep(dialog.timing().speech_delay + Duration::from_millis(100)).await;
        let mut status = speech.subscribe();
        let _ = status.wait_for(|s| *s != SpeechStatus::Speaking).await;
    }

    Ok(())
}

fn list_voices(config: &Config) {
    for voice in VoiceCatalog::default().voices() {
        let marker = if voice.id == config.voice.default_voice {
            "*"
        } else {
            " "
        };
        println!("{marker} {:<20} {}", voice.id, voice.name);
    }
}

fn list_regions() {
    for region in REGIONS {
        println!("{:<16} {}", region.name, region.code);
    }
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let Some(backend) = select_backend(&config.voice) else {
        anyhow::bail!("no speech backend available (backend = {})", config.voice.backend);
    };

    println!("Speaking with {} ({})...", backend.name(), config.voice.default_voice);
    backend.speak(text, &config.voice.default_voice).await?;
    println!("Done");

    Ok(())
}

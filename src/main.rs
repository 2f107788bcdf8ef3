//! Erika - speaking assistant voice
//!
//! Synthesizes text with the engine configured for its language, falling
//! back to a pre-recorded clip when the engine fails.

use anyhow::{bail, Result};
use clap::Parser;
use erika::config::{self, Config};
use erika::output;
use erika::pipeline::{AudioSource, SpeechPipeline, SynthesisRequest, SynthesisResult};
use erika::playback;
use erika::tts::{remote::RemoteEngine, system::SystemEngine};
use erika::voices;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text to speak
    text: Option<String>,

    /// Text to speak (alternative to the positional argument)
    #[arg(short = 't', long = "text", conflicts_with = "text")]
    text_flag: Option<String>,

    /// Language code, or "auto" to detect
    #[arg(short, long)]
    lang: Option<String>,

    /// Voice preset, persona or reference WAV
    #[arg(long)]
    voice: Option<String>,

    /// Keep the clip under this name in the output directory
    #[arg(short, long)]
    output: Option<String>,

    /// Keep the clip with a timestamped name
    #[arg(short, long)]
    keep: bool,

    /// Do not play the clip
    #[arg(long)]
    no_play: bool,

    /// Use this config file instead of the default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Show engine health and exit
    #[arg(long)]
    status: bool,

    /// List known voices and exit
    #[arg(long)]
    list_voices: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

type LogHandle = reload::Handle<EnvFilter, Registry>;

/// Start logging at `info` (or `RUST_LOG`, or debug with `-v`) so warnings
/// raised while loading the config are not lost.
fn init_logging(verbose: bool) -> (LogHandle, bool) {
    let (filter, pinned) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) if verbose => (EnvFilter::new("debug"), true),
        Err(_) => (EnvFilter::new("info"), false),
    };
    let (filter, handle) = reload::Layer::new(filter);
    // stdout is reserved for kept file paths and listings
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    (handle, pinned)
}

/// Switch to the configured level unless `RUST_LOG` or `-v` chose one
fn apply_config_level(handle: &LogHandle, pinned: bool, level: &str) {
    if pinned {
        return;
    }
    let filter = EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| {
        warn!("⚠️ Invalid log_level '{}', keeping info", level);
        EnvFilter::new("info")
    });
    if let Err(e) = handle.reload(filter) {
        warn!("⚠️ Could not apply log_level '{}': {}", level, e);
    }
}

async fn show_status(config: &Config) {
    let remote = RemoteEngine::new(config);
    let system = SystemEngine::new(config);
    let (health, system_voices) = futures::join!(remote.health(), system.voices());

    match health {
        Ok(status) => println!(
            "vibevoice  {} ({}) at {}",
            status.status,
            status.engine.as_deref().unwrap_or("unknown engine"),
            remote.base_url()
        ),
        Err(e) => println!("vibevoice  offline at {}: {}", remote.base_url(), e),
    }
    println!("system     {} voice(s) installed", system_voices.len());
    println!("pocket_tts program '{}'", config.pocket.program);

    let mut codes: Vec<_> = config.languages.keys().collect();
    codes.sort();
    for code in codes {
        let entry = &config.languages[code];
        println!(
            "  {:<4} -> {} / {}{}",
            code,
            entry.engine,
            entry.voice,
            entry
                .fallback_asset
                .as_deref()
                .map(|a| format!(" (fallback {})", a))
                .unwrap_or_default()
        );
    }
}

async fn list_voices(config: &Config) {
    for (engine, voice, description) in voices::catalog() {
        println!("{:<10} {:<16} {}", engine, voice, description);
    }
    for voice in SystemEngine::new(config).voices().await {
        println!("{:<10} {:<16} {}", "system", voice.name, voice.language);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (log_handle, pinned) = init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_config_level(&log_handle, pinned, &config.log_level);

    info!("🎙️ Erika v{} starting...", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        let path = args.config.clone().unwrap_or_else(config::config_path);
        config.save_to(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }
    if args.status {
        show_status(&config).await;
        return Ok(());
    }
    if args.list_voices {
        list_voices(&config).await;
        return Ok(());
    }

    let Some(text) = args.text.clone().or(args.text_flag.clone()) else {
        bail!("nothing to say: pass TEXT or --text");
    };

    let mut request = SynthesisRequest::new(text);
    if let Some(lang) = &args.lang {
        request = request.with_language(lang.clone());
    }
    if let Some(voice) = &args.voice {
        request = request.with_voice(voice.clone());
    }

    let pipeline = SpeechPipeline::new(&config);
    let audio = match pipeline.generate(&request).await {
        SynthesisResult::Audio(audio) => audio,
        SynthesisResult::Failure(failure) => {
            error!("❌ {}", failure);
            eprintln!("Speech failed: {}", failure);
            std::process::exit(1);
        }
    };

    if audio.source() == AudioSource::Fallback {
        warn!("⚠️ Playing fallback clip for '{}'", audio.language());
    }

    if !args.no_play {
        if let Err(e) = playback::play_file(audio.path().to_path_buf()).await {
            warn!("🔇 Playback failed: {}", e);
        }
    }

    if args.keep || args.output.is_some() {
        let dir = config.output_path();
        let dest = dir.join(output::output_filename(args.output.as_deref()));
        let kept = audio.persist_to(&dest)?;
        println!("{}", kept.display());
        if let Err(e) = output::prune_old_audio(&dir, config.max_audio_files) {
            warn!("⚠️ Could not prune {}: {}", dir.display(), e);
        }
    }

    Ok(())
}

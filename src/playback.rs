//! Audio playback via rodio
//!
//! rodio's output stream is not `Send`, so playback runs start to finish on a
//! blocking thread.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Play a WAV file on the default output device and wait for it to finish
pub fn play_file_blocking(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let source = rodio::Decoder::new(BufReader::new(file))
        .with_context(|| format!("cannot decode {}", path.display()))?;

    let (_stream, stream_handle) =
        rodio::OutputStream::try_default().context("no audio output device")?;
    let sink = rodio::Sink::try_new(&stream_handle).context("failed to create audio sink")?;

    info!("🔊 Playing file: {}", path.display());
    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

/// [`play_file_blocking`] on the blocking pool
pub async fn play_file(path: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || play_file_blocking(&path))
        .await
        .context("playback task panicked")?
}

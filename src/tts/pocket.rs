//! pocket-tts backend calling a local binary

use super::{EngineKind, SynthesisJob, TempAudioFile, TtsEngine};
use crate::config::{Config, GenerationSettings};
use crate::error::EngineError;
use crate::voices;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// pocket-tts writes 24 kHz mono
const POCKET_SAMPLE_RATE: u32 = 24_000;

#[derive(Debug)]
pub struct PocketEngine {
    program: PathBuf,
    generation: GenerationSettings,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl PocketEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            program: PathBuf::from(&config.pocket.program),
            generation: config.generation.clone(),
            timeout: Duration::from_secs(config.pocket.timeout_secs),
            scratch_dir: config.scratch_path(),
        }
    }

    /// Arguments for `pocket-tts generate`
    pub fn command_args(&self, job: &SynthesisJob<'_>, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "generate".into(),
            "--text".into(),
            job.text.into(),
            "--output-path".into(),
            output.as_os_str().to_owned(),
        ];
        if !job.voice.is_empty() {
            args.push("--voice".into());
            args.push(job.voice.into());
        }
        args.extend(self.generation.to_cli_args().into_iter().map(OsString::from));
        args
    }
}

#[async_trait]
impl TtsEngine for PocketEngine {
    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<TempAudioFile, EngineError> {
        info!("📢 pocket-tts speaking: '{}' (voice: {})", job.text, job.voice);

        if !job.voice.is_empty()
            && !voices::is_pocket_preset(job.voice)
            && !Path::new(job.voice).exists()
        {
            warn!(
                "⚠️ '{}' is neither a pocket-tts preset nor a WAV file, passing it through",
                job.voice
            );
        }

        let output = TempAudioFile::reserve(&self.scratch_dir)
            .map_err(|e| EngineError::Unavailable(format!("cannot create output file: {}", e)))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(self.command_args(job, output.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!("Running {:?}", cmd);

        let result = cmd.output().await.map_err(|e| {
            error!("❌ Failed to spawn {}: {}", self.program.display(), e);
            EngineError::Unavailable(format!(
                "failed to spawn {}: {}",
                self.program.display(),
                e
            ))
        })?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        let stderr = String::from_utf8_lossy(&result.stderr);
        debug!("pocket-tts stdout: {}", stdout.trim());
        debug!("pocket-tts stderr: {}", stderr.trim());

        if !result.status.success() {
            return Err(EngineError::ProcessFailed {
                code: result.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        if !output.is_usable() {
            return Err(EngineError::BadOutput(format!(
                "pocket-tts exited cleanly but wrote nothing to {}",
                output.path().display()
            )));
        }

        Ok(output)
    }

    fn kind(&self) -> EngineKind {
        EngineKind::LocalProcess
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn sample_rate(&self) -> u32 {
        POCKET_SAMPLE_RATE
    }
}

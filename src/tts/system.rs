//! Operating system speech engine
//!
//! espeak-ng on Linux, `say` on macOS and System.Speech through PowerShell on
//! Windows. Lightweight and always installed somewhere, so it has the
//! shortest timeout of the engines.

use super::{EngineKind, SynthesisJob, TempAudioFile, TtsEngine};
use crate::config::Config;
use crate::error::EngineError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Speech front end of the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Espeak,
    Say,
    Sapi,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Say
        } else if cfg!(target_os = "windows") {
            Platform::Sapi
        } else {
            Platform::Espeak
        }
    }

    pub fn default_program(&self) -> &'static str {
        match self {
            Platform::Espeak => "espeak-ng",
            Platform::Say => "say",
            Platform::Sapi => "powershell",
        }
    }
}

/// An installed system voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Identifier passed back to the synthesizer
    pub id: String,
    pub name: String,
    pub language: String,
}

/// Parse `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
pub fn parse_espeak_voices(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            Some(VoiceInfo {
                id: cols[1].to_string(),
                name: cols[3].to_string(),
                language: cols[1].to_string(),
            })
        })
        .collect()
}

/// Parse `say -v ?`
///
/// ```text
/// Bad News            en_US    # The light you see at the end of the tunnel...
/// ```
pub fn parse_say_voices(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim();
            let (name, language) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(VoiceInfo {
                id: name.to_string(),
                name: name.to_string(),
                language: language.to_string(),
            })
        })
        .collect()
}

/// Parse `name|culture` lines printed by [`SAPI_LIST_SCRIPT`]
pub fn parse_sapi_voices(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let (name, language) = line.trim().split_once('|')?;
            Some(VoiceInfo {
                id: name.to_string(),
                name: name.to_string(),
                language: language.to_string(),
            })
        })
        .collect()
}

/// First voice whose name contains `fragment`, ignoring case
pub fn select_voice<'a>(voices: &'a [VoiceInfo], fragment: &str) -> Option<&'a VoiceInfo> {
    let fragment = fragment.trim().to_lowercase();
    if fragment.is_empty() {
        return None;
    }
    voices
        .iter()
        .find(|v| v.name.to_lowercase().contains(&fragment))
}

const SAPI_LIST_SCRIPT: &str = "Add-Type -AssemblyName System.Speech; \
    (New-Object System.Speech.Synthesis.SpeechSynthesizer).GetInstalledVoices() | \
    ForEach-Object { $_.VoiceInfo.Name + '|' + $_.VoiceInfo.Culture.Name }";

fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[derive(Debug)]
pub struct SystemEngine {
    platform: Platform,
    program: PathBuf,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl SystemEngine {
    pub fn new(config: &Config) -> Self {
        Self::for_platform(config, Platform::current())
    }

    pub fn for_platform(config: &Config, platform: Platform) -> Self {
        let program = config
            .system
            .program
            .clone()
            .unwrap_or_else(|| platform.default_program().to_string());
        Self {
            platform,
            program: PathBuf::from(program),
            timeout: Duration::from_secs(config.system.timeout_secs),
            scratch_dir: config.scratch_path(),
        }
    }

    fn list_args(&self) -> Vec<OsString> {
        match self.platform {
            Platform::Espeak => vec!["--voices".into()],
            Platform::Say => vec!["-v".into(), "?".into()],
            Platform::Sapi => vec!["-NoProfile".into(), "-Command".into(), SAPI_LIST_SCRIPT.into()],
        }
    }

    /// Installed voices, empty when they cannot be listed
    pub async fn voices(&self) -> Vec<VoiceInfo> {
        let output = Command::new(&self.program)
            .args(self.list_args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;
        match output {
            Ok(out) if out.status.success() => {
                let text = String::from_utf8_lossy(&out.stdout);
                match self.platform {
                    Platform::Espeak => parse_espeak_voices(&text),
                    Platform::Say => parse_say_voices(&text),
                    Platform::Sapi => parse_sapi_voices(&text),
                }
            }
            Ok(out) => {
                debug!("Voice listing exited with {}", out.status);
                Vec::new()
            }
            Err(e) => {
                debug!("Voice listing failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Arguments that speak `text` into `output`, optionally with voice `voice_id`
    pub fn command_args(&self, text: &str, voice_id: Option<&str>, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        match self.platform {
            Platform::Espeak => {
                if let Some(id) = voice_id {
                    args.push("-v".into());
                    args.push(id.into());
                }
                args.push("-w".into());
                args.push(output.as_os_str().to_owned());
                // text starting with '-' must not parse as an option
                args.push("--".into());
                args.push(text.into());
            }
            Platform::Say => {
                if let Some(id) = voice_id {
                    args.push("-v".into());
                    args.push(id.into());
                }
                args.push("-o".into());
                args.push(output.as_os_str().to_owned());
                args.push("--file-format=WAVE".into());
                args.push("--data-format=LEI16@22050".into());
                args.push("--".into());
                args.push(text.into());
            }
            Platform::Sapi => {
                let select = voice_id
                    .map(|id| format!("$s.SelectVoice({}); ", ps_quote(id)))
                    .unwrap_or_default();
                let script = format!(
                    "Add-Type -AssemblyName System.Speech; \
                     $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
                     {}$s.SetOutputToWaveFile({}); $s.Speak({}); $s.Dispose()",
                    select,
                    ps_quote(&output.to_string_lossy()),
                    ps_quote(text)
                );
                args.push("-NoProfile".into());
                args.push("-Command".into());
                args.push(script.into());
            }
        }
        args
    }
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<TempAudioFile, EngineError> {
        info!("📢 System speaking: '{}'", job.text);

        let voice_id = if job.voice.is_empty() {
            None
        } else {
            let voices = self.voices().await;
            match select_voice(&voices, job.voice) {
                Some(v) => {
                    debug!("Selected system voice {} ({})", v.name, v.id);
                    Some(v.id.clone())
                }
                None => {
                    warn!(
                        "⚠️ No system voice matches '{}', keeping the default voice",
                        job.voice
                    );
                    None
                }
            }
        };

        let output = TempAudioFile::reserve(&self.scratch_dir)
            .map_err(|e| EngineError::Unavailable(format!("cannot create output file: {}", e)))?;

        let result = Command::new(&self.program)
            .args(self.command_args(job.text, voice_id.as_deref(), output.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                EngineError::Unavailable(format!(
                    "no system TTS command ({}): {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            return Err(EngineError::ProcessFailed {
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if !output.is_usable() {
            return Err(EngineError::BadOutput(format!(
                "{} wrote no audio",
                self.program.display()
            )));
        }
        Ok(output)
    }

    fn kind(&self) -> EngineKind {
        EngineKind::System
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn sample_rate(&self) -> u32 {
        22_050
    }
}

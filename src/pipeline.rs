//! Dispatch & fallback
//!
//! Resolves the language, runs the engine bound to it once, repairs the
//! produced WAV and falls back to the language's pre-recorded clip when the
//! engine fails. Engine errors never escape as `Err`; a request ends as
//! either audio or an explicit [`SynthesisFailure`].

use crate::config::Config;
use crate::error::EngineError;
use crate::language::LanguageResolver;
use crate::tts::{self, EngineRegistry, SynthesisJob, TempAudioFile};
use crate::wav;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One call to [`SpeechPipeline::generate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    /// Language code, `None` or `"auto"` to detect
    pub language: Option<String>,
    /// Voice replacing the configured one
    pub voice: Option<String>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSource {
    /// Live synthesis
    Primary,
    /// Pre-recorded clip
    Fallback,
}

/// Playable audio handed to the caller
#[derive(Debug)]
pub struct SynthesizedAudio {
    path: PathBuf,
    sample_rate: u32,
    source: AudioSource,
    language: String,
    /// Set for synthesized clips, which are deleted on drop
    temp: Option<TempAudioFile>,
}

impl SynthesizedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn source(&self) -> AudioSource {
        self.source
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Write the clip to `dest`. Synthesized clips are moved, fallback
    /// assets copied.
    pub fn persist_to(self, dest: &Path) -> std::io::Result<PathBuf> {
        match self.temp {
            Some(temp) => temp.persist_to(dest),
            None => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(&self.path, dest)?;
                Ok(dest.to_path_buf())
            }
        }
    }
}

/// State of the fallback clip when a request failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackStatus {
    NotConfigured,
    Missing(PathBuf),
}

/// Total failure: no live audio and no fallback clip
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisFailure {
    pub language: String,
    pub error: EngineError,
    pub fallback: FallbackStatus,
}

impl std::fmt::Display for SynthesisFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "speech for '{}' failed: {}", self.language, self.error)?;
        match &self.fallback {
            FallbackStatus::NotConfigured => write!(f, " (no fallback configured)"),
            FallbackStatus::Missing(path) => {
                write!(f, " (fallback {} missing)", path.display())
            }
        }
    }
}

#[derive(Debug)]
pub enum SynthesisResult {
    Audio(SynthesizedAudio),
    Failure(SynthesisFailure),
}

impl SynthesisResult {
    pub fn audio(&self) -> Option<&SynthesizedAudio> {
        match self {
            SynthesisResult::Audio(audio) => Some(audio),
            SynthesisResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SynthesisFailure> {
        match self {
            SynthesisResult::Audio(_) => None,
            SynthesisResult::Failure(failure) => Some(failure),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.audio()
            .map(|a| a.source == AudioSource::Fallback)
            .unwrap_or(false)
    }

    pub fn into_audio(self) -> Result<SynthesizedAudio, SynthesisFailure> {
        match self {
            SynthesisResult::Audio(audio) => Ok(audio),
            SynthesisResult::Failure(failure) => Err(failure),
        }
    }
}

/// Language resolution, engine dispatch, repair and fallback
#[derive(Debug)]
pub struct SpeechPipeline {
    resolver: LanguageResolver,
    engines: EngineRegistry,
    assets_dir: PathBuf,
    default_sample_rate: u32,
}

impl SpeechPipeline {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            config,
            LanguageResolver::new(config),
            EngineRegistry::from_config(config),
        )
    }

    pub fn with_parts(config: &Config, resolver: LanguageResolver, engines: EngineRegistry) -> Self {
        Self {
            resolver,
            engines,
            assets_dir: PathBuf::from(&config.assets_dir),
            default_sample_rate: config.default_sample_rate,
        }
    }

    pub fn resolver(&self) -> &LanguageResolver {
        &self.resolver
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    /// Turn `request` into audio, with a single attempt at the engine
    pub async fn generate(&self, request: &SynthesisRequest) -> SynthesisResult {
        let resolved = self
            .resolver
            .resolve(&request.text, request.language.as_deref());
        let voice = request
            .voice
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(&resolved.config.voice);
        info!(
            "🗣️ Generating speech: lang={} engine={} voice={}",
            resolved.code, resolved.config.engine, voice
        );

        let error = match self.engines.get(&resolved.config.engine) {
            Ok(engine) => {
                let job = SynthesisJob {
                    text: &request.text,
                    voice,
                    language: &resolved.code,
                };
                match tts::synthesize_with_timeout(engine.as_ref(), &job).await {
                    Ok(file) if file.is_usable() => {
                        let sample_rate = self.finish(&file, engine.sample_rate());
                        return SynthesisResult::Audio(SynthesizedAudio {
                            path: file.path().to_path_buf(),
                            sample_rate,
                            source: AudioSource::Primary,
                            language: resolved.code,
                            temp: Some(file),
                        });
                    }
                    Ok(file) => EngineError::BadOutput(format!(
                        "{} produced an empty file at {}",
                        engine.name(),
                        file.path().display()
                    )),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        warn!(
            "⚠️ {} failed for '{}' ({}): {}",
            resolved.config.engine,
            resolved.code,
            error.kind(),
            error
        );
        self.fallback(resolved.code, resolved.config.fallback_asset.as_deref(), error)
    }

    /// Repair the header and read the real sample rate from it
    fn finish(&self, file: &TempAudioFile, nominal_rate: u32) -> u32 {
        // unparsable containers are still handed to playback
        if let Err(e) = wav::repair(file.path()) {
            warn!("⚠️ Could not repair {}: {}", file.path().display(), e);
        }
        wav::inspect(file.path())
            .map(|info| info.sample_rate)
            .unwrap_or(nominal_rate)
    }

    fn fallback(&self, language: String, asset: Option<&str>, error: EngineError) -> SynthesisResult {
        let fallback = match asset.filter(|a| !a.trim().is_empty()) {
            None => FallbackStatus::NotConfigured,
            Some(asset) => {
                let path = self.resolve_asset(asset);
                if path.is_file() {
                    info!("🔁 Using fallback audio: {}", path.display());
                    return SynthesisResult::Audio(SynthesizedAudio {
                        path,
                        sample_rate: self.default_sample_rate,
                        source: AudioSource::Fallback,
                        language,
                        temp: None,
                    });
                }
                FallbackStatus::Missing(path)
            }
        };

        let failure = SynthesisFailure {
            language,
            error,
            fallback,
        };
        error!("❌ {}", failure);
        SynthesisResult::Failure(failure)
    }

    fn resolve_asset(&self, asset: &str) -> PathBuf {
        let path = PathBuf::from(asset);
        if path.is_absolute() {
            path
        } else {
            self.assets_dir.join(path)
        }
    }
}

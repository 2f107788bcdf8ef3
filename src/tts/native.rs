//! In-process pocket-tts backend
//!
//! The model is expensive to load, so it is loaded on first use and kept for
//! the life of the engine. Concurrent first callers wait on the one load in
//! flight instead of starting their own. Generation state is not shareable,
//! so calls into the loaded model are serialized behind a mutex.

use super::{EngineKind, SynthesisJob, TempAudioFile, TtsEngine};
use crate::config::{Config, GenerationSettings};
use crate::error::EngineError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// How a generation call is conditioned on a speaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    Default,
    Preset(String),
    /// Reference recording of the target speaker
    Reference(PathBuf),
}

/// A loaded synthesis model
pub trait SpeechModel: Send {
    fn sample_rate(&self) -> u32;

    fn has_preset(&self, name: &str) -> bool;

    /// Generate mono samples in `[-1.0, 1.0]`
    fn generate(&mut self, text: &str, voice: &VoiceSelection) -> anyhow::Result<Vec<f32>>;
}

/// Builds a [`SpeechModel`]. Runs on the blocking pool.
pub trait ModelLoader: Send + Sync + std::fmt::Debug {
    fn load(
        &self,
        variant: &str,
        settings: &GenerationSettings,
    ) -> Result<Box<dyn SpeechModel>, EngineError>;
}

/// Loader used when no model runtime is linked into the build
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRuntimeLoader;

impl ModelLoader for NoRuntimeLoader {
    fn load(
        &self,
        variant: &str,
        _settings: &GenerationSettings,
    ) -> Result<Box<dyn SpeechModel>, EngineError> {
        Err(EngineError::Unavailable(format!(
            "no in-process runtime available for model variant '{}'",
            variant
        )))
    }
}

type SharedModel = Arc<Mutex<Box<dyn SpeechModel>>>;

pub struct NativeEngine {
    loader: Arc<dyn ModelLoader>,
    variant: String,
    generation: GenerationSettings,
    timeout: Duration,
    scratch_dir: PathBuf,
    model: OnceCell<SharedModel>,
}

impl std::fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEngine")
            .field("loader", &self.loader)
            .field("variant", &self.variant)
            .field("loaded", &self.model.initialized())
            .finish()
    }
}

impl NativeEngine {
    pub fn new(config: &Config, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            variant: config.native.variant.clone(),
            generation: config.generation.clone(),
            timeout: Duration::from_secs(config.native.timeout_secs),
            scratch_dir: config.scratch_path(),
            model: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// The loaded model, loading it on first use.
    ///
    /// A failed load is not cached; the next call tries again.
    async fn model(&self) -> Result<SharedModel, EngineError> {
        self.model
            .get_or_try_init(|| async {
                info!(
                    "⏳ Loading pocket-tts model {} on {} (this may take a moment on first run)...",
                    self.variant,
                    self.generation.device.as_str()
                );
                let loader = Arc::clone(&self.loader);
                let variant = self.variant.clone();
                let settings = self.generation.clone();
                let model = tokio::task::spawn_blocking(move || loader.load(&variant, &settings))
                    .await
                    .map_err(|e| {
                        EngineError::Unavailable(format!("model load task failed: {}", e))
                    })??;
                info!("✅ pocket-tts model loaded ({} Hz)", model.sample_rate());
                Ok::<_, EngineError>(Arc::new(Mutex::new(model)))
            })
            .await
            .cloned()
    }
}

/// Pick preset, reference recording, or the model default for `voice`
pub fn select_voice(model: &dyn SpeechModel, voice: &str) -> VoiceSelection {
    if voice.is_empty() {
        debug!("Using default pocket-tts voice");
        return VoiceSelection::Default;
    }
    if model.has_preset(voice) {
        debug!("Using predefined voice: {}", voice);
        return VoiceSelection::Preset(voice.to_string());
    }
    let path = Path::new(voice);
    if path.is_file() {
        debug!("Using custom voice from: {}", path.display());
        return VoiceSelection::Reference(path.to_path_buf());
    }
    warn!(
        "⚠️ Voice '{}' is not a preset or a file, using the default voice",
        voice
    );
    VoiceSelection::Default
}

/// Write mono float samples as 16-bit PCM
pub fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), EngineError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let to_err = |e: hound::Error| EngineError::BadOutput(format!("cannot write WAV: {}", e));

    let mut writer = hound::WavWriter::create(path, spec).map_err(to_err)?;
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).map_err(to_err)?;
    }
    writer.finalize().map_err(to_err)
}

#[async_trait]
impl TtsEngine for NativeEngine {
    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<TempAudioFile, EngineError> {
        let model = self.model().await?;
        let output = TempAudioFile::reserve(&self.scratch_dir)
            .map_err(|e| EngineError::Unavailable(format!("cannot create output file: {}", e)))?;

        let text = job.text.to_string();
        let voice = job.voice.to_string();

        info!("📢 pocket-tts (native) speaking: '{}'", job.text);
        // the file travels with the task so a result nobody awaits is dropped
        tokio::task::spawn_blocking(move || -> Result<TempAudioFile, EngineError> {
            let mut model = model
                .lock()
                .map_err(|e| EngineError::Unavailable(format!("model lock poisoned: {}", e)))?;
            let selection = select_voice(model.as_ref(), &voice);
            let samples = model
                .generate(&text, &selection)
                .map_err(|e| EngineError::ProcessFailed {
                    code: None,
                    stderr: e.to_string(),
                })?;
            if samples.is_empty() {
                return Err(EngineError::BadOutput("model generated no audio".to_string()));
            }
            write_pcm16(output.path(), &samples, model.sample_rate())?;
            Ok(output)
        })
        .await
        .map_err(|e| EngineError::Unavailable(format!("generation task failed: {}", e)))?
    }

    fn kind(&self) -> EngineKind {
        EngineKind::InProcess
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }
}

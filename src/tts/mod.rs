//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface over the synthesis backends: a local
//! pocket-tts process, an in-process model, a remote VibeVoice service and
//! the operating system's own speech engine.

use crate::config::Config;
use crate::error::EngineError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempPath;
use tracing::{debug, info, warn};

pub mod native;
#[cfg(feature = "native")]
pub mod native_runtime;
pub mod pocket;
pub mod remote;
pub mod system;

/// One synthesis call as seen by an engine
#[derive(Debug, Clone, Copy)]
pub struct SynthesisJob<'a> {
    pub text: &'a str,
    pub voice: &'a str,
    pub language: &'a str,
}

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Synthesize `job` into a fresh WAV file owned by the caller
    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<TempAudioFile, EngineError>;

    fn kind(&self) -> EngineKind;

    /// Wall-clock budget for one `synthesize` call
    fn timeout(&self) -> Duration;

    /// Nominal output rate, used when the produced header can't be read
    fn sample_rate(&self) -> u32;

    /// Get the engine name
    fn name(&self) -> &str {
        self.kind().id()
    }
}

/// Closed set of backend transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    LocalProcess,
    InProcess,
    Remote,
    System,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::LocalProcess,
        EngineKind::InProcess,
        EngineKind::Remote,
        EngineKind::System,
    ];

    /// Map a configured engine id to its kind
    pub fn from_id(id: &str) -> Result<Self, EngineError> {
        match id.trim().to_lowercase().as_str() {
            "pocket_tts" | "pocket-tts" | "local" => Ok(EngineKind::LocalProcess),
            "pocket_tts_native" | "native" => Ok(EngineKind::InProcess),
            "vibevoice" | "remote" => Ok(EngineKind::Remote),
            "system" | "os" => Ok(EngineKind::System),
            _ => Err(EngineError::UnknownEngine(id.to_string())),
        }
    }

    /// Canonical engine id
    pub fn id(&self) -> &'static str {
        match self {
            EngineKind::LocalProcess => "pocket_tts",
            EngineKind::InProcess => "pocket_tts_native",
            EngineKind::Remote => "vibevoice",
            EngineKind::System => "system",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A WAV file created by an engine.
///
/// The file is deleted when the handle is dropped unless it was kept or
/// persisted first.
#[derive(Debug)]
pub struct TempAudioFile {
    path: TempPath,
}

impl TempAudioFile {
    /// Reserve a new, empty `.wav` file in `dir`
    pub fn reserve(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = tempfile::Builder::new()
            .prefix("erika_")
            .suffix(".wav")
            .tempfile_in(dir)?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file exists and has content
    pub fn is_usable(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    /// Stop tracking the file and leave it where it is
    pub fn keep(self) -> std::io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }

    /// Move the file to `dest`, copying when a rename is not possible
    pub fn persist_to(self, dest: &Path) -> std::io::Result<PathBuf> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match self.path.persist(dest) {
            Ok(()) => Ok(dest.to_path_buf()),
            Err(e) => {
                debug!("Rename failed ({}), copying instead", e.error);
                std::fs::copy(&e.path, dest)?;
                Ok(dest.to_path_buf())
            }
        }
    }
}

/// Run `engine` under its own timeout
pub async fn synthesize_with_timeout(
    engine: &dyn TtsEngine,
    job: &SynthesisJob<'_>,
) -> Result<TempAudioFile, EngineError> {
    let budget = engine.timeout();
    match tokio::time::timeout(budget, engine.synthesize(job)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("⏱️ {} timed out after {:?}", engine.name(), budget);
            Err(EngineError::Timeout(budget))
        }
    }
}

/// Model loader for the in-process engine in this build
#[cfg(feature = "native")]
pub fn model_loader() -> Arc<dyn native::ModelLoader> {
    Arc::new(native_runtime::PocketModelLoader)
}

/// Model loader for the in-process engine in this build
#[cfg(not(feature = "native"))]
pub fn model_loader() -> Arc<dyn native::ModelLoader> {
    Arc::new(native::NoRuntimeLoader)
}

/// Engines keyed by kind, built once per process
#[derive(Debug, Default, Clone)]
pub struct EngineRegistry {
    engines: HashMap<EngineKind, Arc<dyn TtsEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every engine from the configuration
    pub fn from_config(config: &Config) -> Self {
        info!("🛠️ Creating TTS engines");
        let mut registry = Self::new();
        registry.register(Arc::new(pocket::PocketEngine::new(config)));
        registry.register(Arc::new(native::NativeEngine::new(
            config,
            model_loader(),
        )));
        registry.register(Arc::new(remote::RemoteEngine::new(config)));
        registry.register(Arc::new(system::SystemEngine::new(config)));
        registry
    }

    /// Add an engine, replacing any engine of the same kind
    pub fn register(&mut self, engine: Arc<dyn TtsEngine>) {
        debug!("  - Registered {} ({:?})", engine.name(), engine.kind());
        self.engines.insert(engine.kind(), engine);
    }

    pub fn with_engine(mut self, engine: Arc<dyn TtsEngine>) -> Self {
        self.register(engine);
        self
    }

    /// Look up the engine bound to a configured id
    pub fn get(&self, id: &str) -> Result<Arc<dyn TtsEngine>, EngineError> {
        let kind = EngineKind::from_id(id)?;
        self.engines.get(&kind).cloned().ok_or_else(|| {
            EngineError::Unavailable(format!("engine '{}' is not registered", kind))
        })
    }
}

use crate::error::ErikaResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Engine, voice and fallback asset used for one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub engine: String,
    pub voice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_asset: Option<String>,
}

impl LanguageConfig {
    pub fn new(engine: &str, voice: &str) -> Self {
        Self {
            engine: engine.to_string(),
            voice: voice.to_string(),
            fallback_asset: None,
        }
    }

    pub fn with_fallback(mut self, asset: &str) -> Self {
        self.fallback_asset = Some(asset.to_string());
        self
    }
}

/// Compute device for model inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

/// Generation parameters shared by the pocket-tts engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub lsd_decode_steps: u32,
    pub noise_clamp: Option<f32>,
    pub eos_threshold: f32,
    pub frames_after_eos: Option<u32>,
    pub device: Device,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            lsd_decode_steps: 1,
            noise_clamp: None,
            eos_threshold: -4.0,
            frames_after_eos: None,
            device: Device::Cpu,
        }
    }
}

impl GenerationSettings {
    /// Non-null settings as `--kebab-case value` command-line pairs
    pub fn to_cli_args(&self) -> Vec<String> {
        let pairs = [
            ("temperature", Some(self.temperature.to_string())),
            ("lsd_decode_steps", Some(self.lsd_decode_steps.to_string())),
            ("noise_clamp", self.noise_clamp.map(|v| v.to_string())),
            ("eos_threshold", Some(self.eos_threshold.to_string())),
            ("frames_after_eos", self.frames_after_eos.map(|v| v.to_string())),
            ("device", Some(self.device.as_str().to_string())),
        ];

        let mut args = Vec::new();
        for (name, value) in pairs {
            if let Some(value) = value {
                args.push(format!("--{}", name.replace('_', "-")));
                args.push(value);
            }
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PocketSettings {
    pub program: String,
    pub timeout_secs: u64,
}

impl Default for PocketSettings {
    fn default() -> Self {
        Self {
            program: "pocket-tts".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeSettings {
    pub variant: String,
    pub timeout_secs: u64,
}

impl Default for NativeSettings {
    fn default() -> Self {
        Self {
            variant: "b6369a24".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5050".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    /// Override for the platform speech program
    pub program: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            program: None,
            timeout_secs: 30,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Languages
    pub default_language: String,
    pub secondary_language: String,
    pub languages: HashMap<String, LanguageConfig>,

    // Output
    pub default_voice: String,
    pub output_dir: String,
    pub max_audio_files: usize,
    pub default_sample_rate: u32,
    pub assets_dir: String,
    /// Where engines put freshly synthesized clips
    pub scratch_dir: String,

    // Engines
    pub generation: GenerationSettings,
    pub pocket: PocketSettings,
    pub native: NativeSettings,
    pub remote: RemoteSettings,
    pub system: SystemSettings,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            secondary_language: "nl".to_string(),
            languages: HashMap::from([
                (
                    "en".to_string(),
                    LanguageConfig::new("pocket_tts", "azelma"),
                ),
                (
                    "nl".to_string(),
                    LanguageConfig::new("vibevoice", "nl-Spk1_woman"),
                ),
            ]),
            default_voice: "azelma".to_string(),
            output_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("erika/output")
                .to_string_lossy()
                .to_string(),
            max_audio_files: 5,
            default_sample_rate: 24_000,
            assets_dir: dirs::data_dir()
                .unwrap_or_default()
                .join("erika/assets")
                .to_string_lossy()
                .to_string(),
            scratch_dir: std::env::temp_dir()
                .join("erika")
                .to_string_lossy()
                .to_string(),
            generation: GenerationSettings::default(),
            pocket: PocketSettings::default(),
            native: NativeSettings::default(),
            remote: RemoteSettings::default(),
            system: SystemSettings::default(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or fall back to defaults
    pub fn load() -> ErikaResult<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from `path`.
    ///
    /// A missing file yields the defaults. A file that does not parse is moved
    /// aside to `*.json.corrupt` and the defaults are used instead.
    pub fn load_from(path: &Path) -> ErikaResult<Self> {
        if !path.exists() {
            info!("📄 No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("⚠️ Could not read config {}, using defaults: {}", path.display(), e);
                return Ok(Self::default());
            }
        };
        let config = match serde_json::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Self::default()
            }
        };
        Ok(config.normalized())
    }

    /// Save config to the default location
    pub fn save(&self) -> ErikaResult<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> ErikaResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Guarantee the language table has an entry for `default_language`
    pub fn normalized(mut self) -> Self {
        if self.default_language.trim().is_empty() {
            warn!("⚠️ Empty default_language, using 'en'");
            self.default_language = "en".to_string();
        }
        if !self.languages.contains_key(&self.default_language) {
            warn!(
                "⚠️ No language entry for default '{}', inserting built-in entry",
                self.default_language
            );
            self.languages.insert(
                self.default_language.clone(),
                LanguageConfig::new("pocket_tts", &self.default_voice),
            );
        }
        self
    }

    /// The entry for `default_language`
    pub fn default_entry(&self) -> LanguageConfig {
        self.languages
            .get(&self.default_language)
            .cloned()
            .unwrap_or_else(|| LanguageConfig::new("pocket_tts", "azelma"))
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn scratch_path(&self) -> PathBuf {
        PathBuf::from(&self.scratch_dir)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("erika")
        .join("config.json")
}

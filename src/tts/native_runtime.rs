//! pocket-tts model runtime for the in-process engine (`native` feature)

use super::native::{ModelLoader, SpeechModel, VoiceSelection};
use crate::config::{Device, GenerationSettings};
use crate::error::EngineError;
use crate::voices;
use anyhow::Context;
use pocket_tts::{ModelState, TTSModel};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Speaker used for [`VoiceSelection::Default`]
pub const DEFAULT_PRESET: &str = "alba";

/// Hugging Face location of a preset's speaker embedding
pub fn preset_hf_path(name: &str) -> String {
    format!(
        "hf://kyutai/pocket-tts-without-voice-cloning/embeddings/{}.safetensors",
        name
    )
}

/// Map the configured device, dropping to CPU when it can't be opened
pub fn candle_device(device: Device) -> candle_core::Device {
    match device {
        Device::Cpu => candle_core::Device::Cpu,
        Device::Cuda => candle_core::Device::new_cuda(0).unwrap_or_else(|e| {
            warn!("⚠️ CUDA unavailable ({}), running pocket-tts on CPU", e);
            candle_core::Device::Cpu
        }),
    }
}

/// Flatten generated audio of any shape into mono `f32` samples
pub fn tensor_to_samples(tensor: &candle_core::Tensor) -> anyhow::Result<Vec<f32>> {
    let samples = tensor
        .to_dtype(candle_core::DType::F32)?
        .flatten_all()?
        .to_vec1::<f32>()?;
    Ok(samples)
}

/// Loads pocket-tts weights through the `pocket-tts` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct PocketModelLoader;

impl ModelLoader for PocketModelLoader {
    fn load(
        &self,
        variant: &str,
        settings: &GenerationSettings,
    ) -> Result<Box<dyn SpeechModel>, EngineError> {
        if settings.frames_after_eos.is_some() {
            debug!("frames_after_eos is not used by the in-process runtime");
        }
        let device = candle_device(settings.device);
        let model = TTSModel::load_with_params_device(
            variant,
            settings.temperature,
            settings.lsd_decode_steps as usize,
            settings.eos_threshold,
            settings.noise_clamp,
            &device,
        )
        .map_err(|e| {
            EngineError::Unavailable(format!("cannot load pocket-tts model '{}': {}", variant, e))
        })?;

        Ok(Box::new(PocketModel {
            model,
            voices: HashMap::new(),
        }))
    }
}

/// A loaded pocket-tts model with its speaker states
pub struct PocketModel {
    model: TTSModel,
    /// Speaker states keyed by preset name or reference path
    voices: HashMap<String, ModelState>,
}

impl PocketModel {
    fn voice_state(&mut self, voice: &VoiceSelection) -> anyhow::Result<ModelState> {
        let key = match voice {
            VoiceSelection::Default => DEFAULT_PRESET.to_string(),
            VoiceSelection::Preset(name) => name.clone(),
            VoiceSelection::Reference(path) => path.to_string_lossy().to_string(),
        };
        if let Some(state) = self.voices.get(&key) {
            return Ok(state.clone());
        }

        let state = match voice {
            VoiceSelection::Reference(path) => self.reference_state(path)?,
            _ => {
                let hf_path = preset_hf_path(&key);
                let local = pocket_tts::weights::download_if_necessary(&hf_path)
                    .with_context(|| format!("cannot fetch voice '{}'", key))?;
                self.model
                    .get_voice_state_from_prompt_file(&local)
                    .with_context(|| format!("cannot load voice '{}'", key))?
            }
        };
        info!("🎤 Voice '{}' ready", key);
        self.voices.insert(key, state.clone());
        Ok(state)
    }

    /// Precomputed embeddings load directly; recordings go through the encoder
    fn reference_state(&self, path: &Path) -> anyhow::Result<ModelState> {
        let is_embedding = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("safetensors"))
            .unwrap_or(false);
        let state = if is_embedding {
            self.model.get_voice_state_from_prompt_file(path)
        } else {
            self.model.get_voice_state(path)
        };
        state.with_context(|| format!("cannot clone voice from {}", path.display()))
    }
}

impl SpeechModel for PocketModel {
    fn sample_rate(&self) -> u32 {
        self.model.sample_rate as u32
    }

    fn has_preset(&self, name: &str) -> bool {
        voices::is_pocket_preset(name)
    }

    fn generate(&mut self, text: &str, voice: &VoiceSelection) -> anyhow::Result<Vec<f32>> {
        let state = self.voice_state(voice)?;
        let audio = self
            .model
            .generate(text, &state)
            .context("pocket-tts generation failed")?;
        tensor_to_samples(&audio)
    }
}

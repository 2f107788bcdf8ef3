//! Erika Library
//!
//! Text-to-speech dispatch: language resolution, engine adapters, WAV header
//! repair and fallback audio.

pub mod config;
pub mod error;
pub mod language;
pub mod output;
pub mod pipeline;
pub mod playback;
pub mod tts;
pub mod voices;
pub mod wav;

pub use error::{EngineError, ErikaError, ErikaResult};
pub use pipeline::{AudioSource, SpeechPipeline, SynthesisRequest, SynthesisResult};

//! VibeVoice backend reached over HTTP
//!
//! `POST {base_url}/generate` with `{text, lang, voice}` returns WAV bytes;
//! `GET {base_url}/status` reports whether the service is ready.

use super::{EngineKind, SynthesisJob, TempAudioFile, TtsEngine};
use crate::config::Config;
use crate::error::EngineError;
use crate::voices;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Budget for `GET /status`
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Health report from `GET /status`
#[derive(Debug, Clone, Deserialize)]
pub struct EngineStatus {
    pub status: String,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self.status.as_str(), "ready" | "ok" | "online")
    }
}

#[derive(Debug, Clone)]
pub struct RemoteEngine {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    scratch_dir: PathBuf,
}

impl RemoteEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.remote.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.remote.timeout_secs),
            scratch_dir: config.scratch_path(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the service whether it is ready
    pub async fn health(&self) -> Result<EngineStatus, EngineError> {
        let response = self
            .client
            .get(format!("{}/status", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, HEALTH_TIMEOUT))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Unavailable(format!(
                "status endpoint returned {}",
                status
            )));
        }
        response
            .json::<EngineStatus>()
            .await
            .map_err(|e| EngineError::BadOutput(format!("invalid status response: {}", e)))
    }

    /// `budget` is the limit the failed request ran under
    fn map_transport_error(&self, e: reqwest::Error, budget: Duration) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout(budget)
        } else {
            EngineError::Unavailable(format!("cannot reach {}: {}", self.base_url, e))
        }
    }
}

#[async_trait]
impl TtsEngine for RemoteEngine {
    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<TempAudioFile, EngineError> {
        let voice = if job.voice.is_empty() {
            voices::default_vibevoice_voice(job.language)
        } else {
            job.voice
        };
        info!(
            "📢 VibeVoice speaking: '{}' (lang: {}, voice: {})",
            job.text, job.language, voice
        );

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&serde_json::json!({
                "text": job.text,
                "lang": job.language,
                "voice": voice,
            }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("❌ VibeVoice API Error ({}): {}", status, body);
            return Err(EngineError::Unavailable(format!(
                "server returned {}: {}",
                status,
                body.trim()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e, self.timeout))?;
        if bytes.is_empty() {
            return Err(EngineError::BadOutput(
                "server returned an empty body".to_string(),
            ));
        }
        debug!("VibeVoice returned {} bytes", bytes.len());

        let output = TempAudioFile::reserve(&self.scratch_dir)
            .map_err(|e| EngineError::Unavailable(format!("cannot create output file: {}", e)))?;
        tokio::fs::write(output.path(), &bytes)
            .await
            .map_err(|e| EngineError::BadOutput(format!("cannot write audio: {}", e)))?;

        Ok(output)
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Remote
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn sample_rate(&self) -> u32 {
        24_000
    }
}

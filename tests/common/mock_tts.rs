//! Mock TTS Engine for Testing
//!
//! Records every job it receives and answers with a scripted behavior.

use async_trait::async_trait;
use erika::error::EngineError;
use erika::tts::{EngineKind, SynthesisJob, TempAudioFile, TtsEngine};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock does when asked to synthesize
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Write a valid clip at this sample rate
    Succeed(u32),
    /// Write a clip whose header carries the streaming placeholder
    Placeholder { sample_rate: u32, payload_bytes: usize },
    /// Return the file untouched, zero bytes long
    Empty,
    Fail(EngineError),
    /// Sleep past any sensible timeout
    Stall,
}

/// A job as the mock saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedJob {
    pub text: String,
    pub voice: String,
    pub language: String,
}

#[derive(Debug)]
pub struct MockTts {
    kind: EngineKind,
    behavior: MockBehavior,
    timeout: Duration,
    scratch_dir: PathBuf,
    /// All jobs that were received
    pub jobs: Arc<Mutex<Vec<RecordedJob>>>,
}

impl MockTts {
    pub fn new(kind: EngineKind, behavior: MockBehavior, scratch_dir: PathBuf) -> Self {
        Self {
            kind,
            behavior,
            timeout: Duration::from_secs(5),
            scratch_dir,
            jobs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get all received jobs
    pub fn get_jobs(&self) -> Vec<RecordedJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TtsEngine for MockTts {
    async fn synthesize(&self, job: &SynthesisJob<'_>) -> Result<TempAudioFile, EngineError> {
        self.jobs.lock().unwrap().push(RecordedJob {
            text: job.text.to_string(),
            voice: job.voice.to_string(),
            language: job.language.to_string(),
        });

        let file = TempAudioFile::reserve(&self.scratch_dir)
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;
        match &self.behavior {
            MockBehavior::Succeed(rate) => super::write_wav(file.path(), *rate, *rate / 10),
            MockBehavior::Placeholder {
                sample_rate,
                payload_bytes,
            } => std::fs::write(
                file.path(),
                super::placeholder_wav(*sample_rate, *payload_bytes),
            )
            .unwrap(),
            MockBehavior::Empty => {}
            MockBehavior::Fail(e) => return Err(e.clone()),
            MockBehavior::Stall => tokio::time::sleep(Duration::from_secs(3600)).await,
        }
        Ok(file)
    }

    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }
}

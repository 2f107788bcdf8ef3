//! Erika Error Types
//!
//! Centralized error handling for the synthesis core.

use std::time::Duration;
use thiserror::Error;

/// Central error type for Erika
#[derive(Error, Debug)]
pub enum ErikaError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Erika operations
pub type ErikaResult<T> = Result<T, ErikaError>;

/// Failure of a single synthesis backend call.
///
/// Every variant is recoverable from the pipeline's point of view: it is
/// turned into a fallback attempt, never propagated as a crash.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Backend unreachable, not installed, or refused the request
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// Synthesis process exited unsuccessfully
    #[error("engine process failed (exit code {code:?}): {stderr}")]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("engine timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    /// Backend reported success but produced nothing usable
    #[error("engine produced no usable audio: {0}")]
    BadOutput(String),

    /// Configuration names an engine id with no adapter
    #[error("unknown engine '{0}'")]
    UnknownEngine(String),
}

impl EngineError {
    /// Short machine-friendly tag, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Unavailable(_) => "unavailable",
            EngineError::ProcessFailed { .. } => "process_failed",
            EngineError::Timeout(_) => "timeout",
            EngineError::BadOutput(_) => "bad_output",
            EngineError::UnknownEngine(_) => "unknown_engine",
        }
    }
}

/// A WAV file that could not be read as a container at all.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("not a RIFF/WAVE file")]
    NotWave,

    #[error("missing '{0}' chunk")]
    MissingChunk(&'static str),

    #[error("invalid format chunk: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

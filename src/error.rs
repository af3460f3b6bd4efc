//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// The model output tensor did not have the `[1, 5, N]` layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected output tensor shape: expected {expected}, got {got:?}")]
    ShapeMismatch {
        expected: &'static str,
        got: Vec<usize>,
    },
}

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures raised by the bundled inference adapters.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("invalid input dimensions: expected {expected:?}, got {got:?}")]
    InvalidInputDimensions {
        expected: (u32, u32, u32),
        got: (u32, u32, u32),
    },

    #[error("preprocessing error: {0}")]
    Preprocessing(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("postprocessing error: {0}")]
    Postprocessing(String),
}

/// The tracking worker could not be started.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn tracking thread: {0}")]
    Spawn(#[from] std::io::Error),
}

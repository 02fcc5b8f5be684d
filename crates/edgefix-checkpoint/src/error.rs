//! Checkpoint error types.

use thiserror::Error;

/// Errors produced while loading, normalizing or saving a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint not found: {path}")]
    NotFound { path: String },

    #[error("output path must differ from input path: {path}")]
    SamePath { path: String },

    /// Every reader in the fallback chain failed. `attempts` lists each
    /// strategy with the error it produced.
    #[error("no load strategy could read {path}: {attempts}")]
    LoadFailed { path: String, attempts: String },

    #[error("unsupported tensor dtype {dtype} for entry `{name}`")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    #[error(transparent)]
    Format(#[from] safetensors::SafeTensorError),

    #[error(transparent)]
    Stamp(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, CheckpointError>;

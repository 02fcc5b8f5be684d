//! Patch-engine error types.

use thiserror::Error;

/// Errors produced by the patch engine.
///
/// A missing target file is not an error — it is reported as
/// [`crate::FileStatus::Missing`] so a multi-file run can continue with the
/// remaining targets.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("workspace root does not contain a `{expected}` directory: {root}")]
    WorkspaceMissing { root: String, expected: &'static str },

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, PatchError>;

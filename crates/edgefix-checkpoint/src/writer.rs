//! Safetensors persistence for checkpoints.

use crate::error::{CheckpointError, Result};
use crate::model::{Checkpoint, Value};
use std::collections::HashMap;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Serialize a checkpoint to a safetensors file.
///
/// Tensor entries go into the tensor table in checkpoint order; opaque
/// entries ride in the `__metadata__` string map. The file is written
/// through a temp file in the destination directory and renamed into place,
/// so an interrupted run never leaves a truncated artifact behind.
pub fn save_checkpoint(ckpt: &Checkpoint, path: &Path) -> Result<()> {
    let mut tensors = Vec::with_capacity(ckpt.tensor_count());
    let mut extra: HashMap<String, String> = HashMap::new();
    for (name, value) in ckpt.entries() {
        match value {
            Value::Tensor(t) => tensors.push((name.as_str(), t)),
            Value::Opaque(s) => {
                extra.insert(name.clone(), s.clone());
            }
        }
    }
    let metadata = if extra.is_empty() { None } else { Some(extra) };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir)?;
    safetensors::serialize_to_file(tensors, &metadata, tmp.path())?;
    tmp.persist(path).map_err(|e| CheckpointError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;

    debug!(
        "wrote {} ({} tensors, {} opaque entries)",
        path.display(),
        ckpt.tensor_count(),
        ckpt.opaque_count()
    );
    Ok(())
}

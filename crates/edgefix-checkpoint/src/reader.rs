//! Fallback reader chain for checkpoint artifacts.
//!
//! Readers are tried in registration order, strictest format first. Each
//! failure is captured; the combined list is surfaced only when every
//! reader fails, so a legacy artifact quietly falls through to the reader
//! that understands it.

use crate::error::{CheckpointError, Result};
use crate::model::Checkpoint;
use candle_core::{DType, Device, Tensor};
use safetensors::SafeTensors;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One load strategy.
pub trait CheckpointReader: Send + Sync {
    fn name(&self) -> &'static str;
    fn read(&self, path: &Path, device: &Device) -> Result<Checkpoint>;
}

/// Strict reader for safetensors files.
///
/// Tensor entries are restored in serialization order (ascending data
/// offset); opaque entries from the `__metadata__` map follow, sorted by
/// key since the map itself is unordered.
struct SafeTensorsReader;

impl CheckpointReader for SafeTensorsReader {
    fn name(&self) -> &'static str {
        "safetensors"
    }

    fn read(&self, path: &Path, device: &Device) -> Result<Checkpoint> {
        let bytes = fs::read(path)?;
        let (_, header) = SafeTensors::read_metadata(&bytes)?;

        let mut names: Vec<(String, usize)> = header
            .tensors()
            .iter()
            .map(|(name, info)| (name.clone(), info.data_offsets.0))
            .collect();
        names.sort_by_key(|(_, offset)| *offset);

        let st = SafeTensors::deserialize(&bytes)?;
        let mut ckpt = Checkpoint::new();
        for (name, _) in names {
            let view = st.tensor(&name)?;
            let dtype = dtype_from_st(&name, view.dtype())?;
            let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)?;
            ckpt.push_tensor(name, tensor);
        }

        if let Some(meta) = header.metadata() {
            let mut extra: Vec<(&String, &String)> = meta.iter().collect();
            extra.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in extra {
                ckpt.push_opaque(key.clone(), value.clone());
            }
        }

        Ok(ckpt)
    }
}

/// Relaxed reader for legacy PyTorch pickle archives (`.pth`/`.pt`).
///
/// The pickle machinery materializes on the host; tensors are moved onward
/// only when a non-host device was requested.
struct PickleReader;

impl CheckpointReader for PickleReader {
    fn name(&self) -> &'static str {
        "pytorch-pickle"
    }

    fn read(&self, path: &Path, device: &Device) -> Result<Checkpoint> {
        let mut ckpt = Checkpoint::new();
        for (name, tensor) in candle_core::pickle::read_all(path)? {
            let tensor = if matches!(device, Device::Cpu) {
                tensor
            } else {
                tensor.to_device(device)?
            };
            ckpt.push_tensor(name, tensor);
        }
        Ok(ckpt)
    }
}

/// Last-resort reader for NumPy NPZ archives.
struct NpzReader;

impl CheckpointReader for NpzReader {
    fn name(&self) -> &'static str {
        "npz"
    }

    fn read(&self, path: &Path, device: &Device) -> Result<Checkpoint> {
        let mut ckpt = Checkpoint::new();
        for (name, tensor) in Tensor::read_npz(path)? {
            let tensor = if matches!(device, Device::Cpu) {
                tensor
            } else {
                tensor.to_device(device)?
            };
            ckpt.push_tensor(name, tensor);
        }
        Ok(ckpt)
    }
}

fn default_readers() -> Vec<Box<dyn CheckpointReader>> {
    vec![
        Box::new(SafeTensorsReader),
        Box::new(PickleReader),
        Box::new(NpzReader),
    ]
}

/// Load a checkpoint onto the host.
///
/// Returns the checkpoint and the name of the reader that succeeded.
pub fn load_checkpoint(path: &Path) -> Result<(Checkpoint, &'static str)> {
    load_checkpoint_on(path, &Device::Cpu)
}

/// Load a checkpoint onto `device`, trying each reader in order.
pub fn load_checkpoint_on(path: &Path, device: &Device) -> Result<(Checkpoint, &'static str)> {
    if !path.exists() {
        return Err(CheckpointError::NotFound {
            path: path.display().to_string(),
        });
    }

    let mut attempts = Vec::new();
    for reader in default_readers() {
        match reader.read(path, device) {
            Ok(ckpt) => {
                info!(
                    "loaded {} via {} ({} tensors, {} opaque entries)",
                    path.display(),
                    reader.name(),
                    ckpt.tensor_count(),
                    ckpt.opaque_count()
                );
                return Ok((ckpt, reader.name()));
            }
            Err(err) => {
                debug!("{} reader failed on {}: {err}", reader.name(), path.display());
                attempts.push(format!("{}: {err}", reader.name()));
            }
        }
    }

    Err(CheckpointError::LoadFailed {
        path: path.display().to_string(),
        attempts: attempts.join("; "),
    })
}

fn dtype_from_st(name: &str, dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype;
    let mapped = match dtype {
        Dtype::U8 => DType::U8,
        Dtype::U32 => DType::U32,
        Dtype::I64 => DType::I64,
        Dtype::BF16 => DType::BF16,
        Dtype::F16 => DType::F16,
        Dtype::F32 => DType::F32,
        Dtype::F64 => DType::F64,
        other => {
            return Err(CheckpointError::UnsupportedDtype {
                name: name.to_string(),
                dtype: format!("{other:?}"),
            })
        }
    };
    Ok(mapped)
}

//! The one-shot normalization pipeline: load, relocate to host, persist,
//! stamp.

use crate::error::{CheckpointError, Result};
use crate::reader::load_checkpoint;
use crate::writer::save_checkpoint;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

/// Summary of one normalization run.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizeReport {
    pub source: String,
    pub dest: String,
    /// Name of the reader that understood the source artifact.
    pub strategy: String,
    pub tensors: usize,
    pub opaque: usize,
    /// SHA-256 of the written output bytes.
    pub sha256: String,
}

#[derive(Serialize)]
struct Stamp<'a> {
    timestamp: String,
    version: &'static str,
    source: &'a str,
    strategy: &'a str,
    tensors: usize,
    opaque: usize,
    sha256: &'a str,
}

/// Load `src`, relocate every tensor to host memory, and write the result
/// to `dest` as safetensors, plus a `<dest>.meta.json` sidecar stamp.
///
/// Fails when no reader understands the source (all strategy errors are
/// carried in the error) and refuses to overwrite the input in place.
pub fn normalize_checkpoint(src: &Path, dest: &Path) -> Result<NormalizeReport> {
    if src == dest {
        return Err(CheckpointError::SamePath {
            path: src.display().to_string(),
        });
    }

    let (ckpt, strategy) = load_checkpoint(src)?;
    let host = ckpt.to_host()?;
    save_checkpoint(&host, dest)?;

    let out = fs::read(dest)?;
    let sha256 = format!("{:x}", Sha256::digest(&out));
    info!("normalized {} -> {}", src.display(), dest.display());
    info!("output checksum: {sha256}");

    let report = NormalizeReport {
        source: src.display().to_string(),
        dest: dest.display().to_string(),
        strategy: strategy.to_string(),
        tensors: host.tensor_count(),
        opaque: host.opaque_count(),
        sha256,
    };
    write_stamp(dest, &report)?;
    Ok(report)
}

/// Sidecar stamp with conversion details, next to the output file.
fn write_stamp(dest: &Path, report: &NormalizeReport) -> Result<()> {
    let stamp = Stamp {
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        source: &report.source,
        strategy: &report.strategy,
        tensors: report.tensors,
        opaque: report.opaque,
        sha256: &report.sha256,
    };
    let stamp_path = format!("{}.meta.json", dest.display());
    let json = serde_json::to_string_pretty(&stamp)?;
    fs::write(stamp_path, json)?;
    Ok(())
}

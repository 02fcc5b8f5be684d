//! `edgefix normalize` — relocate a checkpoint's tensors to host memory.

use anyhow::{Context, Result};
use clap::Args;
use edgefix_checkpoint::normalize_checkpoint;
use std::path::PathBuf;

/// Normalize command arguments
#[derive(Args)]
pub struct NormalizeCommand {
    /// Input checkpoint (safetensors, PyTorch pickle archive, or NPZ)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output safetensors path (must differ from the input)
    #[arg(short, long)]
    pub output: PathBuf,
}

impl NormalizeCommand {
    pub fn execute(&self) -> Result<()> {
        let report = normalize_checkpoint(&self.input, &self.output)
            .with_context(|| format!("failed to normalize {}", self.input.display()))?;

        println!("✅ Checkpoint normalized");
        println!("  Source:   {} (read as {})", report.source, report.strategy);
        println!("  Output:   {}", report.dest);
        println!("  Tensors:  {} ({} opaque entries)", report.tensors, report.opaque);
        println!("  SHA-256:  {}", report.sha256);
        println!("  Metadata: {}.meta.json", report.dest);
        Ok(())
    }
}

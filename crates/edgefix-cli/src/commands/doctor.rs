//! `edgefix doctor` — diagnose a checkout without touching it.

use anyhow::{Context, Result};
use clap::Args;
use edgefix_patch::{apply_targets, catalog, ApplyMode};

/// Doctor command arguments
#[derive(Args)]
pub struct DoctorCommand {
    /// Checkout root (must contain a `yolact_edge` directory)
    #[arg(long, default_value = ".")]
    pub root: std::path::PathBuf,

    /// Include the rewrite-nms target in the diagnosis
    #[arg(long)]
    pub rewrite_nms: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl DoctorCommand {
    /// Returns true when the checkout is clean.
    pub fn execute(&self) -> Result<bool> {
        catalog::ensure_workspace(&self.root)
            .context("run this from the directory containing the cloned checkout")?;

        let targets = catalog::targets(self.rewrite_nms);
        let run = apply_targets(&self.root, &targets, ApplyMode::DryRun)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&run)?);
        } else {
            super::fix::print_run(&run, true);
        }

        Ok(run.is_clean())
    }
}

//! `edgefix fix` — apply the built-in fix catalog.

use anyhow::{Context, Result};
use clap::Args;
use edgefix_patch::{apply_targets, catalog, ApplyMode, FileStatus, RunReport};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Fix command arguments
#[derive(Args)]
pub struct FixCommand {
    /// Checkout root (must contain a `yolact_edge` directory)
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Replace cython_nms.pyx wholesale with the known-good kernel source
    /// instead of patching it incrementally
    #[arg(long)]
    pub rewrite_nms: bool,

    /// Report what would change without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Write the run report as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunStamp<'a> {
    timestamp: String,
    version: &'static str,
    dry_run: bool,
    #[serde(flatten)]
    report: &'a RunReport,
}

impl FixCommand {
    pub fn execute(&self) -> Result<()> {
        catalog::ensure_workspace(&self.root)
            .context("run this from the directory containing the cloned checkout")?;

        let mode = if self.dry_run {
            ApplyMode::DryRun
        } else {
            ApplyMode::Apply
        };
        let targets = catalog::targets(self.rewrite_nms);
        let run = apply_targets(&self.root, &targets, mode)?;

        print_run(&run, self.dry_run);

        if let Some(path) = &self.report {
            let stamp = RunStamp {
                timestamp: chrono::Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION"),
                dry_run: self.dry_run,
                report: &run,
            };
            let json = serde_json::to_string_pretty(&stamp)?;
            fs::write(path, json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            println!("Report written to {}", path.display());
        }

        Ok(())
    }
}

pub(crate) fn print_run(run: &RunReport, dry_run: bool) {
    for file in &run.files {
        match file.status {
            FileStatus::Missing => println!("⚠️  {} — missing, skipped", file.path),
            FileStatus::Failed => println!(
                "❌ {} — {}",
                file.path,
                file.error.as_deref().unwrap_or("failed")
            ),
            _ => {
                println!("{}:", file.path);
                for rule in &file.rules {
                    println!("  - {}: {}", rule.rule, rule.outcome);
                }
            }
        }
    }

    let applied = run.applied();
    if dry_run {
        if applied == 0 {
            println!("\n✅ Checkout is clean, nothing to do");
        } else {
            println!("\n{applied} fix(es) pending — run without --dry-run to apply");
        }
    } else if applied == 0 {
        println!("\n✅ Checkout already fixed, nothing to do");
    } else {
        println!("\n✅ Applied {applied} fix(es)");
    }
    if run.missing() > 0 {
        println!("⚠️  {} target file(s) missing from the checkout", run.missing());
    }
}

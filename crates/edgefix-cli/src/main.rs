//! edgefix CLI
//!
//! Maintenance toolkit for a cloned `yolact_edge` checkout: applies the
//! built-in source fixes and normalizes trained checkpoints to host memory.
//!
//! ```bash
//! # Apply every known fix in place
//! edgefix fix --root .
//!
//! # Report what a run would do, without writing
//! edgefix doctor --root .
//!
//! # Move every tensor in a checkpoint to host memory
//! edgefix normalize --input weights/resnet50.pth --output weights/resnet50-fixed.safetensors
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{DoctorCommand, FixCommand, NormalizeCommand};

/// Maintenance toolkit for a yolact_edge checkout
#[derive(Parser)]
#[command(name = "edgefix")]
#[command(about = "Apply source fixes and normalize checkpoints for yolact_edge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the built-in fix catalog to the checkout
    Fix(FixCommand),
    /// Diagnose the checkout without modifying it
    Doctor(DoctorCommand),
    /// Rewrite a checkpoint with every tensor in host memory
    Normalize(NormalizeCommand),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fix(cmd) => cmd.execute(),
        Commands::Doctor(cmd) => {
            let clean = cmd.execute()?;
            if !clean {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Normalize(cmd) => cmd.execute(),
    }
}

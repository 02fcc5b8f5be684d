//! Idempotent text patching for a vendored `yolact_edge` checkout.
//!
//! A patch run is driven by data, not code: each [`FileTarget`] names a file
//! (relative to the checkout root) and carries an ordered list of
//! [`PatchRule`]s. Rules are literal substring edits — the target files are
//! not owned by this project and their exact syntax varies by clone, so
//! substring matching is the most version-tolerant mechanism available
//! without a real parser. Every rule is safe to apply any number of times;
//! the second application is always a no-op.
//!
//! Per rule the engine reports one of three outcomes:
//! - [`RuleOutcome::Applied`] — the trigger text was found and substituted
//! - [`RuleOutcome::AlreadyApplied`] — the applied marker (or the
//!   replacement text itself) is already present
//! - [`RuleOutcome::NotFound`] — neither trigger nor replacement is present;
//!   the upstream file has drifted
//!
//! # Example
//!
//! ```no_run
//! use edgefix_patch::{apply_targets, catalog, ApplyMode};
//!
//! let root = std::path::Path::new(".");
//! catalog::ensure_workspace(root).unwrap();
//! let report = apply_targets(root, &catalog::targets(false), ApplyMode::Apply).unwrap();
//! for file in &report.files {
//!     println!("{}: {:?}", file.path, file.status);
//! }
//! ```

pub mod catalog;
mod engine;
mod error;
mod report;
mod rule;

pub use engine::{apply_file_target, apply_targets, ApplyMode};
pub use error::{PatchError, Result};
pub use report::{FileReport, FileStatus, RuleOutcome, RuleReport, RunReport};
pub use rule::{FileTarget, PatchRule, ReplacePolicy, RuleAction};

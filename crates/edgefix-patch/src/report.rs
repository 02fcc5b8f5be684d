//! Per-rule and per-file patch outcomes.

use serde::Serialize;
use std::fmt;

/// Outcome of a single rule against a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The trigger was found and the substitution was performed.
    Applied,
    /// The applied marker (or the replacement text) is already present.
    AlreadyApplied,
    /// Neither trigger nor replacement is present; the upstream file does
    /// not match the expected prior state.
    NotFound,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleOutcome::Applied => "applied",
            RuleOutcome::AlreadyApplied => "already applied",
            RuleOutcome::NotFound => "not found",
        };
        f.write_str(s)
    }
}

/// Whole-file status after evaluating all rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// At least one rule applied (or would apply, in a dry run).
    Patched,
    /// Every rule was a no-op.
    Clean,
    /// The target file does not exist under the given root.
    Missing,
    /// Reading or writing the file failed; see `FileReport::error`.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub rule: String,
    pub outcome: RuleOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub status: FileStatus,
    /// True only when the file was actually rewritten on disk.
    pub modified: bool,
    pub rules: Vec<RuleReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub(crate) fn missing(path: &std::path::Path) -> Self {
        Self {
            path: path.display().to_string(),
            status: FileStatus::Missing,
            modified: false,
            rules: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn failed(path: &std::path::Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            status: FileStatus::Failed,
            modified: false,
            rules: Vec::new(),
            error: Some(error),
        }
    }

    /// Outcome of a named rule, if it was evaluated for this file.
    pub fn outcome_of(&self, rule: &str) -> Option<RuleOutcome> {
        self.rules.iter().find(|r| r.rule == rule).map(|r| r.outcome)
    }
}

/// Aggregate report for one run over a set of targets.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// Number of rules that applied (or would apply) across all files.
    pub fn applied(&self) -> usize {
        self.files
            .iter()
            .flat_map(|f| f.rules.iter())
            .filter(|r| r.outcome == RuleOutcome::Applied)
            .count()
    }

    /// Number of targets absent from the checkout.
    pub fn missing(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Missing)
            .count()
    }

    /// True when every target exists and no rule has anything left to do.
    pub fn is_clean(&self) -> bool {
        self.files.iter().all(|f| f.status == FileStatus::Clean)
    }
}

//! Rule and target data model.
//!
//! The original maintenance scripts contained three distinct edit shapes,
//! all kept here: a literal substring substitution, a leading-line insert
//! (the Cython `language_level` directive), and a whole-file rewrite to a
//! canonical payload. Each shape knows how to recognize its own prior
//! application so a rule set can be re-run safely.

use std::path::PathBuf;

/// How many occurrences a `Replace` rule substitutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacePolicy {
    /// Replace only the first occurrence. Assumes the trigger occurs at most
    /// once in the target; pair with an applied marker otherwise.
    First,
    /// Replace every occurrence.
    All,
}

/// The edit a rule performs.
#[derive(Debug, Clone)]
pub enum RuleAction {
    /// Substitute `trigger` with `replacement`.
    Replace {
        trigger: String,
        replacement: String,
        policy: ReplacePolicy,
    },
    /// Insert `line` (plus a newline) at the top of the file if it is not
    /// already present anywhere in the file.
    Prepend { line: String },
    /// Replace the entire file body with `content`.
    Rewrite { content: String },
}

/// One idempotent text substitution.
#[derive(Debug, Clone)]
pub struct PatchRule {
    /// Stable slug used in reports and logs.
    pub name: String,
    pub action: RuleAction,
    /// Text whose presence means the rule has already been applied.
    ///
    /// Checked before the trigger. Mandatory whenever the trigger is a
    /// substring of the replacement, since the trigger then stays present
    /// after a successful application.
    pub applied_marker: Option<String>,
}

impl PatchRule {
    /// Substitute the first occurrence of `trigger`.
    pub fn replace(
        name: impl Into<String>,
        trigger: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            action: RuleAction::Replace {
                trigger: trigger.into(),
                replacement: replacement.into(),
                policy: ReplacePolicy::First,
            },
            applied_marker: None,
        }
    }

    /// Substitute every occurrence of `trigger`.
    pub fn replace_all(
        name: impl Into<String>,
        trigger: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            action: RuleAction::Replace {
                trigger: trigger.into(),
                replacement: replacement.into(),
                policy: ReplacePolicy::All,
            },
            applied_marker: None,
        }
    }

    /// Insert `line` at the top of the file when absent.
    pub fn prepend(name: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: RuleAction::Prepend { line: line.into() },
            applied_marker: None,
        }
    }

    /// Replace the whole file with a canonical payload.
    pub fn rewrite(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: RuleAction::Rewrite {
                content: content.into(),
            },
            applied_marker: None,
        }
    }

    /// Attach an explicit applied marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.applied_marker = Some(marker.into());
        self
    }
}

/// A file path plus the ordered rules to apply to it.
///
/// The path is relative to the checkout root handed to the engine. The file
/// is read once, mutated in memory, and written back in a single atomic
/// rename — there is no cross-file transaction.
#[derive(Debug, Clone)]
pub struct FileTarget {
    pub path: PathBuf,
    pub rules: Vec<PatchRule>,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>, rules: Vec<PatchRule>) -> Self {
        Self {
            path: path.into(),
            rules,
        }
    }
}

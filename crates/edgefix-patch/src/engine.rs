//! The patch engine: evaluate rules against file contents and persist the
//! result atomically.

use crate::error::{PatchError, Result};
use crate::report::{FileReport, FileStatus, RuleOutcome, RuleReport, RunReport};
use crate::rule::{FileTarget, PatchRule, ReplacePolicy, RuleAction};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Whether a run writes files back or only reports what it would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Apply,
    DryRun,
}

/// Evaluate one rule against the current contents.
///
/// Returns the rewritten contents (when the rule fires) and the outcome.
/// The applied marker is checked before the trigger, so a rule whose trigger
/// survives inside its own replacement still converges.
fn evaluate(content: &str, rule: &PatchRule) -> (Option<String>, RuleOutcome) {
    if let Some(marker) = &rule.applied_marker {
        if content.contains(marker) {
            return (None, RuleOutcome::AlreadyApplied);
        }
    }

    match &rule.action {
        RuleAction::Replace {
            trigger,
            replacement,
            policy,
        } => {
            if content.contains(trigger.as_str()) {
                let next = match policy {
                    ReplacePolicy::First => content.replacen(trigger.as_str(), replacement, 1),
                    ReplacePolicy::All => content.replace(trigger.as_str(), replacement),
                };
                (Some(next), RuleOutcome::Applied)
            } else if content.contains(replacement.as_str()) {
                // Trigger absent but the new text is present: the fix landed
                // in an earlier run (or upstream shipped it).
                (None, RuleOutcome::AlreadyApplied)
            } else {
                (None, RuleOutcome::NotFound)
            }
        }
        RuleAction::Prepend { line } => {
            if content.contains(line.as_str()) {
                (None, RuleOutcome::AlreadyApplied)
            } else {
                (Some(format!("{line}\n{content}")), RuleOutcome::Applied)
            }
        }
        RuleAction::Rewrite { content: payload } => {
            if content == payload {
                (None, RuleOutcome::AlreadyApplied)
            } else {
                (Some(payload.clone()), RuleOutcome::Applied)
            }
        }
    }
}

/// Apply one target's rules, in order, against the file at
/// `root.join(target.path)`.
///
/// A missing file yields [`FileStatus::Missing`], not an error, so a
/// multi-target run degrades gracefully. The file is written back at most
/// once, and only when at least one rule applied.
pub fn apply_file_target(root: &Path, target: &FileTarget, mode: ApplyMode) -> Result<FileReport> {
    let path = root.join(&target.path);
    if !path.is_file() {
        warn!("target missing: {}", path.display());
        return Ok(FileReport::missing(&target.path));
    }

    let mut content = fs::read_to_string(&path)?;
    let mut rules = Vec::with_capacity(target.rules.len());

    for rule in &target.rules {
        let (next, outcome) = evaluate(&content, rule);
        match outcome {
            RuleOutcome::Applied => info!("{}: {} applied", target.path.display(), rule.name),
            RuleOutcome::AlreadyApplied => {
                debug!("{}: {} already applied", target.path.display(), rule.name);
            }
            RuleOutcome::NotFound => warn!(
                "{}: {} trigger not found (upstream may have changed)",
                target.path.display(),
                rule.name
            ),
        }
        if let Some(next) = next {
            content = next;
        }
        rules.push(RuleReport {
            rule: rule.name.clone(),
            outcome,
        });
    }

    let pending = rules.iter().any(|r| r.outcome == RuleOutcome::Applied);
    let mut modified = false;
    if pending && mode == ApplyMode::Apply {
        write_atomic(&path, content.as_bytes())?;
        modified = true;
        info!("patched {}", path.display());
    }

    Ok(FileReport {
        path: target.path.display().to_string(),
        status: if pending {
            FileStatus::Patched
        } else {
            FileStatus::Clean
        },
        modified,
        rules,
        error: None,
    })
}

/// Run a set of targets, isolating per-file failures.
///
/// Rewrites are independent and non-atomic across files: if the process dies
/// between two targets, the already-written file keeps its patch.
pub fn apply_targets(root: &Path, targets: &[FileTarget], mode: ApplyMode) -> Result<RunReport> {
    let mut files = Vec::with_capacity(targets.len());
    for target in targets {
        match apply_file_target(root, target, mode) {
            Ok(report) => files.push(report),
            Err(err) => {
                warn!("{}: {err}", target.path.display());
                files.push(FileReport::failed(&target.path, err.to_string()));
            }
        }
    }
    Ok(RunReport { files })
}

/// Write the whole buffer through a temp file in the target's directory and
/// rename it into place, so an interrupted run never leaves truncated output.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| PatchError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::PatchRule;
    use tempfile::TempDir;

    fn replace_rule() -> PatchRule {
        PatchRule::replace("imports", "from backbone import A, B", "from pkg.backbone import A, B")
    }

    #[test]
    fn replace_substitutes_trigger() {
        let (next, outcome) = evaluate("x\nfrom backbone import A, B\ny\n", &replace_rule());
        assert_eq!(outcome, RuleOutcome::Applied);
        assert_eq!(next.unwrap(), "x\nfrom pkg.backbone import A, B\ny\n");
    }

    #[test]
    fn replace_reports_already_applied_via_replacement_text() {
        let (next, outcome) = evaluate("from pkg.backbone import A, B\n", &replace_rule());
        assert_eq!(outcome, RuleOutcome::AlreadyApplied);
        assert!(next.is_none());
    }

    #[test]
    fn replace_reports_not_found_on_drifted_content() {
        let (next, outcome) = evaluate("from elsewhere import C\n", &replace_rule());
        assert_eq!(outcome, RuleOutcome::NotFound);
        assert!(next.is_none());
    }

    #[test]
    fn marker_wins_over_trigger() {
        // The trigger survives inside its own replacement; the marker keeps
        // the rule from re-firing.
        let rule = PatchRule::replace_all("comment-out", "do_thing()", "# do_thing()  # disabled")
            .with_marker("# do_thing()  # disabled");
        let (next, outcome) = evaluate("a\ndo_thing()\nb\n", &rule);
        assert_eq!(outcome, RuleOutcome::Applied);
        let once = next.unwrap();

        let (again, outcome) = evaluate(&once, &rule);
        assert_eq!(outcome, RuleOutcome::AlreadyApplied);
        assert!(again.is_none());
    }

    #[test]
    fn prepend_inserts_leading_line_once() {
        let rule = PatchRule::prepend("directive", "# cython: language_level=3");
        let (next, outcome) = evaluate("cimport cython\n", &rule);
        assert_eq!(outcome, RuleOutcome::Applied);
        let once = next.unwrap();
        assert!(once.starts_with("# cython: language_level=3\ncimport cython\n"));

        let (again, outcome) = evaluate(&once, &rule);
        assert_eq!(outcome, RuleOutcome::AlreadyApplied);
        assert!(again.is_none());
    }

    #[test]
    fn rewrite_converges_on_payload() {
        let rule = PatchRule::rewrite("canonical", "the canonical body\n");
        let (next, outcome) = evaluate("anything else\n", &rule);
        assert_eq!(outcome, RuleOutcome::Applied);
        assert_eq!(next.as_deref(), Some("the canonical body\n"));

        let (again, outcome) = evaluate("the canonical body\n", &rule);
        assert_eq!(outcome, RuleOutcome::AlreadyApplied);
        assert!(again.is_none());
    }

    #[test]
    fn missing_file_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let target = FileTarget::new("nope.py", vec![replace_rule()]);
        let report = apply_file_target(dir.path(), &target, ApplyMode::Apply).unwrap();
        assert_eq!(report.status, FileStatus::Missing);
        assert!(!report.modified);
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.py");
        let body = "from backbone import A, B\n";
        fs::write(&path, body).unwrap();

        let target = FileTarget::new("config.py", vec![replace_rule()]);
        let report = apply_file_target(dir.path(), &target, ApplyMode::DryRun).unwrap();
        assert_eq!(report.status, FileStatus::Patched);
        assert!(!report.modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), body);
    }

    #[test]
    fn second_apply_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.py");
        fs::write(&path, "pre\nfrom backbone import A, B\npost\n").unwrap();

        let target = FileTarget::new("config.py", vec![replace_rule()]);
        let first = apply_file_target(dir.path(), &target, ApplyMode::Apply).unwrap();
        assert!(first.modified);
        let after_first = fs::read_to_string(&path).unwrap();

        let second = apply_file_target(dir.path(), &target, ApplyMode::Apply).unwrap();
        assert_eq!(second.status, FileStatus::Clean);
        assert!(!second.modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
    }
}

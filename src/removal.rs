//! Confirmation-gated removal of one worktree or every finished one.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::safety::{self, SafetyVerdict, WARN_INVALID_REPOSITORY};
use crate::status::{DirScope, StatusInspector};
use crate::worktree::{Worktree, Worktrees};

pub const WARN_CURRENT: &str = "is the current worktree";

/// Yes/no confirmation and warning display, supplied by the caller.
pub trait Prompt {
    fn confirm(&self, question: &str) -> Result<bool>;
    fn show_warnings(&self, worktree: &Worktree, warnings: &[String]);
    fn show_plan(&self, plan: &CleanPlan);
}

/// Prompts on the terminal. With `assume_yes`, every question is answered
/// yes without reading input, but warnings are still shown.
pub struct TerminalPrompt {
    pub assume_yes: bool,
}

fn describe(wt: &Worktree) -> String {
    if wt.branch.is_empty() {
        format!("{} (detached)", wt.path.display())
    } else {
        format!("{} [{}]", wt.path.display(), wt.branch)
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn show_warnings(&self, worktree: &Worktree, warnings: &[String]) {
        eprintln!("{}:", describe(worktree));
        for w in warnings {
            eprintln!("  - {}", w);
        }
    }

    fn show_plan(&self, plan: &CleanPlan) {
        if !plan.removable.is_empty() {
            eprintln!("Removable:");
            for c in &plan.removable {
                eprintln!("  {}", describe(&c.worktree));
            }
        }
        if !plan.blocked.is_empty() {
            eprintln!("Kept:");
            for c in &plan.blocked {
                eprintln!("  {}", describe(&c.worktree));
                for w in &c.warnings {
                    eprintln!("    - {}", w);
                }
            }
        }
    }
}

pub enum RemovalTarget {
    Identifier(String),
    Worktree(Worktree),
}

#[derive(Debug, Clone)]
pub struct RemoveOptions {
    /// Skip evaluation and confirmation. Git still refuses to discard
    /// local changes, and that refusal is returned as `RemoveFailed`.
    pub force: bool,
    pub delete_branch: bool,
    pub target_branch: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveReport {
    pub worktree: Worktree,
    pub removed: bool,
    pub warnings: Vec<String>,
    pub branch_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub dry_run: bool,
    /// Skip the aggregate confirmation. Evaluation still runs.
    pub force: bool,
    pub delete_branch: bool,
    pub target_branch: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub worktree: Worktree,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanPlan {
    pub removable: Vec<Candidate>,
    pub blocked: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanSummary {
    pub plan: CleanPlan,
    pub dry_run: bool,
    pub aborted: bool,
    pub removed: Vec<PathBuf>,
    /// Branches of removed worktrees that could not be deleted.
    pub branch_errors: Vec<String>,
}

pub struct Remover<'a> {
    worktrees: &'a Worktrees<'a>,
    inspector: &'a StatusInspector<'a>,
    prompt: &'a dyn Prompt,
    trunk_branches: Vec<String>,
}

impl<'a> Remover<'a> {
    pub fn new(
        worktrees: &'a Worktrees<'a>,
        inspector: &'a StatusInspector<'a>,
        prompt: &'a dyn Prompt,
        trunk_branches: Vec<String>,
    ) -> Self {
        Remover {
            worktrees,
            inspector,
            prompt,
            trunk_branches,
        }
    }

    /// Evaluates `wt` inside its own scope. The scope is released before
    /// this returns, whatever the outcome.
    fn verdict_for(&self, wt: &Worktree, target_branch: &str) -> SafetyVerdict {
        match DirScope::enter(&wt.path) {
            Ok(scope) => safety::evaluate(self.inspector, &scope, target_branch),
            Err(Error::InvalidWorkspace(path)) => {
                warn!(path = %path.display(), "worktree directory is missing");
                SafetyVerdict {
                    can_remove: false,
                    warnings: vec![WARN_INVALID_REPOSITORY.to_string()],
                }
            }
            Err(e) => {
                warn!(path = %wt.path.display(), error = %e, "evaluation failed");
                SafetyVerdict {
                    can_remove: false,
                    warnings: vec![format!("cannot evaluate: {}", e)],
                }
            }
        }
    }

    fn delete_branch(&self, branch: &str) -> std::result::Result<(), String> {
        self.worktrees.delete_branch(branch).map_err(|e| {
            warn!(branch, error = %e, "branch not deleted");
            e.to_string()
        })
    }

    /// Removes a single worktree.
    ///
    /// Unless forced, the worktree is evaluated first and any warnings must
    /// be confirmed; declining leaves everything untouched. Removal never
    /// passes `--force` to git. Branch deletion afterwards is best-effort.
    pub fn remove_one(&self, target: RemovalTarget, opts: &RemoveOptions) -> Result<RemoveReport> {
        let wt = match target {
            RemovalTarget::Identifier(id) => self.worktrees.get_for_identifier(&id)?,
            RemovalTarget::Worktree(wt) => wt,
        };

        let warnings = if opts.force {
            Vec::new()
        } else {
            self.verdict_for(&wt, &opts.target_branch).warnings
        };

        if !warnings.is_empty() {
            self.prompt.show_warnings(&wt, &warnings);
            if !self.prompt.confirm("Remove this worktree anyway?")? {
                info!(path = %wt.path.display(), "removal declined");
                return Ok(RemoveReport {
                    worktree: wt,
                    removed: false,
                    warnings,
                    branch_deleted: false,
                    branch_error: None,
                });
            }
        }

        self.worktrees.remove_by_path(&wt.path, false)?;

        let mut report = RemoveReport {
            worktree: wt,
            removed: true,
            warnings,
            branch_deleted: false,
            branch_error: None,
        };
        if opts.delete_branch && !report.worktree.branch.is_empty() {
            match self.delete_branch(&report.worktree.branch) {
                Ok(()) => report.branch_deleted = true,
                Err(e) => report.branch_error = Some(e),
            }
        }
        Ok(report)
    }

    /// Evaluates every non-trunk branch worktree and sorts it into
    /// removable and blocked, in listing order.
    pub fn plan(&self, target_branch: &str) -> Result<CleanPlan> {
        let mut plan = CleanPlan::default();
        for wt in self.worktrees.list()? {
            if wt.branch.is_empty() || self.trunk_branches.iter().any(|t| *t == wt.branch) {
                continue;
            }
            let mut verdict = self.verdict_for(&wt, target_branch);
            if wt.is_current {
                verdict.warnings.push(WARN_CURRENT.to_string());
                verdict.can_remove = false;
            }
            let candidate = Candidate {
                worktree: wt,
                warnings: verdict.warnings,
            };
            if verdict.can_remove {
                plan.removable.push(candidate);
            } else {
                plan.blocked.push(candidate);
            }
        }
        Ok(plan)
    }

    /// Removes every worktree that evaluates clean.
    ///
    /// Individual removal failures do not stop the loop; successful
    /// removals are kept and the call fails with `BatchFailed` afterwards.
    pub fn clean_all(&self, opts: &CleanOptions) -> Result<CleanSummary> {
        let plan = self.plan(&opts.target_branch)?;
        self.prompt.show_plan(&plan);

        let mut summary = CleanSummary {
            plan,
            dry_run: opts.dry_run,
            aborted: false,
            removed: Vec::new(),
            branch_errors: Vec::new(),
        };
        if opts.dry_run || summary.plan.removable.is_empty() {
            return Ok(summary);
        }

        if !opts.force {
            let question = format!("Remove {} worktree(s)?", summary.plan.removable.len());
            if !self.prompt.confirm(&question)? {
                summary.aborted = true;
                return Ok(summary);
            }
        }

        let mut failed = 0;
        for c in &summary.plan.removable {
            let wt = &c.worktree;
            if let Err(e) = self.worktrees.remove_by_path(&wt.path, false) {
                warn!(path = %wt.path.display(), error = %e, "removal failed");
                failed += 1;
                continue;
            }
            summary.removed.push(wt.path.clone());
            if opts.delete_branch
                && let Err(e) = self.delete_branch(&wt.branch)
            {
                summary.branch_errors.push(e);
            }
        }

        if failed > 0 {
            return Err(Error::BatchFailed {
                removed: summary.removed.len(),
                failed,
            });
        }
        Ok(summary)
    }
}

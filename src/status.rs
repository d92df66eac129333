//! Per-worktree status queries.
//!
//! Every query runs inside an explicit [`DirScope`] rather than the
//! process working directory, which is never changed.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::git::Git;
use crate::process::{ProcessError, Runner};
use crate::worktree::is_not_a_repository;

pub const DEFAULT_REMOTE: &str = "origin";

/// The directory a group of status checks runs against.
///
/// Acquired once per worktree; released when dropped.
#[derive(Debug)]
pub struct DirScope {
    dir: PathBuf,
}

impl DirScope {
    /// Fails with `InvalidWorkspace` when `dir` is not an existing directory.
    pub fn enter(dir: &Path) -> Result<DirScope> {
        if !dir.is_dir() {
            return Err(Error::InvalidWorkspace(dir.to_path_buf()));
        }
        trace!(dir = %dir.display(), "entered scope");
        Ok(DirScope {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for DirScope {
    fn drop(&mut self) {
        trace!(dir = %self.dir.display(), "left scope");
    }
}

fn check_error(scope: &DirScope, what: &str, err: ProcessError) -> Error {
    if is_not_a_repository(&err) {
        return Error::InvalidWorkspace(scope.path().to_path_buf());
    }
    Error::StatusCheckFailed(format!("{}: {}", what, err))
}

pub struct StatusInspector<'r> {
    git: Git<'r>,
    remote: String,
}

impl<'r> StatusInspector<'r> {
    pub fn new(runner: &'r dyn Runner) -> Self {
        StatusInspector {
            git: Git::new(runner),
            remote: DEFAULT_REMOTE.to_string(),
        }
    }

    pub fn with_remote(mut self, remote: &str) -> Self {
        self.remote = remote.to_string();
        self
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// True iff `git status --porcelain` reports anything.
    /// A broken worktree yields `InvalidWorkspace`.
    pub fn has_uncommitted_changes(&self, scope: &DirScope) -> Result<bool> {
        let out = self
            .git
            .status_short(scope.path())
            .map_err(|e| check_error(scope, "reading status", e))?;
        Ok(!out.trim().is_empty())
    }

    /// True when the current branch has commits its upstream lacks.
    /// A branch without an upstream counts as unpushed.
    pub fn has_unpushed_commits(&self, scope: &DirScope) -> Result<bool> {
        let branch = self
            .git
            .branch_current(scope.path())
            .map_err(|e| check_error(scope, "resolving current branch", e))?;

        let upstream = match self.git.upstream(scope.path(), &branch) {
            Ok(u) if !u.is_empty() => u,
            Ok(_) | Err(ProcessError::Failed { .. }) => {
                debug!(branch, "no upstream configured");
                return Ok(true);
            }
            Err(e) => return Err(check_error(scope, "resolving upstream", e)),
        };

        let range = format!("{}..{}", upstream, branch);
        let out = self
            .git
            .rev_count(scope.path(), &range)
            .map_err(|e| check_error(scope, "counting unpushed commits", e))?;
        let count: u32 = out.parse().map_err(|_| {
            Error::StatusCheckFailed(format!("unexpected rev-list output {:?}", out))
        })?;
        Ok(count > 0)
    }

    /// Fetches `<remote>/<target_branch>` and reports whether HEAD is
    /// contained in it. A failed fetch is an error, not `false`.
    pub fn is_merged_to_origin(&self, scope: &DirScope, target_branch: &str) -> Result<bool> {
        self.git
            .fetch(scope.path(), &self.remote, target_branch)
            .map_err(|e| check_error(scope, "fetching", e))?;

        let tracking = format!("{}/{}", self.remote, target_branch);
        let containing = self
            .git
            .remote_branches_containing(scope.path(), "HEAD")
            .map_err(|e| check_error(scope, "listing containing branches", e))?;
        Ok(containing.iter().any(|b| *b == tracking))
    }
}

use std::path::{Path, PathBuf};

use crate::process::{ProcessError, Runner};

const GIT: &str = "git";

/// Thin typed wrapper over the git subcommands the core needs.
/// Every call runs in an explicit directory; nothing here reads the
/// process working directory.
#[derive(Clone, Copy)]
pub struct Git<'r> {
    runner: &'r dyn Runner,
}

type GitResult<T> = Result<T, ProcessError>;

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

impl<'r> Git<'r> {
    pub fn new(runner: &'r dyn Runner) -> Self {
        Git { runner }
    }

    /// Raw stdout of `git <args>` run in `dir`.
    pub fn run(&self, dir: &Path, args: &[&str]) -> GitResult<String> {
        self.runner.run(dir, GIT, args)
    }

    fn run_trimmed(&self, dir: &Path, args: &[&str]) -> GitResult<String> {
        Ok(self.run(dir, args)?.trim().to_string())
    }

    pub fn show_toplevel(&self, dir: &Path) -> GitResult<PathBuf> {
        self.run_trimmed(dir, &["rev-parse", "--show-toplevel"])
            .map(PathBuf::from)
    }

    pub fn common_dir(&self, dir: &Path) -> GitResult<PathBuf> {
        self.run_trimmed(
            dir,
            &["rev-parse", "--path-format=absolute", "--git-common-dir"],
        )
        .map(PathBuf::from)
    }

    pub fn worktree_add(
        &self,
        repo_dir: &Path,
        worktree_path: &Path,
        branch: &str,
        start_point: &str,
    ) -> GitResult<()> {
        let wt = path_str(worktree_path);
        self.run(
            repo_dir,
            &["worktree", "add", "-b", branch, "--", &wt, start_point],
        )?;
        Ok(())
    }

    pub fn worktree_add_existing(
        &self,
        repo_dir: &Path,
        worktree_path: &Path,
        branch: &str,
    ) -> GitResult<()> {
        let wt = path_str(worktree_path);
        self.run(repo_dir, &["worktree", "add", "--", &wt, branch])?;
        Ok(())
    }

    pub fn worktree_add_tracking(
        &self,
        repo_dir: &Path,
        worktree_path: &Path,
        branch: &str,
        remote_ref: &str,
    ) -> GitResult<()> {
        let wt = path_str(worktree_path);
        self.run(
            repo_dir,
            &["worktree", "add", "--track", "-b", branch, "--", &wt, remote_ref],
        )?;
        Ok(())
    }

    pub fn worktree_list(&self, repo_dir: &Path) -> GitResult<String> {
        self.run(repo_dir, &["worktree", "list", "--porcelain"])
    }

    pub fn worktree_remove(&self, repo_dir: &Path, worktree_path: &Path, force: bool) -> GitResult<()> {
        let wt = path_str(worktree_path);
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&wt);
        self.run(repo_dir, &args)?;
        Ok(())
    }

    pub fn status_short(&self, dir: &Path) -> GitResult<String> {
        self.run_trimmed(dir, &["status", "--porcelain"])
    }

    pub fn branch_current(&self, dir: &Path) -> GitResult<String> {
        self.run_trimmed(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Short name of the upstream configured for `branch`.
    pub fn upstream(&self, dir: &Path, branch: &str) -> GitResult<String> {
        let spec = format!("{}@{{upstream}}", branch);
        self.run_trimmed(
            dir,
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", &spec],
        )
    }

    pub fn rev_count(&self, dir: &Path, range: &str) -> GitResult<String> {
        self.run_trimmed(dir, &["rev-list", "--count", range])
    }

    pub fn fetch(&self, dir: &Path, remote: &str, branch: &str) -> GitResult<()> {
        self.run(dir, &["fetch", remote, branch])?;
        Ok(())
    }

    /// Remote-tracking branches that contain `commit`, e.g. `origin/main`.
    pub fn remote_branches_containing(&self, dir: &Path, commit: &str) -> GitResult<Vec<String>> {
        let out = self.run(dir, &["branch", "-r", "--contains", commit])?;
        Ok(out
            .lines()
            .map(|l| l.trim().trim_start_matches("* ").to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    pub fn branch_delete(&self, dir: &Path, branch: &str) -> GitResult<()> {
        self.run(dir, &["branch", "-D", "--", branch])?;
        Ok(())
    }

    pub fn remote_ref_exists(&self, dir: &Path, name: &str) -> bool {
        let r = format!("refs/remotes/{}", name);
        self.run(dir, &["rev-parse", "--verify", "--quiet", &r]).is_ok()
    }

    pub fn remotes(&self, dir: &Path) -> GitResult<Vec<String>> {
        let out = self.run(dir, &["remote"])?;
        Ok(out.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
    }

    /// Paths of tracked files, relative to `dir`.
    pub fn ls_files(&self, dir: &Path) -> GitResult<Vec<String>> {
        let out = self.run(dir, &["ls-files"])?;
        Ok(out.lines().map(|l| l.to_string()).collect())
    }
}

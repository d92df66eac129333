use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::git::Git;
use crate::names;
use crate::process::{ProcessError, Runner};

const NOT_A_REPO_SIGNATURE: &str = "not a git repository";

/// One on-disk checkout as reported by `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worktree {
    pub path: PathBuf,
    /// Short branch name, empty when detached.
    pub branch: String,
    pub commit: String,
    pub is_detached: bool,
    /// Computed locally from the invoking process's working directory.
    pub is_current: bool,
}

impl Worktree {
    fn at(path: PathBuf) -> Self {
        Worktree {
            path,
            branch: String::new(),
            commit: String::new(),
            is_detached: false,
            is_current: false,
        }
    }
}

/// True when git reported that the directory is not a repository.
pub(crate) fn is_not_a_repository(err: &ProcessError) -> bool {
    err.output().contains(NOT_A_REPO_SIGNATURE)
}

fn query_error(err: ProcessError) -> Error {
    if is_not_a_repository(&err) {
        Error::NotARepository
    } else {
        Error::StatusCheckFailed(err.to_string())
    }
}

/// Parses porcelain worktree output into records.
///
/// A `worktree ` line opens a record, closing any record still open. A
/// blank line closes the open record. The last record is closed at end
/// of input because git does not always terminate it with a blank line.
/// Attribute lines outside an open record are ignored.
pub fn parse_porcelain(raw: &str) -> Vec<Worktree> {
    fn flush(records: &mut Vec<Worktree>, open: &mut Option<Worktree>) {
        if let Some(wt) = open.take() {
            records.push(wt);
        }
    }

    let mut records = Vec::new();
    let mut open: Option<Worktree> = None;

    for line in raw.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            flush(&mut records, &mut open);
            open = Some(Worktree::at(PathBuf::from(path)));
            continue;
        }
        if line.trim().is_empty() {
            flush(&mut records, &mut open);
            continue;
        }
        let Some(wt) = open.as_mut() else {
            continue;
        };
        if let Some(commit) = line.strip_prefix("HEAD ") {
            wt.commit = commit.trim().to_string();
        } else if let Some(branch) = line.strip_prefix("branch ") {
            let branch = branch.trim();
            wt.branch = branch
                .strip_prefix("refs/heads/")
                .unwrap_or(branch)
                .to_string();
        } else if line == "detached" {
            wt.is_detached = true;
        }
    }

    flush(&mut records, &mut open);
    records
}

fn canonical(p: &Path) -> PathBuf {
    p.canonicalize().unwrap_or_else(|_| p.to_path_buf())
}

/// Flags the worktree containing `cwd`. When worktrees nest, the most
/// specific path wins.
pub fn mark_current(worktrees: &mut [Worktree], cwd: &Path) {
    let cwd = canonical(cwd);
    let best = worktrees
        .iter()
        .enumerate()
        .filter(|(_, wt)| cwd.starts_with(canonical(&wt.path)))
        .max_by_key(|(_, wt)| wt.path.components().count())
        .map(|(i, _)| i);
    for (i, wt) in worktrees.iter_mut().enumerate() {
        wt.is_current = Some(i) == best;
    }
}

/// True when `path`'s directory name is the suffix itself or ends with
/// `-<suffix>`.
pub fn path_matches_suffix(path: &Path, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name == suffix || name.ends_with(&format!("-{}", suffix))
}

/// Data access for the repository's worktrees. Listing is never cached;
/// git's own metadata is the source of truth.
pub struct Worktrees<'r> {
    git: Git<'r>,
    cwd: PathBuf,
    worktree_dir: Option<PathBuf>,
}

impl<'r> Worktrees<'r> {
    /// `cwd` is where the caller was invoked; it locates the repository and
    /// decides which worktree is current.
    pub fn new(runner: &'r dyn Runner, cwd: &Path) -> Self {
        Worktrees {
            git: Git::new(runner),
            cwd: cwd.to_path_buf(),
            worktree_dir: None,
        }
    }

    /// Overrides the parent directory new worktrees are created in.
    pub fn with_worktree_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.worktree_dir = dir;
        self
    }

    pub fn git(&self) -> Git<'r> {
        self.git
    }

    /// Root of the main checkout, even when invoked from a linked worktree.
    pub fn repo_root(&self) -> Result<PathBuf> {
        if let Ok(common) = self.git.common_dir(&self.cwd)
            && common.file_name().is_some_and(|n| n == ".git")
            && let Some(root) = common.parent()
        {
            return Ok(root.to_path_buf());
        }
        self.git
            .show_toplevel(&self.cwd)
            .map_err(|_| Error::NotARepository)
    }

    /// Where the worktree for `dir_suffix` lives: `<parent>/<repo>-<suffix>`.
    pub fn path_for(&self, repo_root: &Path, dir_suffix: &str) -> PathBuf {
        let repo_name = repo_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repo".to_string());
        let parent = match &self.worktree_dir {
            Some(dir) => dir.clone(),
            None => repo_root.parent().unwrap_or(repo_root).to_path_buf(),
        };
        parent.join(format!("{}-{}", repo_name, dir_suffix))
    }

    /// Creates a worktree on a new branch derived from `identifier`,
    /// starting at `base_branch`. Git enforces uniqueness, so a duplicate
    /// surfaces as `CreateFailed`.
    pub fn create(&self, identifier: &str, base_branch: &str) -> Result<PathBuf> {
        let root = self.repo_root()?;
        let resolved = names::resolve(identifier);
        let path = self.path_for(&root, &resolved.dir_suffix);

        self.git
            .worktree_add(&root, &path, &resolved.branch_name, base_branch)
            .map_err(|e| Error::CreateFailed(e.to_string()))?;

        info!(path = %path.display(), branch = %resolved.branch_name, "created worktree");
        Ok(path)
    }

    /// Checks out an existing branch into `path`. A remote-tracking source
    /// gets a new local `target_branch` tracking it; a local source is
    /// checked out directly and `target_branch` is ignored.
    pub fn create_from_branch(
        &self,
        path: &Path,
        source_branch: &str,
        target_branch: &str,
    ) -> Result<()> {
        let root = self.repo_root()?;

        let res = if self.git.remote_ref_exists(&root, source_branch) {
            debug!(source_branch, target_branch, "tracking remote branch");
            self.git
                .worktree_add_tracking(&root, path, target_branch, source_branch)
        } else {
            self.git.worktree_add_existing(&root, path, source_branch)
        };
        res.map_err(|e| Error::CreateFailed(e.to_string()))?;

        info!(path = %path.display(), source_branch, "created worktree from branch");
        Ok(())
    }

    /// Every worktree git knows about, in git's order.
    pub fn list(&self) -> Result<Vec<Worktree>> {
        let raw = self.git.worktree_list(&self.cwd).map_err(query_error)?;
        let mut worktrees = parse_porcelain(&raw);
        mark_current(&mut worktrees, &self.cwd);
        Ok(worktrees)
    }

    /// Finds the worktree created for `identifier`.
    ///
    /// The exact `<repo>-<suffix>` directory wins; otherwise the first
    /// worktree whose directory name ends in `-<suffix>` is returned.
    pub fn get_for_identifier(&self, identifier: &str) -> Result<Worktree> {
        let suffix = names::resolve(identifier).dir_suffix;
        let worktrees = self.list()?;
        let root = self.repo_root().ok();

        if let Some(root) = &root {
            let expected = self.path_for(root, &suffix);
            let expected_name = expected.file_name();
            if let Some(wt) = worktrees
                .iter()
                .find(|wt| wt.path.file_name().is_some() && wt.path.file_name() == expected_name)
            {
                return Ok(wt.clone());
            }
        }

        // The main checkout is never a match.
        worktrees
            .into_iter()
            .filter(|wt| root.as_deref() != Some(wt.path.as_path()))
            .find(|wt| path_matches_suffix(&wt.path, &suffix))
            .ok_or_else(|| Error::NotFound(identifier.to_string()))
    }

    /// Removes the worktree for `identifier` and returns what was removed.
    pub fn remove(&self, identifier: &str, force: bool) -> Result<Worktree> {
        let wt = self.get_for_identifier(identifier)?;
        self.remove_by_path(&wt.path, force)?;
        Ok(wt)
    }

    /// Removes the worktree at `path` via git. Runs from the main checkout
    /// so the target is never the directory git is executing in.
    pub fn remove_by_path(&self, path: &Path, force: bool) -> Result<()> {
        let root = self.repo_root()?;
        self.git
            .worktree_remove(&root, path, force)
            .map_err(|e| Error::RemoveFailed(e.to_string()))?;
        info!(path = %path.display(), "removed worktree");
        Ok(())
    }

    /// Force-deletes a local branch.
    pub fn delete_branch(&self, branch: &str) -> Result<()> {
        let root = self.repo_root()?;
        self.git
            .branch_delete(&root, branch)
            .map_err(|e| Error::RemoveFailed(format!("deleting branch {}: {}", branch, e)))?;
        info!(branch, "deleted branch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SystemRunner;
    use crate::testutil::{self, FakeRunner};

    const COMMON_DIR: &str = "rev-parse --path-format=absolute --git-common-dir";
    const LIST: &str = "worktree list --porcelain";

    #[test]
    fn test_parse_porcelain() {
        let raw = "worktree /work/repo\n\
                   HEAD 1111111111111111111111111111111111111111\n\
                   branch refs/heads/main\n\
                   \n\
                   worktree /work/repo-42\n\
                   HEAD 2222222222222222222222222222222222222222\n\
                   branch refs/heads/42/impl\n\
                   \n\
                   worktree /work/repo-detached\n\
                   HEAD 3333333333333333333333333333333333333333\n\
                   detached\n\
                   \n\
                   worktree /work/repo-feature-x\n\
                   HEAD 4444444444444444444444444444444444444444\n\
                   branch refs/heads/feature/x\n\
                   locked\n";
        let got = parse_porcelain(raw);
        assert_eq!(got.len(), 4);

        assert_eq!(got[0].path, PathBuf::from("/work/repo"));
        assert_eq!(got[0].branch, "main");
        assert_eq!(got[0].commit, "1111111111111111111111111111111111111111");
        assert!(!got[0].is_detached);

        assert_eq!(got[1].branch, "42/impl");

        assert!(got[2].is_detached);
        assert_eq!(got[2].branch, "");
        assert!(got[2].commit.starts_with("3333333"));

        // last record has no trailing blank line
        assert_eq!(got[3].path, PathBuf::from("/work/repo-feature-x"));
        assert_eq!(got[3].branch, "feature/x");
        assert!(!got[3].is_detached);
    }

    #[test]
    fn test_parse_porcelain_edge_cases() {
        let cases: Vec<(&str, &str, usize)> = vec![
            ("empty", "", 0),
            ("blank lines only", "\n\n\n", 0),
            ("attributes before any record", "HEAD abc\nbranch refs/heads/x\n", 0),
            ("single unterminated", "worktree /a\nHEAD abc", 1),
            ("back to back without blank", "worktree /a\nHEAD abc\nworktree /b\nHEAD def\n", 2),
            ("bare main", "worktree /a.git\nbare\n\nworktree /b\nHEAD def\nbranch refs/heads/b\n\n", 2),
            ("trailing blanks", "worktree /a\nHEAD abc\n\n\n\n", 1),
        ];
        for (name, raw, want) in cases {
            assert_eq!(parse_porcelain(raw).len(), want, "{}", name);
        }
    }

    #[test]
    fn test_parse_porcelain_branch_without_ref_prefix() {
        let got = parse_porcelain("worktree /a\nbranch plain\n");
        assert_eq!(got[0].branch, "plain");
    }

    #[test]
    fn test_mark_current_prefers_most_specific() {
        let mut wts = parse_porcelain(
            "worktree /work/repo\n\nworktree /work/repo/.worktrees/7\n\nworktree /work/repo-4\n",
        );
        mark_current(&mut wts, Path::new("/work/repo/.worktrees/7/src"));
        let current: Vec<bool> = wts.iter().map(|w| w.is_current).collect();
        assert_eq!(current, vec![false, true, false]);

        mark_current(&mut wts, Path::new("/work/repo-42"));
        assert!(wts.iter().all(|w| !w.is_current), "repo-4 is not a prefix of repo-42");

        mark_current(&mut wts, Path::new("/work/repo/src"));
        assert!(wts[0].is_current);
    }

    #[test]
    fn test_path_matches_suffix() {
        let cases = vec![
            ("exact repo-suffix", "/w/repo-42", "42", true),
            ("bare suffix dir", "/w/42", "42", true),
            ("longer number", "/w/repo-142", "42", false),
            ("prefix of other id", "/w/repo-12", "1", false),
            ("sanitized branch", "/w/repo-feature-x", "feature-x", true),
            ("empty suffix", "/w/repo-", "", false),
        ];
        for (name, path, suffix, want) in cases {
            assert_eq!(path_matches_suffix(Path::new(path), suffix), want, "{}", name);
        }
    }

    fn fake_repo() -> FakeRunner {
        FakeRunner::new()
            .ok(COMMON_DIR, "/work/repo/.git\n")
            .ok(
                LIST,
                "worktree /work/repo\nHEAD aaa\nbranch refs/heads/main\n\n\
                 worktree /work/repo-12\nHEAD bbb\nbranch refs/heads/12/impl\n\n\
                 worktree /work/repo-1\nHEAD ccc\nbranch refs/heads/1/impl\n",
            )
    }

    #[test]
    fn test_get_for_identifier_prefers_exact_name() {
        let runner = fake_repo();
        let wts = Worktrees::new(&runner, Path::new("/work/repo"));

        let wt = wts.get_for_identifier("1").unwrap();
        assert_eq!(wt.path, PathBuf::from("/work/repo-1"));
        assert_eq!(wt.branch, "1/impl");

        let wt = wts.get_for_identifier("12").unwrap();
        assert_eq!(wt.branch, "12/impl");
    }

    #[test]
    fn test_get_for_identifier_not_found() {
        let runner = fake_repo();
        let wts = Worktrees::new(&runner, Path::new("/work/repo"));
        let err = wts.get_for_identifier("2").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref id) if id == "2"), "{:?}", err);
    }

    #[test]
    fn test_get_for_identifier_skips_main_checkout() {
        let runner = FakeRunner::new()
            .ok(COMMON_DIR, "/work/foo-x/.git\n")
            .ok(
                LIST,
                "worktree /work/foo-x\nHEAD aaa\nbranch refs/heads/main\n\n\
                 worktree /work/foo-x-7\nHEAD bbb\nbranch refs/heads/7/impl\n",
            );
        let wts = Worktrees::new(&runner, Path::new("/work/foo-x"));
        let cases = vec![("repo name", "foo-x"), ("repo name suffix", "x")];
        for (name, id) in cases {
            let res = wts.get_for_identifier(id);
            assert!(matches!(res, Err(Error::NotFound(_))), "{}: {:?}", name, res);
        }
        assert_eq!(wts.get_for_identifier("7").unwrap().branch, "7/impl");
    }

    #[test]
    fn test_list_marks_current_from_cwd() {
        let runner = fake_repo();
        let wts = Worktrees::new(&runner, Path::new("/work/repo-12/src"));
        let list = wts.list().unwrap();
        let current: Vec<_> = list.iter().filter(|w| w.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].path, PathBuf::from("/work/repo-12"));
    }

    #[test]
    fn test_list_outside_repository() {
        let runner = FakeRunner::new().fail(LIST, "fatal: not a git repository (or any of the parent directories): .git");
        let wts = Worktrees::new(&runner, Path::new("/tmp"));
        assert!(matches!(wts.list(), Err(Error::NotARepository)));
    }

    #[test]
    fn test_path_for_uses_configured_dir() {
        let runner = FakeRunner::new();
        let wts = Worktrees::new(&runner, Path::new("/work/repo"))
            .with_worktree_dir(Some(PathBuf::from("/trees")));
        assert_eq!(
            wts.path_for(Path::new("/work/repo"), "feature-x"),
            PathBuf::from("/trees/repo-feature-x")
        );
    }

    #[test]
    fn test_remove_by_path_failure_is_remove_failed() {
        let runner = FakeRunner::new()
            .ok(COMMON_DIR, "/work/repo/.git")
            .fail(
                "worktree remove /work/repo-9",
                "fatal: '/work/repo-9' contains modified or untracked files, use --force to delete it",
            );
        let wts = Worktrees::new(&runner, Path::new("/work/repo"));
        let err = wts.remove_by_path(Path::new("/work/repo-9"), false).unwrap_err();
        assert!(matches!(err, Error::RemoveFailed(ref m) if m.contains("--force")), "{:?}", err);
        assert_eq!(
            runner.dirs_for("worktree remove /work/repo-9"),
            vec![PathBuf::from("/work/repo")]
        );
    }

    #[test]
    fn test_create_outside_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let wts = Worktrees::new(&SystemRunner, tmp.path());
        assert!(matches!(wts.create("42", "main"), Err(Error::NotARepository)));
    }

    #[test]
    fn test_create_get_remove_round_trip() {
        let (repo, _tmp) = testutil::setup_repo();
        let wts = Worktrees::new(&SystemRunner, &repo);

        let path = wts.create("42", "main").unwrap();
        assert!(path.to_string_lossy().ends_with("-42"), "{}", path.display());
        assert_eq!(path, repo.parent().unwrap().join("repo-42"));
        assert!(path.exists());

        let wt = wts.get_for_identifier("42").unwrap();
        assert_eq!(wt.branch, "42/impl");
        assert!(!wt.is_detached);

        let removed = wts.remove("42", false).unwrap();
        assert_eq!(removed.branch, "42/impl");
        assert!(!path.exists());
        assert!(matches!(wts.get_for_identifier("42"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_create_duplicate_fails() {
        let (repo, _tmp) = testutil::setup_repo();
        let wts = Worktrees::new(&SystemRunner, &repo);
        wts.create("7", "main").unwrap();
        assert!(matches!(wts.create("7", "main"), Err(Error::CreateFailed(_))));
    }

    #[test]
    fn test_create_branch_identifier() {
        let (repo, _tmp) = testutil::setup_repo();
        let wts = Worktrees::new(&SystemRunner, &repo);
        let path = wts.create("feature/x", "main").unwrap();
        assert!(path.ends_with("repo-feature-x"));
        let wt = wts.get_for_identifier("feature/x").unwrap();
        assert_eq!(wt.branch, "feature/x");
    }

    #[test]
    fn test_repo_root_from_linked_worktree() {
        let (repo, _tmp) = testutil::setup_repo();
        let path = Worktrees::new(&SystemRunner, &repo).create("5", "main").unwrap();
        let from_linked = Worktrees::new(&SystemRunner, &path);
        assert_eq!(from_linked.repo_root().unwrap(), repo);

        let list = from_linked.list().unwrap();
        let current: Vec<_> = list.iter().filter(|w| w.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].branch, "5/impl");
    }

    #[test]
    fn test_create_from_local_branch() {
        let (repo, _tmp) = testutil::setup_repo();
        testutil::run_git(&repo, &["branch", "topic"]);
        let wts = Worktrees::new(&SystemRunner, &repo);
        let path = repo.parent().unwrap().join("repo-topic");

        wts.create_from_branch(&path, "topic", "ignored").unwrap();
        let wt = wts.get_for_identifier("topic").unwrap();
        assert_eq!(wt.branch, "topic");
    }

    #[test]
    fn test_create_from_remote_branch_tracks() {
        let (clone, source, _ct, _st) = testutil::setup_clone_repo();
        testutil::run_git(&source, &["branch", "remote-topic"]);
        testutil::run_git(&clone, &["fetch", "origin"]);

        let wts = Worktrees::new(&SystemRunner, &clone);
        let path = clone.parent().unwrap().join("repo-remote-topic");
        wts.create_from_branch(&path, "origin/remote-topic", "remote-topic")
            .unwrap();

        let upstream = testutil::run_git(
            &path,
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"],
        );
        assert_eq!(upstream, "origin/remote-topic");
    }

    #[test]
    fn test_delete_branch() {
        let (repo, _tmp) = testutil::setup_repo();
        let wts = Worktrees::new(&SystemRunner, &repo);
        wts.create("8", "main").unwrap();
        wts.remove("8", false).unwrap();
        wts.delete_branch("8/impl").unwrap();
        assert!(wts.delete_branch("8/impl").is_err());
    }
}

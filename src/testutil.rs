//! Shared test utilities: a scripted runner double and real-git fixtures.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::process::{ProcessError, Runner};

/// Scripted [`Runner`] keyed by the space-joined argument list.
/// Unscripted commands fail, and every call is recorded.
#[derive(Default)]
pub struct FakeRunner {
    responses: RefCell<HashMap<String, Result<String, String>>>,
    calls: RefCell<Vec<(PathBuf, String)>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, args: &str, stdout: &str) -> Self {
        self.responses
            .borrow_mut()
            .insert(args.to_string(), Ok(stdout.to_string()));
        self
    }

    pub fn fail(self, args: &str, output: &str) -> Self {
        self.responses
            .borrow_mut()
            .insert(args.to_string(), Err(output.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn was_called(&self, args: &str) -> bool {
        self.calls.borrow().iter().any(|(_, c)| c == args)
    }

    pub fn dirs_for(&self, args: &str) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .filter(|(_, c)| c == args)
            .map(|(d, _)| d.clone())
            .collect()
    }
}

impl Runner for FakeRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<String, ProcessError> {
        let key = args.join(" ");
        self.calls
            .borrow_mut()
            .push((dir.to_path_buf(), key.clone()));
        let failed = |output: String| ProcessError::Failed {
            command: format!("{} {}", program, key),
            dir: dir.display().to_string(),
            status: "exit status: 128".into(),
            code: Some(128),
            output,
        };
        match self.responses.borrow().get(&key) {
            Some(Ok(out)) => Ok(out.clone()),
            Some(Err(out)) => Err(failed(out.clone())),
            None => Err(failed(format!("unscripted command: {}", key))),
        }
    }
}

/// Runs git in `dir`, asserting success, and returns trimmed stdout.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git {:?}: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    run_git(dir, &["config", "user.email", "test@test.com"]);
    run_git(dir, &["config", "user.name", "Test"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Creates a repo named `repo` with a single commit on main.
/// Returns (repo_dir, tempdir). The tempdir also hosts sibling worktrees.
pub fn setup_repo() -> (PathBuf, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().canonicalize().unwrap().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    run_git(&repo, &["init", "--initial-branch=main"]);
    configure_identity(&repo);
    run_git(&repo, &["commit", "--allow-empty", "-m", "initial"]);
    (repo, tmp)
}

/// Creates a source repo with a single commit on main and clones it.
/// The clone is left on `main`, tracking `origin/main`.
/// Returns (clone_dir, source_dir, clone_tempdir, source_tempdir).
pub fn setup_clone_repo() -> (PathBuf, PathBuf, tempfile::TempDir, tempfile::TempDir) {
    let (source, source_tmp) = setup_repo();

    let clone_tmp = tempfile::tempdir().unwrap();
    let clone_dir = clone_tmp.path().canonicalize().unwrap().join("repo");
    let out = Command::new("git")
        .args([
            "clone",
            source.to_str().unwrap(),
            clone_dir.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "clone: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    configure_identity(&clone_dir);

    (clone_dir, source, clone_tmp, source_tmp)
}

/// Commits a file in a repo on the current branch.
pub fn local_commit(dir: &Path, file: &str, content: &str) {
    std::fs::write(dir.join(file), content).unwrap();
    run_git(dir, &["add", file]);
    run_git(dir, &["commit", "-m", &format!("add {}", file)]);
}

use std::path::Path;

use clap_complete::engine::CompletionCandidate;

use crate::process::SystemRunner;
use crate::worktree::{Worktree, Worktrees};

/// The identifier a worktree was created for: its directory name with the
/// `<repo>-` prefix removed.
fn identifier_of(wt: &Worktree, repo_root: &Path) -> Option<String> {
    if wt.path == repo_root {
        return None;
    }
    let name = wt.path.file_name()?.to_string_lossy().into_owned();
    let repo_name = repo_root.file_name()?.to_string_lossy().into_owned();
    let prefix = format!("{}-", repo_name);
    Some(name.strip_prefix(&prefix).unwrap_or(&name).to_string())
}

pub fn complete_identifiers() -> Vec<CompletionCandidate> {
    let Ok(cwd) = std::env::current_dir() else {
        return Vec::new();
    };
    let runner = SystemRunner;
    let wts = Worktrees::new(&runner, &cwd);
    let (Ok(root), Ok(list)) = (wts.repo_root(), wts.list()) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|wt| {
            let id = identifier_of(wt, &root)?;
            Some(CompletionCandidate::new(id).help(Some(wt.branch.clone().into())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn wt(path: &str) -> Worktree {
        Worktree {
            path: PathBuf::from(path),
            branch: "42/impl".into(),
            commit: String::new(),
            is_detached: false,
            is_current: false,
        }
    }

    #[test]
    fn test_identifier_of() {
        let root = Path::new("/work/repo");
        assert_eq!(identifier_of(&wt("/work/repo-42"), root).as_deref(), Some("42"));
        assert_eq!(identifier_of(&wt("/trees/other"), root).as_deref(), Some("other"));
        assert_eq!(identifier_of(&wt("/work/repo"), root), None);
    }
}

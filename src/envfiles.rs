use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::git::Git;
use crate::process::Runner;

const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// An untracked local file, such as `.env.local`, that a fresh worktree
/// would otherwise lack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvFile {
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
}

/// Finds files under `repo_root` whose name starts with one of `prefixes`
/// and that git does not track. Sorted by relative path.
pub fn discover(runner: &dyn Runner, repo_root: &Path, prefixes: &[String]) -> Result<Vec<EnvFile>> {
    let tracked = Git::new(runner)
        .ls_files(repo_root)
        .context("listing tracked files")?;

    let mut found = Vec::new();
    for entry in WalkDir::new(repo_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !SKIPPED_DIRS.iter().any(|d| *d == name)
        })
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(repo_root) else {
            continue;
        };
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if tracked.iter().any(|t| *t == rel_str) {
            continue;
        }
        found.push(EnvFile {
            relative_path: rel.to_path_buf(),
            absolute_path: entry.path().to_path_buf(),
        });
    }

    found.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(found)
}

/// Copies each file to the same relative path under `dest`. Existing
/// files are replaced atomically.
pub fn copy_into(files: &[EnvFile], dest: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for f in files {
        let target = dest.join(&f.relative_path);
        let dir = target.parent().unwrap_or(dest);
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let data = fs::read(&f.absolute_path)
            .with_context(|| format!("reading {}", f.absolute_path.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).context("creating temp file")?;
        tmp.write_all(&data).context("writing temp file")?;
        tmp.persist(&target)
            .with_context(|| format!("writing {}", target.display()))?;

        debug!(file = %f.relative_path.display(), "copied env file");
        copied.push(target);
    }
    Ok(copied)
}

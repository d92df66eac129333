use std::path::Path;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

use crate::config::Paths;
use crate::git::Git;
use crate::names;
use crate::output::{CreateOutput, Output};
use crate::process::SystemRunner;

pub fn cmd() -> Command {
    Command::new("checkout")
        .about("Create a worktree for an existing local or remote branch")
        .arg(
            Arg::new("branch")
                .required(true)
                .help("Branch to check out (e.g. feature/login, origin/feature/login)"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Local branch name when checking out a remote branch"),
        )
}

/// Drops a leading `<remote>/` when `branch` names a remote-tracking ref.
pub fn local_name(branch: &str, remotes: &[String]) -> String {
    for remote in remotes {
        if let Some(rest) = branch.strip_prefix(&format!("{}/", remote))
            && !rest.is_empty()
        {
            return rest.to_string();
        }
    }
    branch.to_string()
}

/// Local branch name for the new worktree: `--name` when given, else
/// `source` without its remote prefix.
fn target_branch(git: Git, root: &Path, source: &str, name: Option<&String>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name.clone());
    }
    let remotes = git.remotes(root).context("listing remotes")?;
    Ok(local_name(source, &remotes))
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let source = super::required(matches, "branch")?;
    let cfg = super::load_config(paths)?;

    let runner = SystemRunner;
    let wts = super::worktrees(&runner, &cfg)?;
    let root = wts.repo_root()?;

    let target = target_branch(wts.git(), &root, source, matches.get_one::<String>("name"))?;
    let path = wts.path_for(&root, &names::sanitize(&target));

    eprintln!("Checking out {} into {}...", source, path.display());
    wts.create_from_branch(&path, source, &target)?;

    Ok(Output::Create(CreateOutput {
        path: path.display().to_string(),
        branch: target,
        env_files: Vec::new(),
    }))
}

use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::Paths;
use crate::envfiles;
use crate::names;
use crate::output::{CreateOutput, Output};
use crate::process::SystemRunner;

pub fn cmd() -> Command {
    Command::new("new")
        .about("Create a worktree and branch for an issue or feature")
        .arg(
            Arg::new("identifier")
                .required(true)
                .help("Issue number or branch-like name (e.g. 42, feature/login)"),
        )
        .arg(
            Arg::new("base")
                .short('b')
                .long("base")
                .help("Branch to start from (default: base_branch from config)"),
        )
        .arg(
            Arg::new("no-env")
                .long("no-env")
                .action(ArgAction::SetTrue)
                .help("Do not copy untracked env files into the worktree"),
        )
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let identifier = super::required(matches, "identifier")?;
    if identifier.trim().is_empty() {
        bail!("identifier must not be empty");
    }

    let cfg = super::load_config(paths)?;
    let base = matches
        .get_one::<String>("base")
        .cloned()
        .unwrap_or_else(|| cfg.base_branch.clone());

    let runner = SystemRunner;
    let wts = super::worktrees(&runner, &cfg)?;
    let branch = names::resolve(identifier).branch_name;

    eprintln!("Creating worktree for {} (branch: {}, from {})...", identifier, branch, base);
    let path = wts.create(identifier, &base)?;

    let mut env_files = Vec::new();
    if !matches.get_flag("no-env") {
        let root = wts.repo_root()?;
        match envfiles::discover(&runner, &root, &cfg.env_prefixes)
            .and_then(|files| envfiles::copy_into(&files, &path).map(|_| files))
        {
            Ok(files) => {
                env_files = files
                    .iter()
                    .map(|f| f.relative_path.display().to_string())
                    .collect();
            }
            Err(e) => eprintln!("warning: env files not copied: {:#}", e),
        }
    }

    Ok(Output::Create(CreateOutput {
        path: path.display().to_string(),
        branch,
        env_files,
    }))
}

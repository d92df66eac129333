use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::Paths;
use crate::output::{CleanOutput, Output};
use crate::process::SystemRunner;
use crate::removal::{CleanOptions, Remover, TerminalPrompt};
use crate::status::StatusInspector;

pub fn cmd() -> Command {
    Command::new("clean")
        .about("Remove every worktree that is committed, pushed and merged")
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Show what would be removed without removing anything"),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Skip the confirmation prompt"),
        )
        .arg(
            Arg::new("keep-branch")
                .long("keep-branch")
                .action(ArgAction::SetTrue)
                .help("Keep local branches of removed worktrees"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .help("Branch worktrees must be merged into (default: base_branch from config)"),
        )
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let cfg = super::load_config(paths)?;

    let runner = SystemRunner;
    let wts = super::worktrees(&runner, &cfg)?;
    let inspector = StatusInspector::new(&runner).with_remote(&cfg.remote);
    let prompt = TerminalPrompt { assume_yes: false };
    let remover = Remover::new(&wts, &inspector, &prompt, cfg.trunk_branches.clone());

    let opts = CleanOptions {
        dry_run: matches.get_flag("dry-run"),
        force: matches.get_flag("force"),
        delete_branch: cfg.delete_branch && !matches.get_flag("keep-branch"),
        target_branch: matches
            .get_one::<String>("target")
            .cloned()
            .unwrap_or_else(|| cfg.base_branch.clone()),
    };

    eprintln!(
        "Checking worktrees against {}/{}...",
        inspector.remote(),
        opts.target_branch
    );
    let summary = remover.clean_all(&opts)?;
    Ok(Output::Clean(CleanOutput::from(summary)))
}

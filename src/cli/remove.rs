use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;

use crate::config::Paths;
use crate::output::{Output, RemoveOutput};
use crate::process::SystemRunner;
use crate::removal::{RemovalTarget, RemoveOptions, Remover, TerminalPrompt};
use crate::status::StatusInspector;

use super::completers;

pub fn cmd() -> Command {
    Command::new("rm")
        .visible_alias("remove")
        .about("Remove a worktree after checking it is safe to delete")
        .arg(
            Arg::new("identifier")
                .required(true)
                .add(ArgValueCandidates::new(completers::complete_identifiers)),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Skip safety checks and confirmation (git still refuses to drop local changes)"),
        )
        .arg(
            Arg::new("keep-branch")
                .long("keep-branch")
                .action(ArgAction::SetTrue)
                .help("Keep the local branch after removing the worktree"),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .action(ArgAction::SetTrue)
                .help("Answer yes to confirmation prompts"),
        )
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let identifier = super::required(matches, "identifier")?;
    let cfg = super::load_config(paths)?;

    let runner = SystemRunner;
    let wts = super::worktrees(&runner, &cfg)?;
    let inspector = StatusInspector::new(&runner).with_remote(&cfg.remote);
    let prompt = TerminalPrompt {
        assume_yes: matches.get_flag("yes"),
    };
    let remover = Remover::new(&wts, &inspector, &prompt, cfg.trunk_branches.clone());

    let opts = RemoveOptions {
        force: matches.get_flag("force"),
        delete_branch: cfg.delete_branch && !matches.get_flag("keep-branch"),
        target_branch: cfg.base_branch.clone(),
    };

    eprintln!("Removing worktree {}...", identifier);
    let report = remover.remove_one(RemovalTarget::Identifier(identifier.to_string()), &opts)?;
    Ok(Output::Remove(RemoveOutput::from(report)))
}

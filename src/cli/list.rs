use anyhow::Result;
use clap::{ArgMatches, Command};

use crate::config::Paths;
use crate::output::{Output, WorktreeEntry, WorktreeListOutput};
use crate::process::SystemRunner;

pub fn cmd() -> Command {
    Command::new("list")
        .visible_alias("ls")
        .about("List worktrees of the current repository")
}

pub fn run(_matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let cfg = super::load_config(paths)?;
    let runner = SystemRunner;
    let wts = super::worktrees(&runner, &cfg)?;

    let worktrees = wts.list()?.iter().map(WorktreeEntry::from).collect();
    Ok(Output::WorktreeList(WorktreeListOutput { worktrees }))
}

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;

use crate::config::Paths;
use crate::output::{Output, PathOutput};
use crate::process::SystemRunner;

use super::completers;

pub fn cmd() -> Command {
    Command::new("path")
        .about("Print the directory of a worktree (use with `cd $(wtm path 42)`)")
        .arg(
            Arg::new("identifier")
                .required(true)
                .add(ArgValueCandidates::new(completers::complete_identifiers)),
        )
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let identifier = super::required(matches, "identifier")?;
    let cfg = super::load_config(paths)?;
    let runner = SystemRunner;
    let wts = super::worktrees(&runner, &cfg)?;

    let wt = wts.get_for_identifier(identifier)?;
    Ok(Output::Path(PathOutput {
        path: wt.path.display().to_string(),
    }))
}

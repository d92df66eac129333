pub mod checkout;
pub mod clean;
pub mod completers;
pub mod list;
pub mod new;
pub mod path;
pub mod remove;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::{Config, Paths};
use crate::output::Output;
use crate::process::Runner;
use crate::worktree::Worktrees;

pub fn build_cli() -> Command {
    Command::new("wtm")
        .about("Git worktree manager for issue and feature branches")
        .version(env!("WTM_VERSION_STRING"))
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log git invocations to stderr"),
        )
        .subcommand(new::cmd())
        .subcommand(checkout::cmd())
        .subcommand(list::cmd())
        .subcommand(path::cmd())
        .subcommand(remove::cmd())
        .subcommand(clean::cmd())
}

pub fn dispatch(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    match matches.subcommand() {
        Some(("new", m)) => new::run(m, paths),
        Some(("checkout", m)) => checkout::run(m, paths),
        Some(("list", m)) => list::run(m, paths),
        Some(("path", m)) => path::run(m, paths),
        Some(("rm", m)) => remove::run(m, paths),
        Some(("clean", m)) => clean::run(m, paths),
        _ => unreachable!(),
    }
}

fn load_config(paths: &Paths) -> Result<Config> {
    Config::load_from(&paths.config_path).context("loading config")
}

/// Worktree access rooted at the invocation directory.
fn worktrees<'r>(runner: &'r dyn Runner, cfg: &Config) -> Result<Worktrees<'r>> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(Worktrees::new(runner, &cwd).with_worktree_dir(cfg.worktree_dir.clone()))
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing <{}>", id))
}

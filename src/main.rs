mod cli;
mod config;
mod envfiles;
mod error;
mod git;
mod names;
mod output;
mod process;
mod removal;
mod safety;
mod status;
#[cfg(test)]
mod testutil;
mod worktree;

use std::process::exit;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap_complete::CompleteEnv;
use tracing_subscriber::EnvFilter;

fn main() {
    CompleteEnv::with_factory(cli::build_cli).complete();

    let interrupted = Arc::new(AtomicBool::new(false));
    let i = interrupted.clone();
    let _ = ctrlc::set_handler(move || {
        i.store(true, Ordering::SeqCst);
    });

    let app = cli::build_cli();
    let matches = app.get_matches();
    let json = matches.get_flag("json");
    init_logging(matches.get_flag("verbose"));

    let paths = match config::Paths::resolve() {
        Ok(p) => p,
        Err(err) => {
            render_error(err, json);
            exit(1);
        }
    };

    match cli::dispatch(&matches, &paths) {
        Ok(out) => {
            let code = output::exit_code(&out);
            if let Err(err) = output::render(out, json) {
                render_error(err, json);
                exit(1);
            }
            exit(code);
        }
        Err(err) => {
            if interrupted.load(Ordering::SeqCst) {
                exit(130);
            }
            render_error(err, json);
            exit(1);
        }
    }
}

/// Logs go to stderr. `WTM_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("WTM_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn render_error(err: anyhow::Error, json: bool) {
    if json {
        let _ = serde_json::to_string_pretty(&output::ErrorOutput {
            error: format!("{:#}", err),
        })
        .map(|s| println!("{}", s));
    } else {
        eprintln!("Error: {:#}", err);
    }
}

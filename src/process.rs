use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Outcome classification for a failed subprocess.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("{program} not found in PATH")]
    NotFound { program: String },

    #[error("{command} (in {dir}): {status}\n{output}")]
    Failed {
        command: String,
        dir: String,
        status: String,
        code: Option<i32>,
        output: String,
    },

    #[error("running {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Combined stdout/stderr of a command that exited non-zero.
    pub fn output(&self) -> &str {
        match self {
            ProcessError::Failed { output, .. } => output,
            _ => "",
        }
    }
}

/// Runs an external command in a directory and returns its stdout.
///
/// Exit code 0 is success. A non-zero exit yields [`ProcessError::Failed`]
/// carrying the combined output, and a missing executable yields
/// [`ProcessError::NotFound`]. Implementations block until the child exits.
pub trait Runner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<String, ProcessError>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<String, ProcessError> {
        let command = format!("{} {}", program, args.join(" "));
        debug!(dir = %dir.display(), %command, "running");

        let output = match Command::new(program).args(args).current_dir(dir).output() {
            Ok(o) => o,
            Err(e) if e.kind() == ErrorKind::NotFound && dir.is_dir() => {
                return Err(ProcessError::NotFound {
                    program: program.to_string(),
                });
            }
            Err(e) => return Err(ProcessError::Io { command, source: e }),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let combined = format!("{}{}", stdout, stderr).trim().to_string();
            debug!(%command, status = %output.status, "command failed");
            return Err(ProcessError::Failed {
                command,
                dir: dir.display().to_string(),
                status: output.status.to_string(),
                code: output.status.code(),
                output: combined,
            });
        }

        Ok(stdout)
    }
}

use std::path::PathBuf;

/// Errors surfaced by the worktree core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not inside a git repository")]
    NotARepository,

    #[error("no worktree found for {0:?}")]
    NotFound(String),

    #[error("creating worktree: {0}")]
    CreateFailed(String),

    #[error("removing worktree: {0}")]
    RemoveFailed(String),

    #[error("status check failed: {0}")]
    StatusCheckFailed(String),

    #[error("invalid git repository: {}", .0.display())]
    InvalidWorkspace(PathBuf),

    #[error("confirmation prompt failed: {0}")]
    Prompt(String),

    #[error("removed {removed} worktree(s), {failed} failed")]
    BatchFailed { removed: usize, failed: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

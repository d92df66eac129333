use serde::Serialize;
use tracing::warn;

use crate::error::Error;
use crate::status::{DirScope, StatusInspector};

pub const WARN_INVALID_REPOSITORY: &str = "invalid git repository";
pub const WARN_UNCOMMITTED: &str = "has uncommitted changes";
pub const WARN_UNPUSHED: &str = "has unpushed commits";

/// Whether a worktree is safe to delete, and why not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyVerdict {
    pub can_remove: bool,
    pub warnings: Vec<String>,
}

impl SafetyVerdict {
    fn from_warnings(warnings: Vec<String>) -> Self {
        SafetyVerdict {
            can_remove: warnings.is_empty(),
            warnings,
        }
    }
}

/// Runs the three status checks in `scope` and collects warnings in a
/// fixed order: uncommitted, unpushed, not merged.
///
/// A failed check becomes a warning of its own and blocks removal without
/// stopping the later checks. The one exception is a worktree git no
/// longer recognises: the evaluation stops at a single
/// "invalid git repository" warning.
pub fn evaluate(inspector: &StatusInspector, scope: &DirScope, target_branch: &str) -> SafetyVerdict {
    let mut warnings = Vec::new();

    match inspector.has_uncommitted_changes(scope) {
        Ok(false) => {}
        Ok(true) => warnings.push(WARN_UNCOMMITTED.to_string()),
        Err(Error::InvalidWorkspace(path)) => {
            warn!(path = %path.display(), "worktree is not a valid git repository");
            return SafetyVerdict::from_warnings(vec![WARN_INVALID_REPOSITORY.to_string()]);
        }
        Err(e) => warnings.push(format!("failed to check uncommitted changes: {}", e)),
    }

    match inspector.has_unpushed_commits(scope) {
        Ok(false) => {}
        Ok(true) => warnings.push(WARN_UNPUSHED.to_string()),
        Err(e) => warnings.push(format!("failed to check unpushed commits: {}", e)),
    }

    match inspector.is_merged_to_origin(scope, target_branch) {
        Ok(true) => {}
        Ok(false) => warnings.push(format!(
            "not merged to {}/{}",
            inspector.remote(),
            target_branch
        )),
        Err(e) => warnings.push(format!("failed to check merge status: {}", e)),
    }

    SafetyVerdict::from_warnings(warnings)
}

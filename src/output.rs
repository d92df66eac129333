use std::io::Write;

use anyhow::{Result, bail};
use serde::Serialize;
use tabwriter::TabWriter;

use crate::removal::{Candidate, CleanSummary, RemoveReport};
use crate::worktree::Worktree;

// ---------------------------------------------------------------------------
// Table helper
// ---------------------------------------------------------------------------

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    dest: Box<dyn Write>,
}

impl Table {
    pub fn new(w: Box<dyn Write>, headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
            dest: w,
        }
    }

    pub fn add_row(&mut self, columns: Vec<String>) -> Result<()> {
        if columns.len() != self.headers.len() {
            bail!(
                "row has {} columns, expected {}",
                columns.len(),
                self.headers.len()
            );
        }
        self.rows.push(columns);
        Ok(())
    }

    pub fn render(&mut self) -> Result<()> {
        if self.headers.is_empty() {
            return Ok(());
        }

        let buf = render_buf(&self.headers, &self.rows)?;
        self.dest.write_all(&buf)?;
        Ok(())
    }
}

fn render_buf(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut tw = TabWriter::new(Vec::new()).minwidth(0).padding(2);

    let upper: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    writeln!(tw, "{}", upper.join("\t"))?;

    for row in rows {
        writeln!(tw, "{}", row.join("\t"))?;
    }

    tw.flush()?;
    Ok(tw.into_inner()?)
}

pub fn format_branch(branch: &str, detached: bool) -> String {
    if detached || branch.is_empty() {
        "(detached)".to_string()
    } else {
        branch.to_string()
    }
}

// ---------------------------------------------------------------------------
// JSON-serializable output types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct WorktreeListOutput {
    pub worktrees: Vec<WorktreeEntry>,
}

#[derive(Serialize)]
pub struct WorktreeEntry {
    pub path: String,
    pub branch: String,
    pub commit: String,
    pub detached: bool,
    pub current: bool,
}

impl From<&Worktree> for WorktreeEntry {
    fn from(wt: &Worktree) -> Self {
        WorktreeEntry {
            path: wt.path.display().to_string(),
            branch: wt.branch.clone(),
            commit: wt.commit.clone(),
            detached: wt.is_detached,
            current: wt.is_current,
        }
    }
}

#[derive(Serialize)]
pub struct CreateOutput {
    pub path: String,
    pub branch: String,
    pub env_files: Vec<String>,
}

#[derive(Serialize)]
pub struct RemoveOutput {
    pub path: String,
    pub branch: String,
    pub removed: bool,
    pub warnings: Vec<String>,
    pub branch_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_error: Option<String>,
}

impl From<RemoveReport> for RemoveOutput {
    fn from(r: RemoveReport) -> Self {
        RemoveOutput {
            path: r.worktree.path.display().to_string(),
            branch: r.worktree.branch,
            removed: r.removed,
            warnings: r.warnings,
            branch_deleted: r.branch_deleted,
            branch_error: r.branch_error,
        }
    }
}

#[derive(Serialize)]
pub struct CleanOutput {
    pub dry_run: bool,
    pub aborted: bool,
    pub removable: Vec<CleanEntry>,
    pub kept: Vec<CleanEntry>,
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branch_errors: Vec<String>,
}

#[derive(Serialize)]
pub struct CleanEntry {
    pub path: String,
    pub branch: String,
    pub warnings: Vec<String>,
}

impl From<&Candidate> for CleanEntry {
    fn from(c: &Candidate) -> Self {
        CleanEntry {
            path: c.worktree.path.display().to_string(),
            branch: c.worktree.branch.clone(),
            warnings: c.warnings.clone(),
        }
    }
}

impl From<CleanSummary> for CleanOutput {
    fn from(s: CleanSummary) -> Self {
        CleanOutput {
            dry_run: s.dry_run,
            aborted: s.aborted,
            removable: s.plan.removable.iter().map(CleanEntry::from).collect(),
            kept: s.plan.blocked.iter().map(CleanEntry::from).collect(),
            removed: s.removed.iter().map(|p| p.display().to_string()).collect(),
            branch_errors: s.branch_errors,
        }
    }
}

#[derive(Serialize)]
pub struct PathOutput {
    pub path: String,
}

#[derive(Serialize)]
pub struct ErrorOutput {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Output enum returned by every command handler
// ---------------------------------------------------------------------------

pub enum Output {
    WorktreeList(WorktreeListOutput),
    Create(CreateOutput),
    Remove(RemoveOutput),
    Clean(CleanOutput),
    Path(PathOutput),
}

// ---------------------------------------------------------------------------
// Central render function
// ---------------------------------------------------------------------------

pub fn render(output: Output, json: bool) -> Result<()> {
    if json {
        return match output {
            Output::WorktreeList(v) => print_json(&v),
            Output::Create(v) => print_json(&v),
            Output::Remove(v) => print_json(&v),
            Output::Clean(v) => print_json(&v),
            Output::Path(v) => print_json(&v),
        };
    }
    match output {
        Output::WorktreeList(v) => render_worktree_list_table(v),
        Output::Create(v) => render_create_text(v),
        Output::Remove(v) => render_remove_text(v),
        Output::Clean(v) => render_clean_text(v),
        Output::Path(v) => render_path_text(v),
    }
}

/// Non-zero when the user declined and nothing was removed.
pub fn exit_code(output: &Output) -> i32 {
    match output {
        Output::Remove(v) if !v.removed => 1,
        Output::Clean(v) if v.aborted => 1,
        _ => 0,
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Text/table renderers
// ---------------------------------------------------------------------------

fn render_worktree_list_table(v: WorktreeListOutput) -> Result<()> {
    if v.worktrees.is_empty() {
        println!("No worktrees.");
        return Ok(());
    }
    let mut table = Table::new(
        Box::new(std::io::stdout()),
        vec![
            String::new(),
            "Path".to_string(),
            "Branch".to_string(),
            "Commit".to_string(),
        ],
    );
    for wt in &v.worktrees {
        let marker = if wt.current { "*" } else { "" };
        let commit: String = wt.commit.chars().take(7).collect();
        table.add_row(vec![
            marker.to_string(),
            wt.path.clone(),
            format_branch(&wt.branch, wt.detached),
            commit,
        ])?;
    }
    table.render()
}

fn render_create_text(v: CreateOutput) -> Result<()> {
    for f in &v.env_files {
        eprintln!("  copied {}", f);
    }
    println!("Worktree created: {} (branch: {})", v.path, v.branch);
    Ok(())
}

fn render_remove_text(v: RemoveOutput) -> Result<()> {
    if !v.removed {
        println!("Kept {}", v.path);
        return Ok(());
    }
    println!("Removed {}", v.path);
    if v.branch_deleted {
        println!("Deleted branch {}", v.branch);
    }
    if let Some(e) = &v.branch_error {
        eprintln!("warning: {}", e);
    }
    Ok(())
}

fn render_clean_text(v: CleanOutput) -> Result<()> {
    if v.removable.is_empty() && v.kept.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }
    if v.dry_run {
        println!(
            "Dry run: {} removable, {} kept",
            v.removable.len(),
            v.kept.len()
        );
        return Ok(());
    }
    if v.aborted {
        println!("Aborted.");
        return Ok(());
    }
    println!("Removed {} worktree(s), kept {}", v.removed.len(), v.kept.len());
    for e in &v.branch_errors {
        eprintln!("warning: {}", e);
    }
    Ok(())
}

fn render_path_text(v: PathOutput) -> Result<()> {
    println!("{}", v.path);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

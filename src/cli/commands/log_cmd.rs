//! log and show commands - Display history

use super::resolve_commit;
use crate::cli::Context;
use crate::core::types::Oid;
use crate::repo::{Commit, FlatTree, LogEntry, Repository};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Show the commits reachable from `start`.
pub fn log(ctx: &Context, start: &str, oneline: bool, json: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let oid = resolve_commit(&repo, start)?;
    let entries = repo.graph().log(&oid).context("Failed to read history")?;

    if json {
        let text = serde_json::to_string_pretty(&entries).context("Failed to serialize log")?;
        output::data(text);
        return Ok(());
    }

    for entry in &entries {
        if oneline {
            output::data(format_oneline(entry));
        } else {
            let refs = output::format_refs(&entry.refs);
            output::data(format_entry(&entry.oid, &entry.commit, &refs));
        }
    }
    Ok(())
}

/// Show one commit and the changes it introduced relative to its first
/// parent.
pub fn show(ctx: &Context, name: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let oid = resolve_commit(&repo, name)?;
    let commit = repo.graph().read_commit(&oid)?;

    output::data(format_entry(&oid, &commit, ""));

    let to = repo.trees().flatten_tree(&commit.tree)?;
    let from = match commit.parents.first() {
        Some(parent) => parent_tree(&repo, parent)?,
        None => FlatTree::new(),
    };
    for lines in repo.diff().diff_trees(&from, &to, true)?.into_values().flatten() {
        for line in lines {
            output::data(line);
        }
    }
    Ok(())
}

fn parent_tree(repo: &Repository, parent: &Oid) -> Result<FlatTree> {
    let commit = repo.graph().read_commit(parent)?;
    Ok(repo.trees().flatten_tree(&commit.tree)?)
}

fn format_oneline(entry: &LogEntry) -> String {
    let summary = entry.commit.message.lines().next().unwrap_or_default();
    let refs = output::format_refs(&entry.refs);
    if refs.is_empty() {
        format!("{} {}", output::format_oid(&entry.oid), summary)
    } else {
        format!("{} {} {}", output::format_oid(&entry.oid), refs, summary)
    }
}

/// Full commit block: id line, parents, then the indented message.
fn format_entry(oid: &Oid, commit: &Commit, refs: &str) -> String {
    let mut text = format!("commit {}", oid);
    if !refs.is_empty() {
        text.push(' ');
        text.push_str(refs);
    }
    text.push('\n');
    if commit.parents.len() > 1 {
        let parents: Vec<&str> = commit.parents.iter().map(output::format_oid).collect();
        text.push_str(&format!("Merge: {}\n", parents.join(" ")));
    }
    text.push('\n');
    for line in commit.message.lines() {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text
}

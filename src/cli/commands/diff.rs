//! diff and status commands - Compare the working directory with history

use super::resolve_commit;
use crate::cli::Context;
use crate::repo::diff::changed_files;
use crate::repo::{HeadState, Status};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Compare a commit with the working directory.
pub fn diff(ctx: &Context, commit: &str, name_only: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let engine = repo.diff();

    let from = if repo.refs().head_oid()?.is_none() && (commit == "@" || commit == "HEAD") {
        Default::default()
    } else {
        let oid = resolve_commit(&repo, commit)?;
        let commit = repo.graph().read_commit(&oid)?;
        repo.trees().flatten_tree(&commit.tree)?
    };
    let to = engine
        .working_tree()
        .context("Failed to snapshot working directory")?;

    if name_only {
        for (path, status) in changed_files(&from, &to) {
            if status.is_change() {
                output::data(path);
            }
        }
        return Ok(());
    }

    for lines in engine.diff_trees(&from, &to, true)?.into_values().flatten() {
        for line in lines {
            output::data(line);
        }
    }
    Ok(())
}

/// Show where HEAD is and which files differ from it.
pub fn status(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let status = repo.diff().status().context("Failed to compute status")?;

    if ctx.quiet {
        for (path, file_status) in &status.changes {
            output::data(format!("{}\t{}", file_status, path));
        }
        return Ok(());
    }

    output::data(format_status(&status));
    Ok(())
}

fn format_status(status: &Status) -> String {
    let mut lines = vec![match &status.head {
        HeadState::Attached(branch) => format!("On branch {}", branch),
        HeadState::Detached(oid) => format!("HEAD detached at {}", output::format_oid(oid)),
    }];
    if let Some(merge_head) = &status.merge_head {
        lines.push(format!("Merging with {}", output::format_oid(merge_head)));
    }

    if status.changes.is_empty() {
        lines.push("nothing to commit, working tree clean".to_string());
    } else {
        lines.push(String::new());
        lines.push("Changes to be committed:".to_string());
        for (path, file_status) in &status.changes {
            lines.push(format!("    {:>10}: {}", file_status.as_str(), path));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BranchName, Oid};
    use crate::repo::FileStatus;

    #[test]
    fn clean_status() {
        let status = Status {
            head: HeadState::Attached(BranchName::new("master").unwrap()),
            merge_head: None,
            changes: vec![],
        };
        assert_eq!(
            format_status(&status),
            "On branch master\nnothing to commit, working tree clean"
        );
    }

    #[test]
    fn status_lists_changes_and_merge() {
        let oid = Oid::new("ab".repeat(20)).unwrap();
        let status = Status {
            head: HeadState::Detached(oid.clone()),
            merge_head: Some(oid),
            changes: vec![
                ("a.txt".to_string(), FileStatus::Modified),
                ("b.txt".to_string(), FileStatus::New),
            ],
        };
        let text = format_status(&status);
        assert!(text.starts_with("HEAD detached at ababababab\nMerging with ababababab\n"));
        assert!(text.contains("      modified: a.txt"));
        assert!(text.contains("      new file: b.txt"));
    }
}

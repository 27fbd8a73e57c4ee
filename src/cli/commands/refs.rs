//! branch and tag commands - List or create references

use super::resolve_commit;
use crate::cli::Context;
use crate::core::types::{BranchName, TagName};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// List branches, or create one at `start`.
///
/// The listing marks the branch HEAD is attached to with `*`.
pub fn branch(ctx: &Context, name: Option<&str>, start: &str) -> Result<()> {
    let repo = ctx.open_repo()?;

    let Some(name) = name else {
        let current = repo.refs().head_state()?;
        for (branch, oid) in repo.refs().list_branches()? {
            let marker = if current.branch() == Some(&branch) { "*" } else { " " };
            if ctx.quiet {
                output::data(&branch);
            } else {
                output::data(format!("{} {} {}", marker, branch, output::format_oid(&oid)));
            }
        }
        return Ok(());
    };

    let branch = BranchName::new(name).context("Invalid branch name")?;
    let oid = resolve_commit(&repo, start)?;
    repo.graph()
        .create_branch(&branch, &oid)
        .with_context(|| format!("Failed to create branch '{}'", branch))?;

    output::success(
        format!("Created branch '{}' at {}", branch, output::format_oid(&oid)),
        ctx.verbosity(),
    );
    Ok(())
}

/// List tags, or create one pointing at `target`.
pub fn tag(ctx: &Context, name: Option<&str>, target: &str) -> Result<()> {
    let repo = ctx.open_repo()?;

    let Some(name) = name else {
        for (tag, oid) in repo.refs().list_tags()? {
            if ctx.quiet {
                output::data(&tag);
            } else {
                output::data(format!("{} {}", tag, output::format_oid(&oid)));
            }
        }
        return Ok(());
    };

    let tag = TagName::new(name).context("Invalid tag name")?;
    let oid = resolve_commit(&repo, target)?;
    repo.graph()
        .create_tag(&tag, &oid)
        .with_context(|| format!("Failed to create tag '{}'", tag))?;

    output::success(
        format!("Created tag '{}' at {}", tag, output::format_oid(&oid)),
        ctx.verbosity(),
    );
    Ok(())
}

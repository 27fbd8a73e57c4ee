//! Plumbing commands - direct access to objects and trees

use std::path::Path;

use crate::cli::Context;
use crate::core::types::ObjectKind;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Store a file as an object and print its id.
pub fn hash_object(ctx: &Context, file: &Path, kind: ObjectKind) -> Result<()> {
    let repo = ctx.open_repo()?;
    let path = ctx.work_dir()?.join(file);
    let payload = repo
        .fs()
        .read_file(&path)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let oid = repo.objects().put(&payload, kind)?;
    output::data(oid);
    Ok(())
}

/// Print the raw payload of an object.
pub fn cat_file(ctx: &Context, object: &str, kind: Option<ObjectKind>) -> Result<()> {
    let repo = ctx.open_repo()?;
    let oid = repo.refs().resolve_to_id(object)?;
    let payload = repo.objects().get(&oid, kind)?;
    output::raw(&payload).context("Failed to write to stdout")?;
    Ok(())
}

/// Snapshot the working directory and print the tree id.
pub fn write_tree(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let oid = repo
        .trees()
        .snapshot_directory(repo.work_dir())
        .context("Failed to snapshot working directory")?;
    output::data(oid);
    Ok(())
}

/// Replace the working directory with a stored tree.
pub fn read_tree(ctx: &Context, tree: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let oid = repo.refs().resolve_to_id(tree)?;
    repo.trees()
        .replace_working_tree(&oid)
        .with_context(|| format!("Failed to read tree {}", tree))?;

    output::success(
        format!("Working directory replaced with tree {}", output::format_oid(&oid)),
        ctx.verbosity(),
    );
    Ok(())
}

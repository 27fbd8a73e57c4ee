//! merge and merge-base commands

use super::resolve_commit;
use crate::cli::Context;
use crate::repo::MergeOutcome;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Merge a commit into HEAD.
///
/// A conflicted merge still leaves the merged files and `MERGE_HEAD` in
/// place, but exits with an error so scripts notice.
pub fn merge(ctx: &Context, name: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let outcome = repo
        .graph()
        .merge(name)
        .with_context(|| format!("Failed to merge '{}'", name))?;

    let verbosity = ctx.verbosity();
    match outcome {
        MergeOutcome::UpToDate => output::success("Already up to date.", verbosity),
        MergeOutcome::FastForward { from, to } => output::success(
            format!(
                "Fast-forward {}..{}",
                output::format_oid(&from),
                output::format_oid(&to)
            ),
            verbosity,
        ),
        MergeOutcome::Merged { base, report } => {
            if base.is_none() {
                output::warn("no common ancestor; merged without a base", verbosity);
            }
            for path in &report.conflicts {
                output::warn(format!("conflict in {}", path), verbosity);
            }
            if !report.is_clean() {
                bail!(
                    "Automatic merge left {} conflicted file(s); fix them and commit the result",
                    report.conflicts.len()
                );
            }
            output::success(
                "Merged in working tree. Please commit to record the merge.",
                verbosity,
            );
        }
    }
    Ok(())
}

/// Print the common ancestor of two commits.
pub fn merge_base(ctx: &Context, first: &str, second: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let a = resolve_commit(&repo, first)?;
    let b = resolve_commit(&repo, second)?;

    match repo.graph().merge_base(&a, &b)? {
        Some(base) => {
            output::data(base);
            Ok(())
        }
        None => bail!("{} and {} have no common ancestor", first, second),
    }
}

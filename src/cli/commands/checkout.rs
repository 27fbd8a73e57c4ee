//! checkout and reset commands - Move HEAD or the current branch

use crate::cli::Context;
use crate::repo::{HeadState, ResetMode};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Switch the working directory and HEAD to a branch or commit.
pub fn checkout(ctx: &Context, name: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let state = repo
        .graph()
        .checkout(name)
        .with_context(|| format!("Failed to check out '{}'", name))?;

    match state {
        HeadState::Attached(branch) => {
            output::success(format!("Switched to branch '{}'", branch), ctx.verbosity())
        }
        HeadState::Detached(oid) => output::success(
            format!("HEAD is now at {} (detached)", output::format_oid(&oid)),
            ctx.verbosity(),
        ),
    }
    Ok(())
}

/// Point the current branch at another commit.
pub fn reset(ctx: &Context, name: &str, hard: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let mode = if hard { ResetMode::Hard } else { ResetMode::Soft };
    let oid = repo
        .graph()
        .reset(name, mode)
        .with_context(|| format!("Failed to reset to '{}'", name))?;

    output::success(
        format!("HEAD is now at {}", output::format_oid(&oid)),
        ctx.verbosity(),
    );
    Ok(())
}

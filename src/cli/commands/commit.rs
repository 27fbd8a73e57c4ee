//! commit command - Record a snapshot of the working directory

use crate::cli::Context;
use crate::repo::HeadState;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Record a snapshot of the working directory.
///
/// Prints the new commit id; in normal mode also says where HEAD moved.
pub fn commit(ctx: &Context, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Aborting commit due to empty commit message");
    }

    let repo = ctx.open_repo()?;
    let oid = repo
        .graph()
        .commit(message)
        .context("Failed to create commit")?;

    if ctx.quiet {
        output::data(&oid);
        return Ok(());
    }

    let summary = message.lines().next().unwrap_or_default();
    match repo.refs().head_state()? {
        HeadState::Attached(branch) => {
            output::data(format!("[{} {}] {}", branch, output::format_oid(&oid), summary))
        }
        HeadState::Detached(_) => output::data(format!(
            "[detached HEAD {}] {}",
            output::format_oid(&oid),
            summary
        )),
    }
    Ok(())
}

//! config command - Get, set, or list configuration values

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print the effective value of a key.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let value = repo.config().get(key)?;
    output::data(value);
    Ok(())
}

/// Set a key in the repository config file.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut repo = ctx.open_repo()?;
    let mut repo_config = repo.config().repo.clone().unwrap_or_default();
    repo_config.set(key, value)?;
    repo.save_config(repo_config)
        .context("Failed to write config")?;

    output::success(format!("Set {} = {}", key, value), ctx.verbosity());
    Ok(())
}

/// List every key with its effective value.
pub fn list(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    for (key, value) in repo.config().list() {
        output::data(format!("{} = {}", key, value));
    }
    Ok(())
}

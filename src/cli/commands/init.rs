//! init command - Create an empty repository

use crate::cli::Context;
use crate::core::config::Config;
use crate::fs::LocalFileSystem;
use crate::repo::Repository;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Create an empty repository in the working directory.
///
/// Unlike discovery, `init` never looks at parent directories: a nested
/// repository is allowed.
pub fn init(ctx: &Context) -> Result<()> {
    let cwd = ctx.work_dir()?;
    let global = Config::load_global().context("Failed to load global config")?;
    let repo = Repository::init_with(Box::new(LocalFileSystem::new()), &cwd, global)
        .context("Failed to initialize repository")?;

    output::success(
        format!(
            "Initialized empty mgit repository in {}",
            repo.paths().store_dir().display()
        ),
        ctx.verbosity(),
    );
    Ok(())
}

//! cli
//!
//! Command-line interface layer for mgit.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to a
//! handler per command. Handlers open the repository through
//! [`Context::open_repo`] and leave every state change to
//! [`crate::repo::Repository`].

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::fs::LocalFileSystem;
use crate::repo::Repository;
use crate::ui::output::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Directory to run in (defaults to the process working directory)
    pub cwd: Option<PathBuf>,
    /// Debug output enabled
    pub debug: bool,
    /// Results only
    pub quiet: bool,
}

impl Context {
    /// Output verbosity for these flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Directory the command runs in.
    pub fn work_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Open the repository containing the working directory.
    pub fn open_repo(&self) -> Result<Repository> {
        let cwd = self.work_dir()?;
        let global = Config::load_global().context("Failed to load global config")?;
        Repository::discover(Box::new(LocalFileSystem::new()), &cwd, global)
            .context("Failed to open repository")
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` enables mgit's debug
/// events and everything else stays at `warn`.
fn init_tracing(debug: bool) {
    let fallback = if debug { "warn,mgit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // A subscriber may already be installed when running inside tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

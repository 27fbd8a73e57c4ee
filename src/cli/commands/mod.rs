//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository from the [`Context`]
//! 2. Resolves names and calls into [`crate::repo`]
//! 3. Formats and displays output
//!
//! Handlers never touch the store directly.

mod checkout;
mod commit;
mod config_cmd;
mod diff;
mod init;
mod log_cmd;
mod merge;
mod objects;
mod refs;

// Re-export command functions for testing and direct invocation
pub use checkout::{checkout, reset};
pub use commit::commit;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use diff::{diff, status};
pub use init::init;
pub use log_cmd::{log, show};
pub use merge::{merge, merge_base};
pub use objects::{cat_file, hash_object, read_tree, write_tree};
pub use refs::{branch, tag};

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use crate::core::types::Oid;
use crate::repo::Repository;
use anyhow::{anyhow, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init => init::init(ctx),

        // Plumbing
        Command::HashObject { file, kind } => objects::hash_object(ctx, &file, kind),
        Command::CatFile { object, kind } => objects::cat_file(ctx, &object, kind),
        Command::WriteTree => objects::write_tree(ctx),
        Command::ReadTree { tree } => objects::read_tree(ctx, &tree),

        // History
        Command::Commit { message } => commit::commit(ctx, &message),
        Command::Log {
            start,
            oneline,
            json,
        } => log_cmd::log(ctx, &start, oneline, json),
        Command::Show { commit } => log_cmd::show(ctx, &commit),
        Command::Diff { commit, name_only } => diff::diff(ctx, &commit, name_only),
        Command::Status => diff::status(ctx),

        // Moving HEAD
        Command::Checkout { name } => checkout::checkout(ctx, &name),
        Command::Reset { name, hard } => checkout::reset(ctx, &name, hard),
        Command::Merge { name } => merge::merge(ctx, &name),
        Command::MergeBase { first, second } => merge::merge_base(ctx, &first, &second),

        // References
        Command::Branch { name, start } => refs::branch(ctx, name.as_deref(), &start),
        Command::Tag { name, target } => refs::tag(ctx, name.as_deref(), &target),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
    }
}

/// Resolve a user-supplied name to a commit id.
///
/// `@` on a branch with no commits gets a dedicated message instead of the
/// generic "not resolved" error.
fn resolve_commit(repo: &Repository, name: &str) -> Result<Oid> {
    if name == "@" || name == "HEAD" {
        return repo
            .refs()
            .head_oid()?
            .ok_or_else(|| anyhow!("the current branch has no commits yet"));
    }
    Ok(repo.refs().resolve_to_id(name)?)
}

//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::ObjectKind;

/// mgit - A minimal content-addressed version control engine
#[derive(Parser, Debug)]
#[command(name = "mgit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if mgit was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output (results only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty repository
    #[command(
        name = "init",
        long_about = "Create an empty repository in the current directory.\n\n\
            Creates the .mgit store with an empty object database and points HEAD \
            at the default branch (master unless init.default_branch is configured). \
            Fails if a store already exists."
    )]
    Init,

    // ========== Plumbing ==========
    /// Store a file as an object and print its id
    #[command(name = "hash-object")]
    HashObject {
        /// File to store
        file: PathBuf,

        /// Object kind to store it as
        #[arg(short = 't', long = "type", default_value = "blob")]
        kind: ObjectKind,
    },

    /// Print the payload of an object
    #[command(name = "cat-file")]
    CatFile {
        /// Object id or name
        object: String,

        /// Fail unless the object has this kind
        #[arg(short = 't', long = "type")]
        kind: Option<ObjectKind>,
    },

    /// Snapshot the working directory as a tree and print its id
    #[command(name = "write-tree")]
    WriteTree,

    /// Replace the working directory with a tree
    #[command(name = "read-tree")]
    ReadTree {
        /// Tree id or name
        tree: String,
    },

    // ========== History ==========
    /// Record a snapshot of the working directory
    #[command(
        name = "commit",
        long_about = "Record a snapshot of the whole working directory.\n\n\
            There is no staging area: every file outside .mgit is included. The new \
            commit's parent is the commit HEAD points at, plus the commit being merged \
            when a merge is in progress.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Commit everything in the working directory
    mgit commit -m \"describe the change\"

    # Finish a merge after fixing conflicts
    mgit merge feature
    mgit commit -m \"merge feature\""
    )]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show commit history
    #[command(
        name = "log",
        long_about = "Show the commits reachable from a starting point.\n\n\
            Commits are listed first-parent first. Each commit is annotated with the \
            references pointing at it.",
        after_help = "\
WORKFLOW EXAMPLES:
    # History of the current commit
    mgit log

    # One line per commit
    mgit log --oneline

    # Machine-readable history of a branch
    mgit log feature --json"
    )]
    Log {
        /// Where to start (defaults to HEAD)
        #[arg(default_value = "@")]
        start: String,

        /// One line per commit
        #[arg(long, conflicts_with = "json")]
        oneline: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a commit and the changes it introduced
    #[command(name = "show")]
    Show {
        /// Commit to show (defaults to HEAD)
        #[arg(default_value = "@")]
        commit: String,
    },

    /// Compare a commit with the working directory
    #[command(name = "diff")]
    Diff {
        /// Commit to compare against (defaults to HEAD)
        #[arg(default_value = "@")]
        commit: String,

        /// Only list changed paths
        #[arg(long)]
        name_only: bool,
    },

    /// Show the working directory state
    #[command(name = "status")]
    Status,

    // ========== Moving HEAD ==========
    /// Switch to a branch or commit
    #[command(
        name = "checkout",
        long_about = "Replace the working directory with a commit and move HEAD.\n\n\
            Checking out a branch attaches HEAD to it; anything else (a tag, an id) \
            detaches HEAD. Uncommitted changes are discarded."
    )]
    Checkout {
        /// Branch, tag, or commit id
        name: String,
    },

    /// Move the current branch
    #[command(name = "reset")]
    Reset {
        /// Commit to move the branch to
        name: String,

        /// Also replace the working directory
        #[arg(long)]
        hard: bool,
    },

    /// Merge a commit into HEAD
    #[command(
        name = "merge",
        long_about = "Merge a commit into the current one.\n\n\
            If HEAD is an ancestor of the other commit the merge fast-forwards. \
            Otherwise the merged files are written to the working directory (with \
            conflict markers where both sides changed the same lines) and the next \
            commit records both parents."
    )]
    Merge {
        /// Branch, tag, or commit id
        name: String,
    },

    /// Print a common ancestor of two commits
    #[command(name = "merge-base")]
    MergeBase {
        /// First commit
        first: String,
        /// Second commit
        second: String,
    },

    // ========== References ==========
    /// List branches, or create one
    #[command(name = "branch")]
    Branch {
        /// Name of the branch to create
        name: Option<String>,

        /// Commit the new branch points at (defaults to HEAD)
        #[arg(default_value = "@")]
        start: String,
    },

    /// List tags, or create one
    #[command(name = "tag")]
    Tag {
        /// Name of the tag to create
        name: Option<String>,

        /// Object the tag points at (defaults to HEAD)
        #[arg(default_value = "@")]
        target: String,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
WORKFLOW EXAMPLES:
    # Show every setting and its effective value
    mgit config list

    # Store trees with sorted entries in this repository
    mgit config set tree.order sorted

    # Include the base in conflict markers
    mgit config set merge.conflict_style diff3"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a repository configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mgit", "status", "--quiet", "--cwd", "/tmp"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.cwd, Some(PathBuf::from("/tmp")));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn object_kind_argument() {
        let cli = Cli::try_parse_from(["mgit", "hash-object", "-t", "tree", "f"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::HashObject {
                kind: ObjectKind::Tree,
                ..
            }
        ));
        assert!(Cli::try_parse_from(["mgit", "hash-object", "-t", "tag", "f"]).is_err());
    }

    #[test]
    fn defaults_to_head() {
        let cli = Cli::try_parse_from(["mgit", "log"]).unwrap();
        assert!(matches!(cli.command, Command::Log { start, .. } if start == "@"));

        let cli = Cli::try_parse_from(["mgit", "branch", "dev"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Branch { name: Some(name), start } if name == "dev" && start == "@"
        ));
    }

    #[test]
    fn commit_requires_message() {
        assert!(Cli::try_parse_from(["mgit", "commit"]).is_err());
    }
}

//! repo::error
//!
//! Error taxonomy for repository operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::types::{ObjectKind, TypeError};
use crate::fs::FsError;

/// Errors from repository operations.
///
/// These variants cover every failure category callers need to handle
/// distinctly. Storage failures from the filesystem capability are carried
/// unchanged in [`RepoError::Fs`].
#[derive(Debug, Error)]
pub enum RepoError {
    /// The store directory is missing.
    #[error("not an mgit repository (no .mgit directory): {}", path.display())]
    NotInitialized {
        /// The working directory that was checked
        path: PathBuf,
    },

    /// `init` on a directory that already has a store.
    #[error("mgit repository already exists at {}", path.display())]
    AlreadyExists {
        /// The existing store directory
        path: PathBuf,
    },

    /// No object with this id is stored.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The id that was looked up
        oid: String,
    },

    /// The stored object has a different kind than requested.
    #[error("object {oid} is a {actual}, expected a {expected}")]
    KindMismatch {
        /// The object id
        oid: String,
        /// The kind the caller asked for
        expected: ObjectKind,
        /// The kind actually stored
        actual: ObjectKind,
    },

    /// An object file is not `<kind> NUL <payload>`.
    #[error("malformed object {oid}: {message}")]
    MalformedObject {
        /// The object id
        oid: String,
        /// Description of the problem
        message: String,
    },

    /// A tree payload line is not `<kind> <id> <name>`.
    #[error("malformed tree {oid}: {message}")]
    MalformedTree {
        /// The tree id
        oid: String,
        /// Description of the problem
        message: String,
    },

    /// A commit payload has an unexpected header.
    #[error("malformed commit {oid}: {message}")]
    MalformedCommit {
        /// The commit id
        oid: String,
        /// Description of the problem
        message: String,
    },

    /// Reference file does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The reference that was not found
        refname: String,
    },

    /// Reference file content is neither `ref: <name>` nor an object id.
    #[error("malformed ref {refname}: {content:?}")]
    MalformedRef {
        /// The reference name
        refname: String,
        /// The raw file content
        content: String,
    },

    /// Creating a reference that must not be overwritten.
    #[error("ref already exists: {refname}")]
    RefAlreadyExists {
        /// The existing reference
        refname: String,
    },

    /// Symbolic reference chain longer than the configured bound.
    #[error("symbolic ref chain starting at {refname} exceeds {limit} links (cycle?)")]
    RefCycle {
        /// Where resolution started
        refname: String,
        /// The configured bound
        limit: usize,
    },

    /// Name is neither a reference nor a syntactically valid object id.
    #[error("'{name}' is neither a known ref nor an object id")]
    NameNotResolved {
        /// The name as given
        name: String,
    },

    /// Operation requires HEAD to be attached to a branch.
    #[error("cannot {operation} with a detached HEAD")]
    DetachedHead {
        /// The attempted operation
        operation: String,
    },

    /// Operation requires HEAD to point at a commit.
    #[error("HEAD does not point at a commit yet")]
    NoCommits,

    /// A branch, tag, ref, or entry name failed validation.
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// Repository configuration could not be loaded or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Underlying filesystem failure.
    #[error(transparent)]
    Fs(#[from] FsError),
}

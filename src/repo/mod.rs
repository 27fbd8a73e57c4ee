//! repo
//!
//! The repository handle and the storage engine behind it.
//!
//! # Architecture
//!
//! [`Repository`] owns the filesystem capability, the path layout, and the
//! merged configuration. Every component is a cheap borrowed view created
//! from the handle:
//!
//! - [`ObjectStore`] via [`Repository::objects`]: content-addressed objects
//! - [`RefStore`] via [`Repository::refs`]: named pointers (HEAD, branches, tags)
//! - [`TreeCodec`] via [`Repository::trees`]: directories to trees and back
//! - [`CommitGraph`] via [`Repository::graph`]: commits, history, HEAD moves
//! - [`DiffEngine`] via [`Repository::diff`]: tree comparison and merging
//!
//! Any number of independent repositories can exist in one process.
//!
//! # Invariants
//!
//! - All storage access goes through the [`FileSystem`] trait
//! - Every public operation fails with [`RepoError::NotInitialized`] before
//!   touching anything if the store directory is missing
//!
//! # Example
//!
//! ```
//! use mgit::fs::{FileSystem, MemoryFileSystem};
//! use mgit::repo::Repository;
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.make_directories(Path::new("/work")).unwrap();
//! fs.write_file(Path::new("/work/f"), b"x").unwrap();
//!
//! let repo = Repository::init(Box::new(fs), "/work").unwrap();
//! let first = repo.graph().commit("first").unwrap();
//! assert_eq!(repo.refs().resolve_to_id("master").unwrap(), first);
//! ```

mod commit;
pub mod diff;
mod error;
pub mod merge;
mod objects;
mod refs;
mod tree;

pub use commit::{Ancestry, Commit, CommitGraph, LogEntry, MergeOutcome, ResetMode};
pub use diff::{DiffEngine, FileStatus, MergeReport, MergedFile, Status};
pub use error::RepoError;
pub use objects::ObjectStore;
pub use refs::{HeadState, RefStore, RefValue};
pub use tree::{encode_entries, parse_entries, FlatTree, TreeCodec, TreeEntry, TreeEntryKind};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::config::{Config, GlobalConfig, RepoConfig};
use crate::core::paths::RepoPaths;
use crate::core::types::RefName;
use crate::fs::{FileSystem, LocalFileSystem};

/// Handle to one repository.
#[derive(Debug)]
pub struct Repository {
    fs: Box<dyn FileSystem>,
    paths: RepoPaths,
    config: Config,
}

impl Repository {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a store in `work_dir` using the global configuration.
    pub fn init(fs: Box<dyn FileSystem>, work_dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        Self::init_with(fs, work_dir, Config::load_global()?)
    }

    /// Create a store in `work_dir` with an explicit global configuration.
    ///
    /// HEAD starts attached to the configured default branch, which has no
    /// commits yet.
    ///
    /// # Errors
    ///
    /// `RepoError::AlreadyExists` if a store is already present; nothing is
    /// modified in that case.
    pub fn init_with(
        fs: Box<dyn FileSystem>,
        work_dir: impl Into<PathBuf>,
        global: GlobalConfig,
    ) -> Result<Self, RepoError> {
        let paths = RepoPaths::new(work_dir.into());
        let store = paths.store_dir();
        if fs.exists(&store) {
            return Err(RepoError::AlreadyExists { path: store });
        }

        fs.make_directories(&paths.objects_dir())?;
        fs.make_directories(&paths.heads_dir())?;
        fs.make_directories(&paths.tags_dir())?;

        let repo = Self {
            fs,
            paths,
            config: Config::new(global, None),
        };
        let branch = repo.config.default_branch();
        repo.refs().update(
            &RefName::head(),
            &RefValue::Symbolic(RefName::for_branch(&branch)),
            false,
        )?;

        debug!(path = %store.display(), branch = %branch, "initialized repository");
        Ok(repo)
    }

    /// Open the store in `work_dir` using the global configuration.
    pub fn open(fs: Box<dyn FileSystem>, work_dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        Self::open_with(fs, work_dir, Config::load_global()?)
    }

    /// Open the store in `work_dir` with an explicit global configuration.
    ///
    /// # Errors
    ///
    /// - `RepoError::NotInitialized` if there is no store
    /// - `RepoError::Config` if `.mgit/config.toml` is invalid
    pub fn open_with(
        fs: Box<dyn FileSystem>,
        work_dir: impl Into<PathBuf>,
        global: GlobalConfig,
    ) -> Result<Self, RepoError> {
        let paths = RepoPaths::new(work_dir.into());
        if !fs.is_dir(&paths.store_dir()) {
            return Err(RepoError::NotInitialized {
                path: paths.work_dir.clone(),
            });
        }

        let config_path = paths.config_path();
        let repo_config = if fs.is_file(&config_path) {
            let bytes = fs.read_file(&config_path)?;
            Some(RepoConfig::parse(
                &String::from_utf8_lossy(&bytes),
                &config_path,
            )?)
        } else {
            None
        };

        Ok(Self {
            fs,
            paths,
            config: Config::new(global, repo_config),
        })
    }

    /// Open the repository containing `start`, searching upwards.
    pub fn discover(
        fs: Box<dyn FileSystem>,
        start: &Path,
        global: GlobalConfig,
    ) -> Result<Self, RepoError> {
        let found = start
            .ancestors()
            .find(|dir| fs.is_dir(&RepoPaths::new(dir.to_path_buf()).store_dir()))
            .map(Path::to_path_buf);

        match found {
            Some(work_dir) => Self::open_with(fs, work_dir, global),
            None => Err(RepoError::NotInitialized {
                path: start.to_path_buf(),
            }),
        }
    }

    /// Create a store on the real filesystem.
    pub fn init_local(work_dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        Self::init(Box::new(LocalFileSystem::new()), work_dir)
    }

    /// Open a store on the real filesystem.
    pub fn open_local(work_dir: impl Into<PathBuf>) -> Result<Self, RepoError> {
        Self::open(Box::new(LocalFileSystem::new()), work_dir)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Root of the working tree.
    pub fn work_dir(&self) -> &Path {
        self.paths.work_dir()
    }

    /// Fail unless the store directory exists.
    pub fn require_initialized(&self) -> Result<(), RepoError> {
        if self.fs.is_dir(&self.paths.store_dir()) {
            Ok(())
        } else {
            Err(RepoError::NotInitialized {
                path: self.paths.work_dir.clone(),
            })
        }
    }

    /// Write `.mgit/config.toml` and use it from now on.
    pub fn save_config(&mut self, repo_config: RepoConfig) -> Result<(), RepoError> {
        self.require_initialized()?;
        repo_config.validate()?;
        let text = repo_config.to_toml()?;
        self.fs
            .write_file(&self.paths.config_path(), text.as_bytes())?;
        self.config.repo = Some(repo_config);
        Ok(())
    }

    // =========================================================================
    // Component views
    // =========================================================================

    pub fn objects(&self) -> ObjectStore<'_> {
        ObjectStore::new(self)
    }

    pub fn refs(&self) -> RefStore<'_> {
        RefStore::new(self)
    }

    pub fn trees(&self) -> TreeCodec<'_> {
        TreeCodec::new(self)
    }

    pub fn graph(&self) -> CommitGraph<'_> {
        CommitGraph::new(self)
    }

    pub fn diff(&self) -> DiffEngine<'_> {
        DiffEngine::new(self)
    }
}

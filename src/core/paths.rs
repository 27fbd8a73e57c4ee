//! core::paths
//!
//! Centralized path routing for repository storage locations.
//!
//! # Storage Layout
//!
//! All repository data is stored under `<work_dir>/.mgit/`:
//! - `objects/<oid>` - One file per stored object
//! - `HEAD` - Current checkout position
//! - `MERGE_HEAD` - Present only while a merge is in progress
//! - `ref/heads/<branch>`, `ref/tags/<tag>` - Named references
//! - `config.toml` - Repository configuration
//!
//! **Hard rule:** No code outside this module computes `*.join(".mgit")`
//! paths. All paths go through [`RepoPaths`].
//!
//! # Example
//!
//! ```
//! use mgit::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/work"));
//! assert_eq!(paths.store_dir(), PathBuf::from("/work/.mgit"));
//! assert_eq!(paths.object_path("ab12"), PathBuf::from("/work/.mgit/objects/ab12"));
//! ```

use std::path::{Component, Path, PathBuf};

use super::types::RefName;

/// Name of the reserved store directory at the root of the working tree.
pub const STORE_DIR: &str = ".mgit";

/// Centralized path routing for repository storage.
///
/// # Invariants
///
/// - The store directory is always `<work_dir>/.mgit`
/// - Reference files live at `<store_dir>/<ref name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// Root of the working tree (the directory containing `.mgit`).
    pub work_dir: PathBuf,
}

impl RepoPaths {
    /// Create paths rooted at the given working directory.
    pub fn new(work_dir: PathBuf) -> Self {
        Self { work_dir }
    }

    /// Get the working directory as a Path reference.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    // =========================================================================
    // Store paths
    // =========================================================================

    /// The reserved store directory (`<work_dir>/.mgit`).
    pub fn store_dir(&self) -> PathBuf {
        self.work_dir.join(STORE_DIR)
    }

    /// Directory holding one file per object.
    pub fn objects_dir(&self) -> PathBuf {
        self.store_dir().join("objects")
    }

    /// Path of a single object file.
    pub fn object_path(&self, oid: &str) -> PathBuf {
        self.objects_dir().join(oid)
    }

    /// Root of the reference namespace (`<store_dir>/ref`).
    pub fn ref_root(&self) -> PathBuf {
        self.store_dir().join(RefName::ROOT)
    }

    /// Directory holding branch references.
    pub fn heads_dir(&self) -> PathBuf {
        self.ref_root().join("heads")
    }

    /// Directory holding tag references.
    pub fn tags_dir(&self) -> PathBuf {
        self.ref_root().join("tags")
    }

    /// File backing a reference.
    ///
    /// ```
    /// use mgit::core::paths::RepoPaths;
    /// use mgit::core::types::RefName;
    /// use std::path::PathBuf;
    ///
    /// let paths = RepoPaths::new(PathBuf::from("/work"));
    /// assert_eq!(paths.ref_path(&RefName::head()), PathBuf::from("/work/.mgit/HEAD"));
    /// ```
    pub fn ref_path(&self, name: &RefName) -> PathBuf {
        let mut path = self.store_dir();
        for component in name.as_str().split('/') {
            path.push(component);
        }
        path
    }

    /// Path to the repository configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.store_dir().join("config.toml")
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Check whether any segment of `path` is the reserved store directory.
    pub fn is_ignored(path: &Path) -> bool {
        path.components()
            .any(|c| matches!(c, Component::Normal(s) if s == STORE_DIR))
    }

    /// Slash-joined path of `path` relative to the working directory.
    ///
    /// Returns `None` if `path` is outside the working directory or is
    /// not valid UTF-8.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.work_dir).ok()?;
        let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        Some(parts?.join("/"))
    }

    /// Absolute location of a slash-joined working-tree path.
    pub fn work_path(&self, relative: &str) -> PathBuf {
        let mut path = self.work_dir.clone();
        for component in relative.split('/').filter(|c| !c.is_empty()) {
            path.push(component);
        }
        path
    }
}

//! fs::traits
//!
//! Filesystem capability trait definition.
//!
//! # Design
//!
//! The repository engine never calls `std::fs` directly. Every read, write,
//! delete, and directory walk goes through [`FileSystem`], so the same engine
//! runs against a real directory or an in-memory tree.
//!
//! # Example
//!
//! ```
//! use mgit::fs::{FileSystem, FsError, MemoryFileSystem};
//! use std::path::Path;
//!
//! fn read_text(fs: &dyn FileSystem, path: &Path) -> Result<String, FsError> {
//!     Ok(String::from_utf8_lossy(&fs.read_file(path)?).into_owned())
//! }
//!
//! let fs = MemoryFileSystem::new();
//! fs.make_directories(Path::new("/work")).unwrap();
//! fs.write_file(Path::new("/work/a.txt"), b"hello").unwrap();
//! assert_eq!(read_text(&fs, Path::new("/work/a.txt")).unwrap(), "hello");
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// Nothing exists at the path.
    #[error("no such file or directory: {}", path.display())]
    NotFound { path: PathBuf },

    /// A file or directory name is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    InvalidName { path: PathBuf },

    /// Any other I/O failure.
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error, mapping `NotFound` to [`FsError::NotFound`].
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            FsError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symlink, socket, device, or anything else the engine does not track.
    Other,
}

/// One entry returned by [`FileSystem::scan_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Final path component
    pub name: String,
    /// Entry kind (symlinks are not followed)
    pub kind: EntryKind,
}

/// One entry returned by [`FileSystem::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Full path of the entry
    pub path: PathBuf,
    /// Entry kind
    pub kind: EntryKind,
}

/// Filesystem capability consumed by the repository engine.
///
/// Implementations must be thread-safe (Send + Sync). Paths are absolute
/// (or at least consistently rooted); the engine never relies on a current
/// directory.
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// List the entries of a directory in the implementation's scan order.
    fn scan_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;

    /// Read a whole file.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Create or truncate a file. The parent directory must exist.
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError>;

    /// Delete a file.
    fn delete_file(&self, path: &Path) -> Result<(), FsError>;

    /// Create a directory and all missing ancestors.
    fn make_directories(&self, path: &Path) -> Result<(), FsError>;

    /// Remove a directory if it has no entries.
    ///
    /// Returns `Ok(false)` when the directory still has entries; that is
    /// a normal outcome, not an error.
    fn remove_directory_if_empty(&self, path: &Path) -> Result<bool, FsError>;

    /// Check whether anything exists at the path.
    fn exists(&self, path: &Path) -> bool;

    /// Check whether the path is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check whether the path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Every entry below `root` (not including `root`), parents before
    /// children.
    ///
    /// The default implementation walks with an explicit stack on top of
    /// [`FileSystem::scan_directory`].
    fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>, FsError> {
        let mut result = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in self.scan_directory(&dir)? {
                let path = dir.join(&entry.name);
                if entry.kind == EntryKind::Directory {
                    pending.push(path.clone());
                }
                result.push(WalkEntry {
                    path,
                    kind: entry.kind,
                });
            }
        }

        Ok(result)
    }
}

/// Shared filesystems, so a caller can keep a handle to the same tree a
/// repository owns.
impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    fn scan_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        (**self).scan_directory(path)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        (**self).read_file(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        (**self).write_file(path, contents)
    }

    fn delete_file(&self, path: &Path) -> Result<(), FsError> {
        (**self).delete_file(path)
    }

    fn make_directories(&self, path: &Path) -> Result<(), FsError> {
        (**self).make_directories(path)
    }

    fn remove_directory_if_empty(&self, path: &Path) -> Result<bool, FsError> {
        (**self).remove_directory_if_empty(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>, FsError> {
        (**self).walk(root)
    }
}

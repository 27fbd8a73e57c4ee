//! fs::memory
//!
//! In-memory filesystem for tests and embedding.
//!
//! Directory scans return entries sorted by name, which makes tree
//! identities deterministic regardless of the configured tree order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::traits::{DirEntry, EntryKind, FileSystem, FsError};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Directory,
}

/// A filesystem held entirely in memory.
///
/// The root directory (`/`) always exists.
///
/// # Example
///
/// ```
/// use mgit::fs::{FileSystem, MemoryFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.make_directories(Path::new("/a/b")).unwrap();
/// fs.write_file(Path::new("/a/b/c.txt"), b"c").unwrap();
/// assert!(fs.is_dir(Path::new("/a")));
/// assert!(!fs.remove_directory_if_empty(Path::new("/a/b")).unwrap());
/// ```
#[derive(Debug)]
pub struct MemoryFileSystem {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Create an empty filesystem containing only `/`.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), Node::Directory);
        Self {
            nodes: Mutex::new(nodes),
        }
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        // A poisoned lock only means another test thread panicked mid-call;
        // the map itself is still consistent.
        self.nodes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn children<'a>(
        nodes: &'a BTreeMap<PathBuf, Node>,
        dir: &'a Path,
    ) -> impl Iterator<Item = (&'a PathBuf, &'a Node)> + 'a {
        nodes
            .range(dir.to_path_buf()..)
            .skip_while(move |(path, _)| path.as_path() == dir)
            .take_while(move |(path, _)| path.starts_with(dir))
            .filter(move |(path, _)| path.parent() == Some(dir))
    }
}

impl FileSystem for MemoryFileSystem {
    fn scan_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let nodes = self.nodes();
        match nodes.get(path) {
            Some(Node::Directory) => {}
            _ => {
                return Err(FsError::NotFound {
                    path: path.to_path_buf(),
                })
            }
        }

        let mut entries = Vec::new();
        for (child, node) in Self::children(&nodes, path) {
            let name = child
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| FsError::InvalidName {
                    path: child.clone(),
                })?;
            let kind = match node {
                Node::File(_) => EntryKind::File,
                Node::Directory => EntryKind::Directory,
            };
            entries.push(DirEntry {
                name: name.to_string(),
                kind,
            });
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        match self.nodes().get(path) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            _ => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        let mut nodes = self.nodes();
        let parent_is_dir = path
            .parent()
            .map(|parent| matches!(nodes.get(parent), Some(Node::Directory)))
            .unwrap_or(false);
        if !parent_is_dir {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        if matches!(nodes.get(path), Some(Node::Directory)) {
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("is a directory"),
            });
        }
        nodes.insert(path.to_path_buf(), Node::File(contents.to_vec()));
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<(), FsError> {
        let mut nodes = self.nodes();
        match nodes.get(path) {
            Some(Node::File(_)) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Directory) => Err(FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("is a directory"),
            }),
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn make_directories(&self, path: &Path) -> Result<(), FsError> {
        let mut nodes = self.nodes();
        for ancestor in path.ancestors().collect::<Vec<_>>().into_iter().rev() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            match nodes.get(ancestor) {
                Some(Node::Directory) => {}
                Some(Node::File(_)) => {
                    return Err(FsError::Io {
                        path: ancestor.to_path_buf(),
                        source: std::io::Error::other("not a directory"),
                    })
                }
                None => {
                    nodes.insert(ancestor.to_path_buf(), Node::Directory);
                }
            }
        }
        Ok(())
    }

    fn remove_directory_if_empty(&self, path: &Path) -> Result<bool, FsError> {
        let mut nodes = self.nodes();
        match nodes.get(path) {
            Some(Node::Directory) => {}
            _ => {
                return Err(FsError::NotFound {
                    path: path.to_path_buf(),
                })
            }
        }
        if Self::children(&nodes, path).next().is_some() {
            return Ok(false);
        }
        nodes.remove(path);
        Ok(true)
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.nodes().get(path), Some(Node::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes().get(path), Some(Node::Directory))
    }
}

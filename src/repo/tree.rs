//! repo::tree
//!
//! Directory snapshots as tree objects.
//!
//! # Format
//!
//! A tree payload is one line per entry: `<kind> <oid> <name>\n`, where
//! `kind` is `blob` or `tree`. Entry names never contain `/`, a newline,
//! or NUL, and are never `.` or `..`.
//!
//! # Traversal
//!
//! Snapshot, materialize, and flatten all walk with explicit work stacks,
//! so directory depth is bounded by memory rather than the call stack.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{RepoError, Repository};
use crate::core::config::TreeOrder;
use crate::core::paths::{RepoPaths, STORE_DIR};
use crate::core::types::{ObjectKind, Oid, TypeError};
use crate::fs::{DirEntry, EntryKind};

/// Path-to-blob map of a fully expanded tree.
///
/// Keys are slash-joined paths relative to the tree root.
pub type FlatTree = BTreeMap<String, Oid>;

/// Kind of object a tree entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeEntryKind {
    /// A file.
    Blob,
    /// A subdirectory.
    Tree,
}

impl TreeEntryKind {
    /// The object kind stored for this entry.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            TreeEntryKind::Blob => ObjectKind::Blob,
            TreeEntryKind::Tree => ObjectKind::Tree,
        }
    }
}

/// One line of a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    kind: TreeEntryKind,
    oid: Oid,
    name: String,
}

impl TreeEntry {
    /// Create a validated entry.
    ///
    /// ```
    /// use mgit::core::types::Oid;
    /// use mgit::repo::{TreeEntry, TreeEntryKind};
    ///
    /// let oid = Oid::new("a".repeat(40)).unwrap();
    /// assert!(TreeEntry::new(TreeEntryKind::Blob, oid.clone(), "a.txt").is_ok());
    /// assert!(TreeEntry::new(TreeEntryKind::Blob, oid.clone(), "a/b").is_err());
    /// assert!(TreeEntry::new(TreeEntryKind::Tree, oid, "..").is_err());
    /// ```
    pub fn new(
        kind: TreeEntryKind,
        oid: Oid,
        name: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\n', '\0'])
        {
            return Err(TypeError::InvalidEntryName(format!("{name:?}")));
        }
        Ok(Self { kind, oid, name })
    }

    pub fn kind(&self) -> TreeEntryKind {
        self.kind
    }

    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Serialize entries in the given order.
pub fn encode_entries(entries: &[TreeEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(entry.kind.object_kind().as_str());
        out.push(' ');
        out.push_str(entry.oid.as_str());
        out.push(' ');
        out.push_str(&entry.name);
        out.push('\n');
    }
    out
}

/// Parse a tree payload.
///
/// `oid` is only used for error messages.
pub fn parse_entries(oid: &Oid, payload: &[u8]) -> Result<Vec<TreeEntry>, RepoError> {
    let malformed = |message: String| RepoError::MalformedTree {
        oid: oid.to_string(),
        message,
    };
    let text = std::str::from_utf8(payload).map_err(|e| malformed(e.to_string()))?;

    let mut entries = Vec::new();
    for line in text.lines() {
        let mut parts = line.splitn(3, ' ');
        let (Some(kind), Some(id), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed(format!("expected '<kind> <id> <name>', got {line:?}")));
        };
        let kind = match kind {
            "blob" => TreeEntryKind::Blob,
            "tree" => TreeEntryKind::Tree,
            other => return Err(malformed(format!("unexpected entry kind {other:?}"))),
        };
        let id = Oid::new(id).map_err(|e| malformed(e.to_string()))?;
        let entry = TreeEntry::new(kind, id, name).map_err(|e| malformed(e.to_string()))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// A directory being snapshotted: entries still to visit plus the tree
/// entries collected so far.
struct SnapshotFrame {
    dir: PathBuf,
    name: Option<String>,
    pending: std::vec::IntoIter<DirEntry>,
    entries: Vec<TreeEntry>,
}

/// Borrowed view that converts between directories and tree objects.
#[derive(Debug, Clone, Copy)]
pub struct TreeCodec<'r> {
    repo: &'r Repository,
}

impl<'r> TreeCodec<'r> {
    pub(crate) fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    fn open_frame(&self, dir: PathBuf, name: Option<String>) -> Result<SnapshotFrame, RepoError> {
        let pending = self.repo.fs().scan_directory(&dir)?.into_iter();
        Ok(SnapshotFrame {
            dir,
            name,
            pending,
            entries: Vec::new(),
        })
    }

    /// Store entries as a tree object, honoring the configured order.
    pub fn write_tree(&self, mut entries: Vec<TreeEntry>) -> Result<Oid, RepoError> {
        if self.repo.config().tree_order() == TreeOrder::Sorted {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        self.repo
            .objects()
            .put(encode_entries(&entries).as_bytes(), ObjectKind::Tree)
    }

    /// Store every regular file below `path` and return the root tree id.
    ///
    /// Entries named `.mgit` and non-regular files are skipped. Empty
    /// directories produce empty trees.
    pub fn snapshot_directory(&self, path: &Path) -> Result<Oid, RepoError> {
        self.repo.require_initialized()?;

        let fs = self.repo.fs();
        let objects = self.repo.objects();
        let mut stack = vec![self.open_frame(path.to_path_buf(), None)?];

        while let Some(frame) = stack.last_mut() {
            match frame.pending.next() {
                Some(entry) => {
                    if entry.name == STORE_DIR {
                        continue;
                    }
                    let child = frame.dir.join(&entry.name);
                    match entry.kind {
                        EntryKind::File => {
                            let bytes = fs.read_file(&child)?;
                            let oid = objects.put(&bytes, ObjectKind::Blob)?;
                            frame
                                .entries
                                .push(TreeEntry::new(TreeEntryKind::Blob, oid, entry.name)?);
                        }
                        EntryKind::Directory => {
                            let next = self.open_frame(child, Some(entry.name))?;
                            stack.push(next);
                        }
                        EntryKind::Other => {
                            trace!(path = %child.display(), "skipping non-regular file");
                        }
                    }
                }
                None => {
                    let Some(done) = stack.pop() else { break };
                    let oid = self.write_tree(done.entries)?;
                    match (stack.last_mut(), done.name) {
                        (Some(parent), Some(name)) => {
                            parent
                                .entries
                                .push(TreeEntry::new(TreeEntryKind::Tree, oid, name)?);
                        }
                        _ => {
                            debug!(path = %path.display(), tree = %oid, "snapshotted directory");
                            return Ok(oid);
                        }
                    }
                }
            }
        }

        unreachable!("the root frame always returns")
    }

    /// Read and parse a tree object.
    pub fn read_tree(&self, oid: &Oid) -> Result<Vec<TreeEntry>, RepoError> {
        let payload = self.repo.objects().get(oid, Some(ObjectKind::Tree))?;
        parse_entries(oid, &payload)
    }

    /// Write the files of a tree below `base`, creating directories.
    ///
    /// Existing files at the same paths are overwritten; nothing is deleted.
    pub fn materialize_directory(&self, oid: &Oid, base: &Path) -> Result<(), RepoError> {
        let fs = self.repo.fs();
        let objects = self.repo.objects();
        let mut pending = vec![(oid.clone(), base.to_path_buf())];

        while let Some((tree, dir)) = pending.pop() {
            let entries = self.read_tree(&tree)?;
            fs.make_directories(&dir)?;
            for entry in entries {
                let path = dir.join(&entry.name);
                match entry.kind {
                    TreeEntryKind::Blob => {
                        let bytes = objects.get(&entry.oid, Some(ObjectKind::Blob))?;
                        fs.write_file(&path, &bytes)?;
                    }
                    TreeEntryKind::Tree => pending.push((entry.oid, path)),
                }
            }
        }

        debug!(tree = %oid, base = %base.display(), "materialized tree");
        Ok(())
    }

    /// Delete every file in the working directory outside `.mgit`, then
    /// every directory left empty.
    pub fn clear_working_directory(&self) -> Result<(), RepoError> {
        self.repo.require_initialized()?;

        let fs = self.repo.fs();
        let work_dir = self.repo.work_dir();
        let mut dirs = Vec::new();

        for entry in fs.walk(work_dir)? {
            let rel = entry.path.strip_prefix(work_dir).unwrap_or(&entry.path);
            if RepoPaths::is_ignored(rel) {
                continue;
            }
            match entry.kind {
                EntryKind::Directory => dirs.push(entry.path),
                EntryKind::File | EntryKind::Other => fs.delete_file(&entry.path)?,
            }
        }

        // Deepest first, so parents are empty by the time they are reached.
        dirs.sort_by_key(|dir| Reverse(dir.components().count()));
        for dir in dirs {
            if !fs.remove_directory_if_empty(&dir)? {
                trace!(path = %dir.display(), "kept non-empty directory");
            }
        }
        Ok(())
    }

    /// Replace the working directory contents with a tree.
    pub fn replace_working_tree(&self, oid: &Oid) -> Result<(), RepoError> {
        // Fail before touching anything if the tree is unreadable.
        self.read_tree(oid)?;
        self.clear_working_directory()?;
        self.materialize_directory(oid, self.repo.work_dir())
    }

    /// Expand a tree into a path-to-blob map.
    pub fn flatten_tree(&self, oid: &Oid) -> Result<FlatTree, RepoError> {
        let mut result = FlatTree::new();
        let mut pending = vec![(oid.clone(), String::new())];

        while let Some((tree, prefix)) = pending.pop() {
            for entry in self.read_tree(&tree)? {
                let path = if prefix.is_empty() {
                    entry.name
                } else {
                    format!("{prefix}/{}", entry.name)
                };
                match entry.kind {
                    TreeEntryKind::Blob => {
                        result.insert(path, entry.oid);
                    }
                    TreeEntryKind::Tree => pending.push((entry.oid, path)),
                }
            }
        }
        Ok(result)
    }
}

//! repo::diff
//!
//! Comparing and merging flattened trees, and reading the working tree.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use super::merge::{merge_three_way, merge_two_way, unified_diff};
use super::refs::HeadState;
use super::tree::FlatTree;
use super::{RepoError, Repository};
use crate::core::paths::RepoPaths;
use crate::core::types::{ObjectKind, Oid, RefName};
use crate::fs::EntryKind;

/// How a path differs between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Only in the newer tree.
    New,
    /// Only in the older tree.
    Deleted,
    /// In both with different content.
    Modified,
    /// In both with the same content.
    Unchanged,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::New => "new file",
            FileStatus::Deleted => "deleted",
            FileStatus::Modified => "modified",
            FileStatus::Unchanged => "unchanged",
        }
    }

    /// Anything other than [`FileStatus::Unchanged`].
    pub fn is_change(&self) -> bool {
        !matches!(self, FileStatus::Unchanged)
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file result of a tree merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFile {
    /// Merged content (with markers when conflicted).
    pub content: Vec<u8>,
    /// Whether conflict markers were written.
    pub conflicted: bool,
}

/// What a merge wrote to the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Paths written, sorted.
    pub written: Vec<String>,
    /// Paths containing conflict markers, sorted.
    pub conflicts: Vec<String>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Working-tree state relative to HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Where HEAD points.
    pub head: HeadState,
    /// Commit being merged, if a merge is in progress.
    pub merge_head: Option<Oid>,
    /// Changed paths, sorted.
    pub changes: Vec<(String, FileStatus)>,
}

/// Align several flattened trees by path.
///
/// Every path present in any tree appears once, in sorted order, with one
/// slot per input tree.
///
/// ```
/// use mgit::core::types::Oid;
/// use mgit::repo::diff::group_by_path;
/// use mgit::repo::FlatTree;
///
/// let id = Oid::new("a".repeat(40)).unwrap();
/// let left = FlatTree::from([("x".to_string(), id.clone())]);
/// let right = FlatTree::from([("y".to_string(), id.clone())]);
///
/// let grouped = group_by_path(&[&left, &right]);
/// assert_eq!(grouped[0], ("x".to_string(), vec![Some(id.clone()), None]));
/// assert_eq!(grouped[1], ("y".to_string(), vec![None, Some(id)]));
/// ```
pub fn group_by_path(trees: &[&FlatTree]) -> Vec<(String, Vec<Option<Oid>>)> {
    let paths: BTreeSet<&String> = trees.iter().flat_map(|tree| tree.keys()).collect();
    paths
        .into_iter()
        .map(|path| {
            let ids = trees.iter().map(|tree| tree.get(path).cloned()).collect();
            (path.clone(), ids)
        })
        .collect()
}

/// Status of every path across two trees, sorted by path.
pub fn changed_files(from: &FlatTree, to: &FlatTree) -> Vec<(String, FileStatus)> {
    group_by_path(&[from, to])
        .into_iter()
        .map(|(path, ids)| {
            let status = match (&ids[0], &ids[1]) {
                (None, _) => FileStatus::New,
                (_, None) => FileStatus::Deleted,
                (Some(a), Some(b)) if a == b => FileStatus::Unchanged,
                _ => FileStatus::Modified,
            };
            (path, status)
        })
        .collect()
}

/// Move files that would block a directory of the same name aside.
///
/// When one side keeps `a` as a file and the other has `a/b`, the file is
/// written as `a~HEAD` (or `a~MERGE_HEAD` when it came from the merged
/// commit) and reported as a conflict.
fn resolve_path_collisions(
    merged: BTreeMap<String, MergedFile>,
    head: &FlatTree,
) -> Vec<(String, MergedFile)> {
    let blocked: BTreeSet<String> = merged
        .keys()
        .filter(|path| {
            let prefix = format!("{path}/");
            merged
                .range(prefix.clone()..)
                .next()
                .is_some_and(|(other, _)| other.starts_with(&prefix))
        })
        .cloned()
        .collect();

    merged
        .into_iter()
        .map(|(path, file)| {
            if !blocked.contains(&path) {
                return (path, file);
            }
            let side = if head.contains_key(&path) {
                "HEAD"
            } else {
                "MERGE_HEAD"
            };
            debug!(path = %path, side, "file blocks a directory");
            let moved = MergedFile {
                content: file.content,
                conflicted: true,
            };
            (format!("{path}~{side}"), moved)
        })
        .collect()
}

/// Borrowed view that diffs and merges trees of a repository.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine<'r> {
    repo: &'r Repository,
}

impl<'r> DiffEngine<'r> {
    pub(crate) fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    /// Blob content; an absent blob reads as empty.
    fn blob_bytes(&self, oid: Option<&Oid>) -> Result<Vec<u8>, RepoError> {
        match oid {
            Some(oid) => self.repo.objects().get(oid, Some(ObjectKind::Blob)),
            None => Ok(Vec::new()),
        }
    }

    /// Blob content decoded for display.
    fn blob_text(&self, oid: Option<&Oid>) -> Result<String, RepoError> {
        let bytes = self.blob_bytes(oid)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Textual diff for every path whose content differs.
    ///
    /// With `unified`, the value is the unified diff lines; otherwise it is
    /// `None` and only the path is reported.
    pub fn diff_trees(
        &self,
        from: &FlatTree,
        to: &FlatTree,
        unified: bool,
    ) -> Result<BTreeMap<String, Option<Vec<String>>>, RepoError> {
        let mut result = BTreeMap::new();
        for (path, ids) in group_by_path(&[from, to]) {
            if ids[0] == ids[1] {
                continue;
            }
            let lines = if unified {
                let old = self.blob_text(ids[0].as_ref())?;
                let new = self.blob_text(ids[1].as_ref())?;
                let from_label = if ids[0].is_some() {
                    format!("a/{path}")
                } else {
                    "/dev/null".to_string()
                };
                let to_label = if ids[1].is_some() {
                    format!("b/{path}")
                } else {
                    "/dev/null".to_string()
                };
                Some(unified_diff(&old, &new, &from_label, &to_label))
            } else {
                None
            };
            result.insert(path, lines);
        }
        Ok(result)
    }

    /// Merge two trees without a common base.
    ///
    /// Paths whose content agrees are taken as-is; every other path gets a
    /// two-way merge where an absent side reads as empty.
    pub fn merge_trees(
        &self,
        head: &FlatTree,
        other: &FlatTree,
    ) -> Result<BTreeMap<String, MergedFile>, RepoError> {
        let mut result = BTreeMap::new();
        for (path, ids) in group_by_path(&[head, other]) {
            let merged = if ids[0] == ids[1] {
                MergedFile {
                    content: self.blob_bytes(ids[0].as_ref())?,
                    conflicted: false,
                }
            } else {
                let ours = self.blob_bytes(ids[0].as_ref())?;
                let theirs = self.blob_bytes(ids[1].as_ref())?;
                let merged = merge_two_way(&ours, &theirs);
                MergedFile {
                    conflicted: !merged.is_clean(),
                    content: merged.text,
                }
            };
            result.insert(path, merged);
        }
        Ok(result)
    }

    /// Merge `head` and `other` against `base` (path by path).
    ///
    /// Returns `None` for a path the merge deletes.
    fn merge_with_base(
        &self,
        base: &FlatTree,
        head: &FlatTree,
        other: &FlatTree,
    ) -> Result<BTreeMap<String, Option<MergedFile>>, RepoError> {
        let style = self.repo.config().conflict_style();

        let mut result = BTreeMap::new();
        for (path, ids) in group_by_path(&[base, head, other]) {
            let (b, h, o) = (&ids[0], &ids[1], &ids[2]);

            // Object-level resolution first: one side unchanged means the
            // other side's version (including deletion) wins.
            let taken = if h == o {
                Some(h)
            } else if b == h {
                Some(o)
            } else if b == o {
                Some(h)
            } else {
                None
            };

            let merged = match taken {
                Some(None) => None,
                Some(Some(oid)) => Some(MergedFile {
                    content: self.blob_bytes(Some(oid))?,
                    conflicted: false,
                }),
                None => {
                    let merged = merge_three_way(
                        &self.blob_bytes(b.as_ref())?,
                        &self.blob_bytes(h.as_ref())?,
                        &self.blob_bytes(o.as_ref())?,
                        style,
                    );
                    Some(MergedFile {
                        conflicted: !merged.is_clean(),
                        content: merged.text,
                    })
                }
            };
            result.insert(path, merged);
        }
        Ok(result)
    }

    /// Replace the working directory with the merge of two trees.
    ///
    /// With a base tree the merge is three-way; without one it falls back to
    /// [`DiffEngine::merge_trees`].
    pub fn materialize_merge(
        &self,
        base: Option<&Oid>,
        head: &Oid,
        other: &Oid,
    ) -> Result<MergeReport, RepoError> {
        let trees = self.repo.trees();
        let head_flat = trees.flatten_tree(head)?;
        let other_flat = trees.flatten_tree(other)?;

        let merged: BTreeMap<String, MergedFile> = match base {
            Some(base) => {
                let base_flat = trees.flatten_tree(base)?;
                self.merge_with_base(&base_flat, &head_flat, &other_flat)?
                    .into_iter()
                    .filter_map(|(path, file)| Some((path, file?)))
                    .collect()
            }
            None => self.merge_trees(&head_flat, &other_flat)?,
        };
        let files = resolve_path_collisions(merged, &head_flat);

        trees.clear_working_directory()?;

        let fs = self.repo.fs();
        let mut report = MergeReport::default();
        for (path, file) in files {
            let target = self.repo.paths().work_path(&path);
            if let Some(parent) = target.parent() {
                fs.make_directories(parent)?;
            }
            fs.write_file(&target, &file.content)?;
            if file.conflicted {
                report.conflicts.push(path.clone());
            }
            report.written.push(path);
        }
        report.written.sort();
        report.conflicts.sort();

        debug!(
            written = report.written.len(),
            conflicts = report.conflicts.len(),
            "materialized merge"
        );
        Ok(report)
    }

    /// Store every working-tree file as a blob and map its path to the id.
    pub fn working_tree(&self) -> Result<FlatTree, RepoError> {
        self.repo.require_initialized()?;

        let fs = self.repo.fs();
        let paths = self.repo.paths();
        let objects = self.repo.objects();
        let mut result = FlatTree::new();

        for entry in fs.walk(paths.work_dir())? {
            if entry.kind != EntryKind::File {
                continue;
            }
            let Some(rel) = paths.relative(&entry.path) else {
                continue;
            };
            if RepoPaths::is_ignored(Path::new(&rel)) {
                continue;
            }
            let bytes = fs.read_file(&entry.path)?;
            result.insert(rel, objects.put(&bytes, ObjectKind::Blob)?);
        }
        Ok(result)
    }

    /// Flattened tree of the commit HEAD points at (empty when unborn).
    pub fn head_tree(&self) -> Result<FlatTree, RepoError> {
        match self.repo.refs().head_oid()? {
            Some(oid) => {
                let commit = self.repo.graph().read_commit(&oid)?;
                self.repo.trees().flatten_tree(&commit.tree)
            }
            None => Ok(FlatTree::new()),
        }
    }

    /// Compare the working tree against HEAD.
    pub fn status(&self) -> Result<Status, RepoError> {
        let refs = self.repo.refs();
        let head = refs.head_state()?;
        let merge_head = refs
            .try_resolve(&RefName::merge_head(), true)?
            .and_then(|value| value.oid().cloned());

        let changes = changed_files(&self.head_tree()?, &self.working_tree()?)
            .into_iter()
            .filter(|(_, status)| status.is_change())
            .collect();

        Ok(Status {
            head,
            merge_head,
            changes,
        })
    }
}

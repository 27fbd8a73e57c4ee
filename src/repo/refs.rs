//! repo::refs
//!
//! Named references stored as files under `.mgit`.
//!
//! # Format
//!
//! A reference file holds either a bare object id (direct) or
//! `ref: <name>` (symbolic). Content is written without a trailing newline
//! and trimmed on read.
//!
//! # Resolution
//!
//! Symbolic chains are followed up to `refs.max_symref_depth` links.
//! A longer chain is reported as [`RepoError::RefCycle`] rather than
//! followed forever.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::{RepoError, Repository};
use crate::core::types::{BranchName, Oid, RefName, TagName};
use crate::fs::EntryKind;

/// Content of a reference file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    /// Points straight at an object.
    Direct(Oid),
    /// Points at another reference.
    Symbolic(RefName),
}

impl RefValue {
    /// Prefix marking symbolic content.
    pub const SYMBOLIC_PREFIX: &'static str = "ref: ";

    /// Whether this value names another reference.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, RefValue::Symbolic(_))
    }

    /// The object id or target name as text.
    pub fn value(&self) -> &str {
        match self {
            RefValue::Direct(oid) => oid.as_str(),
            RefValue::Symbolic(name) => name.as_str(),
        }
    }

    /// The object id of a direct value.
    pub fn oid(&self) -> Option<&Oid> {
        match self {
            RefValue::Direct(oid) => Some(oid),
            RefValue::Symbolic(_) => None,
        }
    }

    /// File content for this value.
    ///
    /// ```
    /// use mgit::core::types::RefName;
    /// use mgit::repo::RefValue;
    ///
    /// let value = RefValue::Symbolic(RefName::new("ref/heads/master").unwrap());
    /// assert_eq!(value.encode(), "ref: ref/heads/master");
    /// ```
    pub fn encode(&self) -> String {
        match self {
            RefValue::Direct(oid) => oid.to_string(),
            RefValue::Symbolic(name) => format!("{}{}", Self::SYMBOLIC_PREFIX, name),
        }
    }

    /// Parse reference file content.
    ///
    /// # Errors
    ///
    /// `RepoError::MalformedRef` if the content is neither a symbolic
    /// target nor an object id.
    pub fn parse(refname: &RefName, content: &str) -> Result<Self, RepoError> {
        let trimmed = content.trim();
        let malformed = || RepoError::MalformedRef {
            refname: refname.to_string(),
            content: content.to_string(),
        };

        if let Some(target) = trimmed.strip_prefix(Self::SYMBOLIC_PREFIX) {
            let target = RefName::new(target.trim()).map_err(|_| malformed())?;
            return Ok(RefValue::Symbolic(target));
        }
        Oid::new(trimmed)
            .map(RefValue::Direct)
            .map_err(|_| malformed())
    }
}

impl std::fmt::Display for RefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Where HEAD currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD names a branch (which may not exist yet).
    Attached(BranchName),
    /// HEAD holds an object id directly.
    Detached(Oid),
}

impl HeadState {
    /// The branch HEAD is attached to, if any.
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            HeadState::Attached(branch) => Some(branch),
            HeadState::Detached(_) => None,
        }
    }

    /// Whether HEAD is detached.
    pub fn is_detached(&self) -> bool {
        matches!(self, HeadState::Detached(_))
    }
}

/// Borrowed view over the references of a repository.
#[derive(Debug, Clone, Copy)]
pub struct RefStore<'r> {
    repo: &'r Repository,
}

impl<'r> RefStore<'r> {
    pub(crate) fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    // =========================================================================
    // Raw access
    // =========================================================================

    /// Read one reference file without following anything.
    fn read_raw(&self, name: &RefName) -> Result<Option<RefValue>, RepoError> {
        let path = self.repo.paths().ref_path(name);
        let fs = self.repo.fs();
        if !fs.is_file(&path) {
            return Ok(None);
        }
        let bytes = fs.read_file(&path)?;
        let content = String::from_utf8_lossy(&bytes);
        RefValue::parse(name, &content).map(Some)
    }

    /// Follow a symbolic chain from `name` (when `deref`) to the reference
    /// that actually holds or would hold the value.
    ///
    /// Returns that reference's name and its current value, if present.
    fn locate(
        &self,
        name: &RefName,
        deref: bool,
    ) -> Result<(RefName, Option<RefValue>), RepoError> {
        let limit = self.repo.config().max_symref_depth();
        let mut current = name.clone();
        let mut hops = 0;

        loop {
            match self.read_raw(&current)? {
                Some(RefValue::Symbolic(target)) if deref => {
                    if hops == limit {
                        return Err(RepoError::RefCycle {
                            refname: name.to_string(),
                            limit,
                        });
                    }
                    hops += 1;
                    current = target;
                }
                value => return Ok((current, value)),
            }
        }
    }

    // =========================================================================
    // Core operations
    // =========================================================================

    /// Write a reference.
    ///
    /// With `deref`, a symbolic chain starting at `name` is followed and the
    /// final reference in the chain is written instead.
    pub fn update(&self, name: &RefName, value: &RefValue, deref: bool) -> Result<(), RepoError> {
        self.repo.require_initialized()?;

        let (target, _) = self.locate(name, deref)?;
        let path = self.repo.paths().ref_path(&target);
        let fs = self.repo.fs();
        if let Some(parent) = path.parent() {
            fs.make_directories(parent)?;
        }
        fs.write_file(&path, value.encode().as_bytes())?;

        debug!(refname = %name, target = %target, value = %value, "updated ref");
        Ok(())
    }

    /// Read a reference.
    ///
    /// With `deref`, symbolic values are followed to the final direct value.
    ///
    /// # Errors
    ///
    /// - `RepoError::RefNotFound` naming the missing reference (the end of
    ///   the chain when dereferencing)
    /// - `RepoError::RefCycle` if the chain is too long
    pub fn resolve(&self, name: &RefName, deref: bool) -> Result<RefValue, RepoError> {
        self.repo.require_initialized()?;

        let (location, value) = self.locate(name, deref)?;
        value.ok_or_else(|| RepoError::RefNotFound {
            refname: location.to_string(),
        })
    }

    /// Like [`RefStore::resolve`], but a missing reference is `Ok(None)`.
    pub fn try_resolve(&self, name: &RefName, deref: bool) -> Result<Option<RefValue>, RepoError> {
        match self.resolve(name, deref) {
            Ok(value) => Ok(Some(value)),
            Err(RepoError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete a reference file.
    ///
    /// With `deref`, the final reference of a symbolic chain is deleted.
    /// Deleting a missing reference is not an error.
    pub fn delete(&self, name: &RefName, deref: bool) -> Result<(), RepoError> {
        self.repo.require_initialized()?;

        let (target, value) = self.locate(name, deref)?;
        if value.is_some() {
            self.repo
                .fs()
                .delete_file(&self.repo.paths().ref_path(&target))?;
            debug!(refname = %target, "deleted ref");
        }
        Ok(())
    }

    /// Turn a user-supplied name into an object id.
    ///
    /// `@` means `HEAD`. Otherwise the name is tried, in order, as
    /// `<name>`, `ref/<name>`, `ref/tags/<name>`, and `ref/heads/<name>`;
    /// the first that resolves to an object id wins. A syntactically valid
    /// object id is accepted as-is when no reference matches.
    ///
    /// # Errors
    ///
    /// `RepoError::NameNotResolved` when nothing matches.
    pub fn resolve_to_id(&self, name: &str) -> Result<Oid, RepoError> {
        self.repo.require_initialized()?;

        let name = if name == "@" { "HEAD" } else { name };
        let candidates = [
            name.to_string(),
            format!("{}/{}", RefName::ROOT, name),
            format!("{}{}", RefName::TAGS_PREFIX, name),
            format!("{}{}", RefName::HEADS_PREFIX, name),
        ];

        for candidate in candidates {
            let Ok(refname) = RefName::new(candidate) else {
                continue;
            };
            match self.resolve(&refname, true) {
                Ok(RefValue::Direct(oid)) => {
                    debug!(name, refname = %refname, oid = %oid, "resolved name");
                    return Ok(oid);
                }
                Ok(RefValue::Symbolic(_)) | Err(RepoError::RefNotFound { .. }) => {}
                // Names like "objects/<id>" point at files that are not refs.
                Err(RepoError::MalformedRef { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if Oid::is_valid(name) {
            return Ok(Oid::new(name)?);
        }
        Err(RepoError::NameNotResolved {
            name: name.to_string(),
        })
    }

    /// Every reference whose name starts with `prefix`.
    ///
    /// Order: `HEAD`, then `MERGE_HEAD` if present, then the files under
    /// `ref/` sorted by name. With `deref`, values are dereferenced and
    /// symbolic references whose target does not exist are skipped.
    pub fn iterate(&self, prefix: &str, deref: bool) -> Result<Vec<(RefName, RefValue)>, RepoError> {
        self.repo.require_initialized()?;

        let mut names = vec![RefName::head()];
        let merge_head = RefName::merge_head();
        if self
            .repo
            .fs()
            .is_file(&self.repo.paths().ref_path(&merge_head))
        {
            names.push(merge_head);
        }
        names.extend(self.list_ref_files()?);

        let mut result = Vec::new();
        for name in names {
            if !name.as_str().starts_with(prefix) {
                continue;
            }
            match self.resolve(&name, deref) {
                Ok(value) => result.push((name, value)),
                Err(RepoError::RefNotFound { .. }) => {
                    debug!(refname = %name, "skipping dangling ref");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// Names of all files under `ref/`, sorted.
    fn list_ref_files(&self) -> Result<Vec<RefName>, RepoError> {
        let store = self.repo.paths().store_dir();
        let root = self.repo.paths().ref_root();
        let fs = self.repo.fs();
        if !fs.is_dir(&root) {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs.walk(&root)? {
            if entry.kind != EntryKind::File {
                continue;
            }
            match relative_ref_name(&store, &entry.path) {
                Some(name) => names.push(name),
                None => debug!(path = %entry.path.display(), "skipping unrecognized ref file"),
            }
        }
        names.sort();
        Ok(names)
    }

    // =========================================================================
    // Convenience
    // =========================================================================

    /// Where HEAD points, without dereferencing.
    pub fn head_state(&self) -> Result<HeadState, RepoError> {
        match self.resolve(&RefName::head(), false)? {
            RefValue::Direct(oid) => Ok(HeadState::Detached(oid)),
            RefValue::Symbolic(target) => match target.branch_name() {
                Some(branch) => Ok(HeadState::Attached(branch)),
                None => {
                    let value = self.resolve(&target, true)?;
                    match value {
                        RefValue::Direct(oid) => Ok(HeadState::Detached(oid)),
                        RefValue::Symbolic(_) => Err(RepoError::MalformedRef {
                            refname: RefName::head().to_string(),
                            content: target.to_string(),
                        }),
                    }
                }
            },
        }
    }

    /// The commit HEAD points at, or `None` on an unborn branch.
    pub fn head_oid(&self) -> Result<Option<Oid>, RepoError> {
        Ok(self
            .try_resolve(&RefName::head(), true)?
            .and_then(|value| value.oid().cloned()))
    }

    /// Whether `name` is an existing branch.
    pub fn is_branch(&self, name: &str) -> Result<bool, RepoError> {
        let Ok(branch) = BranchName::new(name) else {
            return Ok(false);
        };
        Ok(self
            .try_resolve(&RefName::for_branch(&branch), false)?
            .is_some())
    }

    /// Point a branch at a commit, creating or moving it.
    pub fn create_branch(&self, branch: &BranchName, start: &Oid) -> Result<(), RepoError> {
        self.update(
            &RefName::for_branch(branch),
            &RefValue::Direct(start.clone()),
            true,
        )
    }

    /// All branches with the commit they point at.
    pub fn list_branches(&self) -> Result<BTreeMap<BranchName, Oid>, RepoError> {
        let mut branches = BTreeMap::new();
        for (name, value) in self.iterate(RefName::HEADS_PREFIX, true)? {
            if let (Some(branch), Some(oid)) = (name.branch_name(), value.oid()) {
                branches.insert(branch, oid.clone());
            }
        }
        Ok(branches)
    }

    /// All tags with the object they point at.
    pub fn list_tags(&self) -> Result<BTreeMap<TagName, Oid>, RepoError> {
        let mut tags = BTreeMap::new();
        for (name, value) in self.iterate(RefName::TAGS_PREFIX, true)? {
            let tag = name
                .strip_prefix(RefName::TAGS_PREFIX)
                .and_then(|short| TagName::new(short).ok());
            if let (Some(tag), Some(oid)) = (tag, value.oid()) {
                tags.insert(tag, oid.clone());
            }
        }
        Ok(tags)
    }
}

/// Reference name of a file below the store directory.
fn relative_ref_name(store: &Path, path: &Path) -> Option<RefName> {
    let rel = path.strip_prefix(store).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    RefName::new(parts?.join("/")).ok()
}

//! repo::commit
//!
//! Commits, history traversal, and the operations that move HEAD.
//!
//! # Format
//!
//! ```text
//! tree <oid>
//! parent <oid>        (zero or more, in parent order)
//!
//! <message>
//! ```
//!
//! # HEAD states
//!
//! HEAD is either attached (symbolic, naming a branch) or detached (a bare
//! commit id). `commit` advances whichever HEAD names; `checkout` switches
//! between the two; `reset` requires an attached HEAD.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use super::diff::MergeReport;
use super::refs::{HeadState, RefValue};
use super::{RepoError, Repository};
use crate::core::types::{BranchName, ObjectKind, Oid, RefName, TagName};

/// A parsed commit object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: Oid,
    /// Parent commits, first parent first.
    pub parents: Vec<Oid>,
    /// Message exactly as given.
    pub message: String,
}

impl Commit {
    pub fn new(tree: Oid, parents: Vec<Oid>, message: impl Into<String>) -> Self {
        Self {
            tree,
            parents,
            message: message.into(),
        }
    }

    /// Serialize to the commit payload format.
    ///
    /// ```
    /// use mgit::core::types::Oid;
    /// use mgit::repo::Commit;
    ///
    /// let tree = Oid::new("a".repeat(40)).unwrap();
    /// let commit = Commit::new(tree, vec![], "first");
    /// assert_eq!(commit.encode(), format!("tree {}\n\nfirst", "a".repeat(40)));
    /// ```
    pub fn encode(&self) -> String {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push('\n');
        out.push_str(&self.message);
        out
    }

    /// Parse a commit payload.
    ///
    /// `oid` is only used for error messages.
    ///
    /// # Errors
    ///
    /// `RepoError::MalformedCommit` on an unknown header key, a repeated or
    /// missing `tree` line, or an invalid id.
    pub fn parse(oid: &Oid, payload: &[u8]) -> Result<Self, RepoError> {
        let malformed = |message: String| RepoError::MalformedCommit {
            oid: oid.to_string(),
            message,
        };
        let text = std::str::from_utf8(payload).map_err(|e| malformed(e.to_string()))?;

        let (header, message) = match text.split_once("\n\n") {
            Some((header, message)) => (header, message),
            None => (text.trim_end_matches('\n'), ""),
        };

        let mut tree = None;
        let mut parents = Vec::new();
        for line in header.lines() {
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            let id = || Oid::new(value).map_err(|e| malformed(e.to_string()));
            match key {
                "tree" if tree.is_none() => tree = Some(id()?),
                "tree" => return Err(malformed("more than one tree line".to_string())),
                "parent" => parents.push(id()?),
                other => return Err(malformed(format!("unknown header key {other:?}"))),
            }
        }

        let tree = tree.ok_or_else(|| malformed("missing tree line".to_string()))?;
        Ok(Self {
            tree,
            parents,
            message: message.to_string(),
        })
    }
}

/// How far `reset` goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetMode {
    /// Move the branch only.
    #[default]
    Soft,
    /// Move the branch and replace the working directory.
    Hard,
}

/// What `merge` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The other commit is already an ancestor of HEAD.
    UpToDate,
    /// HEAD was an ancestor of the other commit and moved to it.
    FastForward { from: Oid, to: Oid },
    /// The trees were merged into the working directory and `MERGE_HEAD`
    /// was written; the next `commit` records both parents.
    Merged {
        base: Option<Oid>,
        report: MergeReport,
    },
}

/// One line of history with the references pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub oid: Oid,
    #[serde(flatten)]
    pub commit: Commit,
    pub refs: Vec<RefName>,
}

/// Lazy walk over the commits reachable from a set of roots.
///
/// Each reachable id is yielded once. A commit's parents are read only
/// when the next id is pulled, so abandoning the iterator early skips the
/// remaining reads. After the first error the iterator ends.
#[derive(Debug)]
pub struct Ancestry<'r> {
    graph: CommitGraph<'r>,
    queue: VecDeque<Oid>,
    visited: HashSet<Oid>,
    expand: Option<Oid>,
    failed: bool,
}

impl Iterator for Ancestry<'_> {
    type Item = Result<Oid, RepoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Some(oid) = self.expand.take() {
            match self.graph.read_commit(&oid) {
                Ok(commit) => {
                    let mut parents = commit.parents.into_iter();
                    if let Some(first) = parents.next() {
                        self.queue.push_front(first);
                    }
                    self.queue.extend(parents);
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        while let Some(oid) = self.queue.pop_front() {
            if self.visited.insert(oid.clone()) {
                self.expand = Some(oid.clone());
                return Some(Ok(oid));
            }
        }
        None
    }
}

/// Borrowed view over the commit history of a repository.
#[derive(Debug, Clone, Copy)]
pub struct CommitGraph<'r> {
    repo: &'r Repository,
}

impl<'r> CommitGraph<'r> {
    pub(crate) fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    // =========================================================================
    // Objects
    // =========================================================================

    /// Store a commit object.
    pub fn write_commit(&self, commit: &Commit) -> Result<Oid, RepoError> {
        self.repo
            .objects()
            .put(commit.encode().as_bytes(), ObjectKind::Commit)
    }

    /// Load and parse a commit object.
    pub fn read_commit(&self, oid: &Oid) -> Result<Commit, RepoError> {
        let payload = self.repo.objects().get(oid, Some(ObjectKind::Commit))?;
        Commit::parse(oid, &payload)
    }

    /// Snapshot the working directory and record it on top of HEAD.
    ///
    /// When a merge is in progress the `MERGE_HEAD` commit becomes the
    /// second parent and `MERGE_HEAD` is removed.
    pub fn commit(&self, message: &str) -> Result<Oid, RepoError> {
        self.repo.require_initialized()?;
        let refs = self.repo.refs();

        let head = refs.resolve(&RefName::head(), false)?;
        let tree = self
            .repo
            .trees()
            .snapshot_directory(self.repo.work_dir())?;

        let mut parents = Vec::new();
        if let Some(parent) = refs.head_oid()? {
            parents.push(parent);
        }
        let merge_head = refs
            .try_resolve(&RefName::merge_head(), true)?
            .and_then(|value| value.oid().cloned());
        if let Some(other) = &merge_head {
            parents.push(other.clone());
        }

        let oid = self.write_commit(&Commit::new(tree, parents, message))?;

        if merge_head.is_some() {
            refs.delete(&RefName::merge_head(), false)?;
        }
        // Through a symbolic HEAD this moves the branch; a detached HEAD is
        // overwritten directly.
        refs.update(&RefName::head(), &RefValue::Direct(oid.clone()), true)?;

        debug!(oid = %oid, attached = head.is_symbolic(), "created commit");
        Ok(oid)
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Walk the commits reachable from `roots`.
    ///
    /// First parents are explored before queued siblings, which keeps the
    /// walk close to the mainline.
    pub fn ancestry<I>(&self, roots: I) -> Ancestry<'r>
    where
        I: IntoIterator<Item = Oid>,
    {
        Ancestry {
            graph: *self,
            queue: roots.into_iter().collect(),
            visited: HashSet::new(),
            expand: None,
            failed: false,
        }
    }

    /// A common ancestor of `a` and `b`.
    ///
    /// Returns the first ancestor of `b`, in [`CommitGraph::ancestry`]
    /// order, that is also an ancestor of `a`. With criss-cross histories
    /// this is not necessarily the unique lowest common ancestor.
    pub fn merge_base(&self, a: &Oid, b: &Oid) -> Result<Option<Oid>, RepoError> {
        let ancestors_of_a = self
            .ancestry([a.clone()])
            .collect::<Result<HashSet<_>, _>>()?;

        for oid in self.ancestry([b.clone()]) {
            let oid = oid?;
            if ancestors_of_a.contains(&oid) {
                return Ok(Some(oid));
            }
        }
        Ok(None)
    }

    /// Whether `ancestor` is reachable from `descendant` (or equal to it).
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, RepoError> {
        for oid in self.ancestry([descendant.clone()]) {
            if &oid? == ancestor {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// History from `start` with the references pointing at each commit.
    ///
    /// Annotations come from dereferenced references; dangling references
    /// simply annotate nothing.
    pub fn log(&self, start: &Oid) -> Result<Vec<LogEntry>, RepoError> {
        let mut annotations: HashMap<Oid, Vec<RefName>> = HashMap::new();
        for (name, value) in self.repo.refs().iterate("", true)? {
            if let Some(oid) = value.oid() {
                annotations.entry(oid.clone()).or_default().push(name);
            }
        }

        let mut entries = Vec::new();
        for oid in self.ancestry([start.clone()]) {
            let oid = oid?;
            let commit = self.read_commit(&oid)?;
            let refs = annotations.remove(&oid).unwrap_or_default();
            entries.push(LogEntry { oid, commit, refs });
        }
        Ok(entries)
    }

    // =========================================================================
    // Moving HEAD
    // =========================================================================

    /// Switch the working directory and HEAD to `name`.
    ///
    /// A branch name attaches HEAD to that branch; anything else detaches
    /// HEAD at the resolved commit. The working directory is replaced
    /// before HEAD changes, so a failed materialization leaves HEAD alone.
    pub fn checkout(&self, name: &str) -> Result<HeadState, RepoError> {
        let refs = self.repo.refs();
        let oid = refs.resolve_to_id(name)?;
        let commit = self.read_commit(&oid)?;

        self.repo.trees().replace_working_tree(&commit.tree)?;

        let state = if refs.is_branch(name)? {
            let branch = BranchName::new(name)?;
            refs.update(
                &RefName::head(),
                &RefValue::Symbolic(RefName::for_branch(&branch)),
                false,
            )?;
            HeadState::Attached(branch)
        } else {
            refs.update(&RefName::head(), &RefValue::Direct(oid.clone()), false)?;
            HeadState::Detached(oid)
        };

        debug!(name, state = ?state, "checked out");
        Ok(state)
    }

    /// Point the current branch at `name`.
    ///
    /// # Errors
    ///
    /// `RepoError::DetachedHead` if HEAD is not attached to a branch.
    pub fn reset(&self, name: &str, mode: ResetMode) -> Result<Oid, RepoError> {
        let refs = self.repo.refs();
        let branch = match refs.head_state()? {
            HeadState::Attached(branch) => branch,
            HeadState::Detached(_) => {
                return Err(RepoError::DetachedHead {
                    operation: "reset".to_string(),
                })
            }
        };

        let oid = refs.resolve_to_id(name)?;
        let commit = self.read_commit(&oid)?;
        if mode == ResetMode::Hard {
            self.repo.trees().replace_working_tree(&commit.tree)?;
        }
        refs.update(
            &RefName::for_branch(&branch),
            &RefValue::Direct(oid.clone()),
            false,
        )?;

        debug!(branch = %branch, oid = %oid, mode = ?mode, "reset branch");
        Ok(oid)
    }

    /// Create a tag. Tags are never moved once created.
    pub fn create_tag(&self, tag: &TagName, target: &Oid) -> Result<(), RepoError> {
        let refs = self.repo.refs();
        let name = RefName::for_tag(tag);
        if refs.try_resolve(&name, false)?.is_some() {
            return Err(RepoError::RefAlreadyExists {
                refname: name.to_string(),
            });
        }
        refs.update(&name, &RefValue::Direct(target.clone()), false)
    }

    /// Create a branch that does not exist yet.
    pub fn create_branch(&self, branch: &BranchName, start: &Oid) -> Result<(), RepoError> {
        let refs = self.repo.refs();
        let name = RefName::for_branch(branch);
        if refs.try_resolve(&name, false)?.is_some() {
            return Err(RepoError::RefAlreadyExists {
                refname: name.to_string(),
            });
        }
        refs.create_branch(branch, start)
    }

    /// Merge the commit named by `name` into HEAD.
    ///
    /// # Errors
    ///
    /// `RepoError::NoCommits` if HEAD does not point at a commit yet.
    pub fn merge(&self, name: &str) -> Result<MergeOutcome, RepoError> {
        let refs = self.repo.refs();
        let head = refs.head_oid()?.ok_or(RepoError::NoCommits)?;
        let other = refs.resolve_to_id(name)?;
        let other_commit = self.read_commit(&other)?;

        let base = self.merge_base(&other, &head)?;

        if base.as_ref() == Some(&other) {
            debug!(head = %head, other = %other, "already up to date");
            return Ok(MergeOutcome::UpToDate);
        }

        if base.as_ref() == Some(&head) {
            self.repo.trees().replace_working_tree(&other_commit.tree)?;
            refs.update(&RefName::head(), &RefValue::Direct(other.clone()), true)?;
            debug!(from = %head, to = %other, "fast-forward merge");
            return Ok(MergeOutcome::FastForward {
                from: head,
                to: other,
            });
        }

        let head_commit = self.read_commit(&head)?;
        let base_tree = match &base {
            Some(base) => Some(self.read_commit(base)?.tree),
            None => None,
        };

        let report = self.repo.diff().materialize_merge(
            base_tree.as_ref(),
            &head_commit.tree,
            &other_commit.tree,
        )?;
        refs.update(&RefName::merge_head(), &RefValue::Direct(other.clone()), false)?;

        debug!(
            head = %head,
            other = %other,
            conflicts = report.conflicts.len(),
            "merged into working directory"
        );
        Ok(MergeOutcome::Merged { base, report })
    }
}

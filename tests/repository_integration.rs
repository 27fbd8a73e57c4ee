//! Integration tests for the repository engine on a real filesystem.
//!
//! Each test builds a repository in a fresh temporary directory and drives
//! it through the public `Repository` API: snapshots, commits, references,
//! checkout, reset, and merges.

use std::collections::BTreeMap;
use std::path::Path;

use tempfile::TempDir;

use mgit::core::config::GlobalConfig;
use mgit::core::types::{BranchName, ObjectKind, Oid, RefName, TagName};
use mgit::fs::LocalFileSystem;
use mgit::repo::diff::changed_files;
use mgit::repo::{
    FileStatus, FlatTree, HeadState, MergeOutcome, ObjectStore, RefValue, RepoError, Repository,
    ResetMode, TreeEntryKind,
};

// =============================================================================
// Test Fixtures
// =============================================================================

/// A repository in its own temporary directory.
struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    /// Create a fresh repository with default configuration.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = Repository::init_with(
            Box::new(LocalFileSystem::new()),
            dir.path(),
            GlobalConfig::default(),
        )
        .expect("init failed");
        Self { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a working-tree file, creating parent directories.
    fn write(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path().join(rel)).unwrap()
    }

    fn exists(&self, rel: &str) -> bool {
        self.path().join(rel).exists()
    }

    fn remove(&self, rel: &str) {
        std::fs::remove_file(self.path().join(rel)).unwrap();
    }

    /// Commit the whole working directory.
    fn commit(&self, message: &str) -> Oid {
        self.repo.graph().commit(message).expect("commit failed")
    }

    fn branch(&self, name: &str, start: &Oid) {
        let branch = BranchName::new(name).unwrap();
        self.repo.graph().create_branch(&branch, start).unwrap();
    }

    fn head(&self) -> Oid {
        self.repo.refs().head_oid().unwrap().expect("HEAD has no commit")
    }

    fn merge_head(&self) -> Option<RefValue> {
        self.repo
            .refs()
            .try_resolve(&RefName::merge_head(), false)
            .unwrap()
    }
}

/// Every regular file below `root` (excluding `.mgit`) with its contents.
fn collect_files(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if entry.file_name() == ".mgit" {
                continue;
            }
            if entry.file_type().unwrap().is_dir() {
                pending.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                files.insert(rel.replace('\\', "/"), std::fs::read(&path).unwrap());
            }
        }
    }
    files
}

fn count_objects(repo: &TestRepo) -> usize {
    std::fs::read_dir(repo.repo.paths().objects_dir())
        .unwrap()
        .count()
}

// =============================================================================
// Repository lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn init_creates_store_with_head_on_default_branch() {
        let t = TestRepo::new();
        assert!(t.path().join(".mgit/objects").is_dir());
        assert_eq!(
            std::fs::read_to_string(t.path().join(".mgit/HEAD")).unwrap(),
            "ref: ref/heads/master"
        );
        assert_eq!(
            t.repo.refs().head_state().unwrap(),
            HeadState::Attached(BranchName::new("master").unwrap())
        );
        assert_eq!(t.repo.refs().head_oid().unwrap(), None);
    }

    #[test]
    fn second_init_fails_and_changes_nothing() {
        let t = TestRepo::new();
        t.write("f", "x");
        t.commit("first");

        let store = t.path().join(".mgit");
        let before = collect_files(&store);

        let err = Repository::init_with(
            Box::new(LocalFileSystem::new()),
            t.path(),
            GlobalConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::AlreadyExists { .. }));
        assert_eq!(collect_files(&store), before);
    }

    #[test]
    fn open_finds_existing_store() {
        let t = TestRepo::new();
        t.write("f", "x");
        let first = t.commit("first");

        let reopened = Repository::open_with(
            Box::new(LocalFileSystem::new()),
            t.path(),
            GlobalConfig::default(),
        )
        .unwrap();
        assert_eq!(reopened.refs().head_oid().unwrap(), Some(first));
    }

    #[test]
    fn discover_searches_parent_directories() {
        let t = TestRepo::new();
        t.write("a/b/c.txt", "deep");
        let repo = Repository::discover(
            Box::new(LocalFileSystem::new()),
            &t.path().join("a/b"),
            GlobalConfig::default(),
        )
        .unwrap();
        assert_eq!(repo.work_dir(), t.path());
    }

    #[test]
    fn open_without_store_fails() {
        let dir = TempDir::new().unwrap();
        let err = Repository::open_with(
            Box::new(LocalFileSystem::new()),
            dir.path(),
            GlobalConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepoError::NotInitialized { .. }));
    }

    #[test]
    fn operations_fail_once_store_is_removed() {
        let t = TestRepo::new();
        std::fs::remove_dir_all(t.path().join(".mgit")).unwrap();

        let err = t.repo.objects().put(b"x", ObjectKind::Blob).unwrap_err();
        assert!(matches!(err, RepoError::NotInitialized { .. }));
        let err = t.repo.graph().commit("nope").unwrap_err();
        assert!(matches!(err, RepoError::NotInitialized { .. }));
    }
}

// =============================================================================
// Objects and trees
// =============================================================================

mod objects {
    use super::*;

    #[test]
    fn same_payload_is_stored_once() {
        let t = TestRepo::new();
        let objects = t.repo.objects();

        let first = objects.put(b"payload", ObjectKind::Blob).unwrap();
        let second = objects.put(b"payload", ObjectKind::Blob).unwrap();
        assert_eq!(first, second);
        assert_eq!(count_objects(&t), 1);

        let other = objects.put(b"other payload", ObjectKind::Blob).unwrap();
        assert_ne!(first, other);
        assert_eq!(count_objects(&t), 2);
    }

    #[test]
    fn object_file_holds_kind_tag_and_payload() {
        let t = TestRepo::new();
        let oid = t.repo.objects().put(b"hello", ObjectKind::Blob).unwrap();
        assert_eq!(oid, ObjectStore::hash(b"hello", ObjectKind::Blob));

        let raw = std::fs::read(t.repo.paths().object_path(oid.as_str())).unwrap();
        assert_eq!(raw, b"blob\0hello");
    }

    #[test]
    fn kind_is_checked_on_read() {
        let t = TestRepo::new();
        let oid = t.repo.objects().put(b"hello", ObjectKind::Blob).unwrap();
        let err = t
            .repo
            .objects()
            .get(&oid, Some(ObjectKind::Commit))
            .unwrap_err();
        assert!(matches!(err, RepoError::KindMismatch { .. }));
    }

    #[test]
    fn snapshot_and_materialize_round_trip() {
        let t = TestRepo::new();
        t.write("top.txt", "top\n");
        t.write("src/main.rs", "fn main() {}\n");
        t.write("src/nested/deep/leaf.bin", "\u{0}\u{1}\u{2}");
        t.write("docs/readme.md", "# docs\n");

        let tree = t.repo.trees().snapshot_directory(t.path()).unwrap();

        let target = TempDir::new().unwrap();
        t.repo
            .trees()
            .materialize_directory(&tree, target.path())
            .unwrap();

        assert_eq!(collect_files(target.path()), collect_files(t.path()));
    }

    #[test]
    fn snapshot_skips_store_directory() {
        let t = TestRepo::new();
        t.write("f", "x");
        let tree = t.repo.trees().snapshot_directory(t.path()).unwrap();

        let entries = t.repo.trees().read_tree(&tree).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["f"]);
    }

    #[test]
    fn read_tree_replaces_working_directory() {
        let t = TestRepo::new();
        t.write("keep.txt", "v1");
        let tree = t.repo.trees().snapshot_directory(t.path()).unwrap();

        t.write("keep.txt", "v2");
        t.write("extra/new.txt", "new");
        t.repo.trees().replace_working_tree(&tree).unwrap();

        assert_eq!(t.read("keep.txt"), "v1");
        assert!(!t.exists("extra/new.txt"));
        assert!(!t.exists("extra"));
        assert!(t.path().join(".mgit/HEAD").exists());
    }
}

// =============================================================================
// References
// =============================================================================

mod references {
    use super::*;

    fn name(s: &str) -> RefName {
        RefName::new(s).unwrap()
    }

    #[test]
    fn symbolic_chain_dereferences() {
        let t = TestRepo::new();
        let refs = t.repo.refs();
        let oid = t.repo.objects().put(b"x", ObjectKind::Blob).unwrap();

        refs.update(&name("ref/heads/c"), &RefValue::Direct(oid.clone()), false)
            .unwrap();
        refs.update(
            &name("ref/heads/b"),
            &RefValue::Symbolic(name("ref/heads/c")),
            false,
        )
        .unwrap();
        refs.update(
            &name("ref/heads/a"),
            &RefValue::Symbolic(name("ref/heads/b")),
            false,
        )
        .unwrap();

        assert_eq!(
            refs.resolve(&name("ref/heads/a"), true).unwrap(),
            RefValue::Direct(oid)
        );
        assert_eq!(
            refs.resolve(&name("ref/heads/a"), false).unwrap(),
            RefValue::Symbolic(name("ref/heads/b"))
        );
    }

    #[test]
    fn reference_cycle_is_reported() {
        let t = TestRepo::new();
        let refs = t.repo.refs();
        refs.update(
            &name("ref/heads/x"),
            &RefValue::Symbolic(name("ref/heads/y")),
            false,
        )
        .unwrap();
        refs.update(
            &name("ref/heads/y"),
            &RefValue::Symbolic(name("ref/heads/x")),
            false,
        )
        .unwrap();

        let err = refs.resolve(&name("ref/heads/x"), true).unwrap_err();
        assert!(matches!(err, RepoError::RefCycle { .. }));
    }

    #[test]
    fn names_resolve_through_search_order() {
        let t = TestRepo::new();
        t.write("f", "x");
        let first = t.commit("first");
        let tag = TagName::new("v1").unwrap();
        t.repo.graph().create_tag(&tag, &first).unwrap();

        let refs = t.repo.refs();
        assert_eq!(refs.resolve_to_id("@").unwrap(), first);
        assert_eq!(refs.resolve_to_id("HEAD").unwrap(), first);
        assert_eq!(refs.resolve_to_id("master").unwrap(), first);
        assert_eq!(refs.resolve_to_id("heads/master").unwrap(), first);
        assert_eq!(refs.resolve_to_id("v1").unwrap(), first);
        assert_eq!(refs.resolve_to_id(first.as_str()).unwrap(), first);

        let err = refs.resolve_to_id("nope").unwrap_err();
        assert!(matches!(err, RepoError::NameNotResolved { .. }));
    }

    #[test]
    fn tags_cannot_be_moved() {
        let t = TestRepo::new();
        t.write("f", "1");
        let first = t.commit("first");
        t.write("f", "2");
        let second = t.commit("second");

        let tag = TagName::new("v1").unwrap();
        t.repo.graph().create_tag(&tag, &first).unwrap();
        let err = t.repo.graph().create_tag(&tag, &second).unwrap_err();
        assert!(matches!(err, RepoError::RefAlreadyExists { .. }));

        let tags = t.repo.refs().list_tags().unwrap();
        assert_eq!(tags.get(&tag), Some(&first));
    }

    #[test]
    fn branches_are_listed_by_name() {
        let t = TestRepo::new();
        t.write("f", "1");
        let first = t.commit("first");
        t.branch("feature", &first);
        t.branch("bugfix/one", &first);

        let names: Vec<String> = t
            .repo
            .refs()
            .list_branches()
            .unwrap()
            .into_keys()
            .map(String::from)
            .collect();
        assert_eq!(names, vec!["bugfix/one", "feature", "master"]);
    }
}

// =============================================================================
// Commits and history
// =============================================================================

mod history {
    use super::*;

    #[test]
    fn first_commit_has_no_parents_second_has_one() {
        let t = TestRepo::new();
        t.write("f", "x");
        let first = t.commit("first");

        let commit = t.repo.graph().read_commit(&first).unwrap();
        assert!(commit.parents.is_empty());
        assert_eq!(commit.message, "first");
        let entries = t.repo.trees().read_tree(&commit.tree).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "f");
        assert_eq!(entries[0].kind(), TreeEntryKind::Blob);

        t.write("f", "y");
        let second = t.commit("second");
        let commit = t.repo.graph().read_commit(&second).unwrap();
        assert_eq!(commit.parents, vec![first]);

        assert_eq!(t.head(), second);
        assert_eq!(
            std::fs::read_to_string(t.path().join(".mgit/ref/heads/master")).unwrap(),
            second.as_str()
        );
    }

    #[test]
    fn merge_base_of_forked_history() {
        let t = TestRepo::new();
        t.write("f", "a");
        let _a = t.commit("A");
        t.write("f", "b");
        let b = t.commit("B");
        t.write("f", "c");
        let c = t.commit("C");

        t.branch("side", &b);
        t.repo.graph().checkout("side").unwrap();
        t.write("g", "d");
        let d = t.commit("D");

        assert_eq!(t.repo.graph().merge_base(&c, &d).unwrap(), Some(b.clone()));
        assert!(t.repo.graph().is_ancestor(&b, &c).unwrap());
        assert!(!t.repo.graph().is_ancestor(&c, &d).unwrap());
    }

    #[test]
    fn log_walks_history_with_annotations() {
        let t = TestRepo::new();
        t.write("f", "1");
        let first = t.commit("first");
        t.write("f", "2");
        let second = t.commit("second");
        t.repo
            .graph()
            .create_tag(&TagName::new("v1").unwrap(), &first)
            .unwrap();

        let log = t.repo.graph().log(&second).unwrap();
        let ids: Vec<&Oid> = log.iter().map(|entry| &entry.oid).collect();
        assert_eq!(ids, vec![&second, &first]);

        assert!(log[0].refs.contains(&RefName::head()));
        assert!(log[0].refs.contains(&RefName::new("ref/heads/master").unwrap()));
        assert_eq!(log[1].refs, vec![RefName::new("ref/tags/v1").unwrap()]);
    }

    #[test]
    fn ancestry_of_diamond_yields_each_commit_once() {
        let t = TestRepo::new();
        t.write("base.txt", "base");
        let base = t.commit("base");
        t.branch("side", &base);

        t.write("main.txt", "main");
        let main = t.commit("main");

        t.repo.graph().checkout("side").unwrap();
        t.write("side.txt", "side");
        let side = t.commit("side");

        t.repo.graph().checkout("master").unwrap();
        let outcome = t.repo.graph().merge("side").unwrap();
        assert!(matches!(outcome, MergeOutcome::Merged { .. }));
        let merge = t.commit("merge side");

        let walked: Vec<Oid> = t
            .repo
            .graph()
            .ancestry([merge.clone()])
            .collect::<Result<_, _>>()
            .unwrap();
        // First parents are followed depth-first; other parents wait at the back.
        assert_eq!(walked, vec![merge, main, base, side]);
    }
}

// =============================================================================
// Checkout and reset
// =============================================================================

mod moving_head {
    use super::*;

    #[test]
    fn checkout_branch_attaches_head_and_replaces_files() {
        let t = TestRepo::new();
        t.write("f", "one");
        let first = t.commit("first");
        t.branch("old", &first);

        t.write("f", "two");
        t.write("g", "only on master");
        t.commit("second");

        let state = t.repo.graph().checkout("old").unwrap();
        assert_eq!(state, HeadState::Attached(BranchName::new("old").unwrap()));
        assert_eq!(t.read("f"), "one");
        assert!(!t.exists("g"));
        assert_eq!(t.head(), first);
    }

    #[test]
    fn checkout_id_detaches_head() {
        let t = TestRepo::new();
        t.write("f", "one");
        let first = t.commit("first");
        t.write("f", "two");
        t.commit("second");

        let state = t.repo.graph().checkout(first.as_str()).unwrap();
        assert_eq!(state, HeadState::Detached(first.clone()));
        assert_eq!(
            std::fs::read_to_string(t.path().join(".mgit/HEAD")).unwrap(),
            first.as_str()
        );
        assert_eq!(t.read("f"), "one");
    }

    #[test]
    fn reset_moves_branch_and_optionally_files() {
        let t = TestRepo::new();
        t.write("f", "one");
        let first = t.commit("first");
        t.write("f", "two");
        t.commit("second");

        t.repo.graph().reset(first.as_str(), ResetMode::Soft).unwrap();
        assert_eq!(t.head(), first);
        assert_eq!(t.read("f"), "two");

        t.write("f", "three");
        let third = t.commit("third");
        t.repo.graph().reset(first.as_str(), ResetMode::Hard).unwrap();
        assert_eq!(t.head(), first);
        assert_eq!(t.read("f"), "one");
        assert_ne!(third, first);
    }

    #[test]
    fn reset_with_detached_head_is_rejected() {
        let t = TestRepo::new();
        t.write("f", "one");
        let first = t.commit("first");
        t.repo.graph().checkout(first.as_str()).unwrap();

        let err = t.repo.graph().reset("master", ResetMode::Soft).unwrap_err();
        assert!(matches!(err, RepoError::DetachedHead { .. }));
    }
}

// =============================================================================
// Diff, status, and merge
// =============================================================================

mod diff_and_merge {
    use super::*;

    #[test]
    fn changed_files_reports_modified_and_new() {
        let id1 = ObjectStore::hash(b"1", ObjectKind::Blob);
        let id2 = ObjectStore::hash(b"2", ObjectKind::Blob);
        let id3 = ObjectStore::hash(b"3", ObjectKind::Blob);
        let tree1: FlatTree = [("a.txt".to_string(), id1)].into_iter().collect();
        let tree2: FlatTree = [("a.txt".to_string(), id2), ("b.txt".to_string(), id3)]
            .into_iter()
            .collect();

        assert_eq!(
            changed_files(&tree1, &tree2),
            vec![
                ("a.txt".to_string(), FileStatus::Modified),
                ("b.txt".to_string(), FileStatus::New),
            ]
        );
    }

    #[test]
    fn status_after_edits() {
        let t = TestRepo::new();
        t.write("edit.txt", "before");
        t.write("gone.txt", "bye");
        t.write("same.txt", "same");
        t.commit("first");

        assert!(t.repo.diff().status().unwrap().changes.is_empty());

        t.write("edit.txt", "after");
        t.remove("gone.txt");
        t.write("dir/new.txt", "hello");

        let status = t.repo.diff().status().unwrap();
        assert_eq!(
            status.changes,
            vec![
                ("dir/new.txt".to_string(), FileStatus::New),
                ("edit.txt".to_string(), FileStatus::Modified),
                ("gone.txt".to_string(), FileStatus::Deleted),
            ]
        );
        assert_eq!(status.merge_head, None);
    }

    #[test]
    fn unified_diff_against_head() {
        let t = TestRepo::new();
        t.write("f.txt", "one\ntwo\nthree\n");
        t.commit("first");
        t.write("f.txt", "one\n2\nthree\n");

        let engine = t.repo.diff();
        let diffs = engine
            .diff_trees(&engine.head_tree().unwrap(), &engine.working_tree().unwrap(), true)
            .unwrap();
        let lines = diffs["f.txt"].as_ref().unwrap();
        assert!(lines.iter().any(|l| l == "--- a/f.txt"));
        assert!(lines.iter().any(|l| l == "+++ b/f.txt"));
        assert!(lines.iter().any(|l| l == "-two"));
        assert!(lines.iter().any(|l| l == "+2"));
    }

    #[test]
    fn fast_forward_merge() {
        let t = TestRepo::new();
        t.write("f", "one");
        let first = t.commit("first");
        t.branch("feature", &first);

        t.repo.graph().checkout("feature").unwrap();
        t.write("f", "two");
        let second = t.commit("second");
        t.repo.graph().checkout("master").unwrap();
        assert_eq!(t.read("f"), "one");

        let outcome = t.repo.graph().merge("feature").unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::FastForward {
                from: first,
                to: second.clone()
            }
        );
        assert_eq!(t.head(), second);
        assert_eq!(t.read("f"), "two");
        assert_eq!(
            t.repo.refs().head_state().unwrap(),
            HeadState::Attached(BranchName::new("master").unwrap())
        );
        assert!(t.merge_head().is_none());
    }

    #[test]
    fn merging_an_ancestor_is_up_to_date() {
        let t = TestRepo::new();
        t.write("f", "one");
        let first = t.commit("first");
        t.branch("old", &first);
        t.write("f", "two");
        t.commit("second");

        assert_eq!(t.repo.graph().merge("old").unwrap(), MergeOutcome::UpToDate);
    }

    #[test]
    fn clean_three_way_merge_records_both_parents() {
        let t = TestRepo::new();
        t.write("f.txt", "1\n2\n3\n4\n5\n");
        let base = t.commit("base");
        t.branch("side", &base);

        t.write("f.txt", "one\n2\n3\n4\n5\n");
        t.write("main-only.txt", "main");
        let main = t.commit("main edits first line");

        t.repo.graph().checkout("side").unwrap();
        t.write("f.txt", "1\n2\n3\n4\nfive\n");
        t.write("side-only.txt", "side");
        let side = t.commit("side edits last line");

        t.repo.graph().checkout("master").unwrap();
        let outcome = t.repo.graph().merge("side").unwrap();
        match outcome {
            MergeOutcome::Merged { base: found, report } => {
                assert_eq!(found, Some(base));
                assert!(report.is_clean());
            }
            other => panic!("expected a merge, got {other:?}"),
        }

        assert_eq!(t.read("f.txt"), "one\n2\n3\n4\nfive\n");
        assert_eq!(t.read("main-only.txt"), "main");
        assert_eq!(t.read("side-only.txt"), "side");
        assert_eq!(t.merge_head(), Some(RefValue::Direct(side.clone())));

        let merge = t.commit("merge side");
        let commit = t.repo.graph().read_commit(&merge).unwrap();
        assert_eq!(commit.parents, vec![main, side]);
        assert!(t.merge_head().is_none());
    }

    #[test]
    fn conflicting_merge_writes_markers() {
        let t = TestRepo::new();
        t.write("f.txt", "a\nb\nc\n");
        let base = t.commit("base");
        t.branch("side", &base);

        t.write("f.txt", "a\nours\nc\n");
        t.commit("ours");

        t.repo.graph().checkout("side").unwrap();
        t.write("f.txt", "a\ntheirs\nc\n");
        t.commit("theirs");

        t.repo.graph().checkout("master").unwrap();
        let outcome = t.repo.graph().merge("side").unwrap();
        match outcome {
            MergeOutcome::Merged { report, .. } => {
                assert_eq!(report.conflicts, vec!["f.txt".to_string()]);
            }
            other => panic!("expected a merge, got {other:?}"),
        }

        let text = t.read("f.txt");
        assert!(text.starts_with("a\n"));
        assert!(text.contains("<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>> MERGE_HEAD\n"));
        assert!(text.ends_with("c\n"));

        let status = t.repo.diff().status().unwrap();
        assert!(status.merge_head.is_some());
    }

    #[test]
    fn merge_without_commits_fails() {
        let t = TestRepo::new();
        let err = t.repo.graph().merge("master").unwrap_err();
        assert!(matches!(err, RepoError::NoCommits));
    }
}

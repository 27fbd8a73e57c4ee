//! fs::local
//!
//! Real-disk filesystem backed by `std::fs`.

use std::fs;
use std::path::Path;

use super::traits::{DirEntry, EntryKind, FileSystem, FsError};

/// Filesystem capability over the host's real filesystem.
///
/// Symlinks are reported as [`EntryKind::Other`] and never followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create the real-disk filesystem.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn scan_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| FsError::from_io(e, path))? {
            let entry = entry.map_err(|e| FsError::from_io(e, path))?;
            let file_type = entry
                .file_type()
                .map_err(|e| FsError::from_io(e, &entry.path()))?;

            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::Other
            };

            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| FsError::InvalidName { path: entry.path() })?;

            entries.push(DirEntry { name, kind });
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        fs::read(path).map_err(|e| FsError::from_io(e, path))
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        fs::write(path, contents).map_err(|e| FsError::from_io(e, path))
    }

    fn delete_file(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path).map_err(|e| FsError::from_io(e, path))
    }

    fn make_directories(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path).map_err(|e| FsError::from_io(e, path))
    }

    fn remove_directory_if_empty(&self, path: &Path) -> Result<bool, FsError> {
        let mut entries = fs::read_dir(path).map_err(|e| FsError::from_io(e, path))?;
        if entries.next().is_some() {
            return Ok(false);
        }
        fs::remove_dir(path).map_err(|e| FsError::from_io(e, path))?;
        Ok(true)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_file())
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_dir())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_read_delete() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        let path = dir.path().join("file.txt");

        fs.write_file(&path, b"contents").unwrap();
        assert!(fs.is_file(&path));
        assert_eq!(fs.read_file(&path).unwrap(), b"contents");

        fs.delete_file(&path).unwrap();
        assert!(!fs.exists(&path));
        assert!(matches!(
            fs.read_file(&path),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn scan_reports_kinds() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        fs.make_directories(&dir.path().join("sub/deeper")).unwrap();
        fs.write_file(&dir.path().join("a.txt"), b"a").unwrap();

        let mut entries = fs.scan_directory(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![
                DirEntry {
                    name: "a.txt".into(),
                    kind: EntryKind::File
                },
                DirEntry {
                    name: "sub".into(),
                    kind: EntryKind::Directory
                },
            ]
        );
    }

    #[test]
    fn remove_directory_only_when_empty() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        let sub = dir.path().join("sub");
        fs.make_directories(&sub).unwrap();
        fs.write_file(&sub.join("keep"), b"x").unwrap();

        assert!(!fs.remove_directory_if_empty(&sub).unwrap());
        assert!(fs.is_dir(&sub));

        fs.delete_file(&sub.join("keep")).unwrap();
        assert!(fs.remove_directory_if_empty(&sub).unwrap());
        assert!(!fs.exists(&sub));
    }

    #[test]
    fn walk_visits_nested_entries() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        fs.make_directories(&dir.path().join("a/b")).unwrap();
        fs.write_file(&dir.path().join("a/b/c.txt"), b"c").unwrap();

        let walked: Vec<_> = fs
            .walk(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert!(walked.contains(&dir.path().join("a")));
        assert!(walked.contains(&dir.path().join("a/b")));
        assert!(walked.contains(&dir.path().join("a/b/c.txt")));
    }
}

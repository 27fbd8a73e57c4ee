//! repo::objects
//!
//! Content-addressed object store.
//!
//! # Format
//!
//! Each object lives at `.mgit/objects/<oid>` and contains
//! `<kind> 0x00 <payload>`. The id is the SHA-1 of exactly those bytes, so
//! the kind tag takes part in identity.
//!
//! # Invariants
//!
//! - Objects are immutable: an existing object file is never rewritten
//! - `put` is idempotent; identical (payload, kind) pairs share one file

use sha1::{Digest, Sha1};
use tracing::{debug, trace};

use super::{RepoError, Repository};
use crate::core::types::{ObjectKind, Oid};

/// Separator between the kind tag and the payload.
const KIND_SEPARATOR: u8 = 0;

/// Borrowed view over the object store of a repository.
#[derive(Debug, Clone, Copy)]
pub struct ObjectStore<'r> {
    repo: &'r Repository,
}

impl<'r> ObjectStore<'r> {
    pub(crate) fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    /// Compute the id a payload would get without storing it.
    ///
    /// ```
    /// use mgit::core::types::ObjectKind;
    /// use mgit::repo::ObjectStore;
    ///
    /// let blob = ObjectStore::hash(b"hello", ObjectKind::Blob);
    /// let tree = ObjectStore::hash(b"hello", ObjectKind::Tree);
    /// assert_ne!(blob, tree);
    /// assert_eq!(blob, ObjectStore::hash(b"hello", ObjectKind::Blob));
    /// ```
    pub fn hash(payload: &[u8], kind: ObjectKind) -> Oid {
        Self::digest(&encode(payload, kind))
    }

    fn digest(data: &[u8]) -> Oid {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Oid::from_digest(hasher.finalize().into())
    }

    /// Store a payload under its kind and return its id.
    ///
    /// Writing an object that already exists leaves the file untouched.
    pub fn put(&self, payload: &[u8], kind: ObjectKind) -> Result<Oid, RepoError> {
        self.repo.require_initialized()?;

        let data = encode(payload, kind);
        let oid = Self::digest(&data);
        let path = self.repo.paths().object_path(oid.as_str());
        let fs = self.repo.fs();

        if fs.exists(&path) {
            trace!(oid = %oid, kind = %kind, "object already stored");
            return Ok(oid);
        }

        fs.make_directories(&self.repo.paths().objects_dir())?;
        fs.write_file(&path, &data)?;
        debug!(oid = %oid, kind = %kind, size = payload.len(), "stored object");
        Ok(oid)
    }

    /// Read an object and its kind.
    ///
    /// # Errors
    ///
    /// - `RepoError::ObjectNotFound` if no such object is stored
    /// - `RepoError::MalformedObject` if the file has no kind tag
    pub fn read(&self, oid: &Oid) -> Result<(ObjectKind, Vec<u8>), RepoError> {
        self.repo.require_initialized()?;

        let path = self.repo.paths().object_path(oid.as_str());
        let fs = self.repo.fs();
        if !fs.is_file(&path) {
            return Err(RepoError::ObjectNotFound {
                oid: oid.to_string(),
            });
        }
        let mut data = fs.read_file(&path)?;

        let separator = data
            .iter()
            .position(|b| *b == KIND_SEPARATOR)
            .ok_or_else(|| RepoError::MalformedObject {
                oid: oid.to_string(),
                message: "missing kind separator".to_string(),
            })?;
        let kind = std::str::from_utf8(&data[..separator])
            .ok()
            .and_then(|tag| tag.parse::<ObjectKind>().ok())
            .ok_or_else(|| RepoError::MalformedObject {
                oid: oid.to_string(),
                message: format!(
                    "unknown kind tag {:?}",
                    String::from_utf8_lossy(&data[..separator])
                ),
            })?;

        let payload = data.split_off(separator + 1);
        Ok((kind, payload))
    }

    /// Read an object's payload, optionally checking its kind.
    ///
    /// `expected = None` accepts any kind.
    ///
    /// # Errors
    ///
    /// `RepoError::KindMismatch` when a kind was expected and the stored
    /// object has another; otherwise as [`ObjectStore::read`].
    pub fn get(&self, oid: &Oid, expected: Option<ObjectKind>) -> Result<Vec<u8>, RepoError> {
        let (actual, payload) = self.read(oid)?;
        match expected {
            Some(expected) if expected != actual => Err(RepoError::KindMismatch {
                oid: oid.to_string(),
                expected,
                actual,
            }),
            _ => Ok(payload),
        }
    }

    /// Check whether an object is stored.
    pub fn contains(&self, oid: &Oid) -> Result<bool, RepoError> {
        self.repo.require_initialized()?;
        Ok(self
            .repo
            .fs()
            .is_file(&self.repo.paths().object_path(oid.as_str())))
    }
}

fn encode(payload: &[u8], kind: ObjectKind) -> Vec<u8> {
    let tag = kind.as_str().as_bytes();
    let mut data = Vec::with_capacity(tag.len() + 1 + payload.len());
    data.extend_from_slice(tag);
    data.push(KIND_SEPARATOR);
    data.extend_from_slice(payload);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, MemoryFileSystem};
    use crate::repo::test_support::memory_repo;

    #[test]
    fn put_then_get() {
        let repo = memory_repo();
        let objects = repo.objects();

        let oid = objects.put(b"hello\n", ObjectKind::Blob).unwrap();
        assert_eq!(objects.get(&oid, Some(ObjectKind::Blob)).unwrap(), b"hello\n");
        assert_eq!(objects.get(&oid, None).unwrap(), b"hello\n");
        assert!(objects.contains(&oid).unwrap());
    }

    #[test]
    fn known_sha1() {
        // sha1("blob\0hello")
        let oid = ObjectStore::hash(b"hello", ObjectKind::Blob);
        let mut hasher = Sha1::new();
        hasher.update(b"blob\0hello");
        let expected = hex::encode(hasher.finalize());
        assert_eq!(oid.as_str(), expected);
    }

    #[test]
    fn empty_payload_is_valid() {
        let repo = memory_repo();
        let oid = repo.objects().put(b"", ObjectKind::Blob).unwrap();
        assert!(repo.objects().get(&oid, None).unwrap().is_empty());
    }

    #[test]
    fn payload_may_contain_nul() {
        let repo = memory_repo();
        let oid = repo.objects().put(b"a\0b", ObjectKind::Blob).unwrap();
        assert_eq!(repo.objects().get(&oid, None).unwrap(), b"a\0b");
    }

    #[test]
    fn kind_mismatch() {
        let repo = memory_repo();
        let oid = repo.objects().put(b"x", ObjectKind::Blob).unwrap();
        let err = repo
            .objects()
            .get(&oid, Some(ObjectKind::Tree))
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::KindMismatch {
                expected: ObjectKind::Tree,
                actual: ObjectKind::Blob,
                ..
            }
        ));
    }

    #[test]
    fn missing_object() {
        let repo = memory_repo();
        let oid = Oid::new("0".repeat(40)).unwrap();
        assert!(matches!(
            repo.objects().get(&oid, None),
            Err(RepoError::ObjectNotFound { .. })
        ));
        assert!(!repo.objects().contains(&oid).unwrap());
    }

    #[test]
    fn put_does_not_rewrite_existing() {
        let repo = memory_repo();
        let oid = repo.objects().put(b"same", ObjectKind::Blob).unwrap();
        let path = repo.paths().object_path(oid.as_str());

        // Tamper with the stored file; a second put must not restore it.
        repo.fs().write_file(&path, b"blob\0tampered").unwrap();
        let again = repo.objects().put(b"same", ObjectKind::Blob).unwrap();
        assert_eq!(again, oid);
        assert_eq!(repo.fs().read_file(&path).unwrap(), b"blob\0tampered");
    }

    #[test]
    fn malformed_object_file() {
        let repo = memory_repo();
        let oid = Oid::new("1".repeat(40)).unwrap();
        let path = repo.paths().object_path(oid.as_str());
        repo.fs().write_file(&path, b"no separator").unwrap();
        assert!(matches!(
            repo.objects().read(&oid),
            Err(RepoError::MalformedObject { .. })
        ));

        repo.fs().write_file(&path, b"tag\0payload").unwrap();
        assert!(matches!(
            repo.objects().read(&oid),
            Err(RepoError::MalformedObject { .. })
        ));
    }

    #[test]
    fn uninitialized_repository_is_rejected() {
        let fs = MemoryFileSystem::new();
        fs.make_directories(std::path::Path::new("/plain")).unwrap();
        let repo = crate::repo::Repository::open(Box::new(fs), "/plain");
        assert!(matches!(repo, Err(RepoError::NotInitialized { .. })));
    }
}

//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Object identifier (40 hex characters, SHA-1)
//! - [`ObjectKind`] - Kind tag of a stored object (blob, tree, commit)
//! - [`BranchName`] - Validated branch name (short form, e.g. `feature/x`)
//! - [`TagName`] - Validated tag name (short form, e.g. `v1.0`)
//! - [`RefName`] - Validated reference path relative to the store root
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use mgit::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let refname = RefName::for_branch(&branch);
//! assert_eq!(refname.as_str(), "ref/heads/feature/my-branch");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! # let _ = oid;
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid tag name: {0}")]
    InvalidTagName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid tree entry name: {0}")]
    InvalidEntryName(String),

    #[error("unknown object kind: {0}")]
    UnknownObjectKind(String),
}

/// Kind tag of a stored object.
///
/// The tag is part of the hashed bytes, so the same payload stored as a
/// blob and as a tree yields two different identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw file bytes.
    Blob,
    /// Directory listing.
    Tree,
    /// Snapshot with parents and message.
    Commit,
}

impl ObjectKind {
    /// The tag written in front of the payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }
}

impl FromStr for ObjectKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(TypeError::UnknownObjectKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object identifier: the hex-encoded SHA-1 of `kind || 0x00 || payload`.
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use mgit::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Length of a hex-encoded identifier.
    pub const HEX_LEN: usize = 40;

    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` unless the input is exactly
    /// 40 hexadecimal characters.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if !Self::is_valid(&oid) {
            return Err(TypeError::InvalidOid(format!(
                "expected {} hex characters, got {:?}",
                Self::HEX_LEN,
                oid
            )));
        }
        Ok(Self(oid))
    }

    /// Build an id from a raw 20-byte digest.
    pub fn from_digest(digest: [u8; 20]) -> Self {
        Self(hex::encode(digest))
    }

    /// Check whether a string is syntactically an object id.
    ///
    /// ```
    /// use mgit::core::types::Oid;
    ///
    /// assert!(Oid::is_valid("0123456789abcdef0123456789abcdef01234567"));
    /// assert!(!Oid::is_valid("master"));
    /// ```
    pub fn is_valid(s: &str) -> bool {
        s.len() == Self::HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check a slash-separated name against the reference naming rules.
///
/// Returns a description of the first violated rule.
fn check_ref_format(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("cannot be empty".into());
    }
    if name == "@" {
        return Err("cannot be '@' (reserved)".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err("cannot start or end with '/'".into());
    }
    if name.starts_with('-') {
        return Err("cannot start with '-'".into());
    }
    for pattern in ["..", "@{", "//"] {
        if name.contains(pattern) {
            return Err(format!("cannot contain '{pattern}'"));
        }
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_ascii_control() || " ~^:\\?*[".contains(*c))
    {
        return Err(format!("cannot contain {c:?}"));
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("path component cannot end with '.lock'".into());
        }
    }
    Ok(())
}

/// A validated branch name, stored in short form (`feature/foo`, not
/// `ref/heads/feature/foo`).
///
/// # Example
///
/// ```
/// use mgit::core::types::BranchName;
///
/// let name = BranchName::new("feature/my-branch").unwrap();
/// assert_eq!(name.as_str(), "feature/my-branch");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates the
    /// reference naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_ref_format(&name)
            .map_err(|rule| TypeError::InvalidBranchName(format!("'{name}' {rule}")))?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated tag name in short form (`v1.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    /// Create a new validated tag name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_ref_format(&name)
            .map_err(|rule| TypeError::InvalidTagName(format!("'{name}' {rule}")))?;
        Ok(Self(name))
    }

    /// Get the tag name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TagName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TagName> for String {
    fn from(name: TagName) -> Self {
        name.0
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated reference name: a path relative to the store root.
///
/// Special references (`HEAD`, `MERGE_HEAD`) live at the top of the store;
/// branches and tags live under `ref/heads/` and `ref/tags/`.
///
/// # Example
///
/// ```
/// use mgit::core::types::{BranchName, RefName};
///
/// let branch = BranchName::new("feature/foo").unwrap();
/// let refname = RefName::for_branch(&branch);
/// assert_eq!(refname.as_str(), "ref/heads/feature/foo");
/// assert_eq!(refname.branch_name(), Some(branch));
///
/// assert_eq!(RefName::head().as_str(), "HEAD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Root directory of the reference namespace.
    pub const ROOT: &'static str = "ref";
    /// Prefix of branch references.
    pub const HEADS_PREFIX: &'static str = "ref/heads/";
    /// Prefix of tag references.
    pub const TAGS_PREFIX: &'static str = "ref/tags/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates the
    /// reference naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_ref_format(&name)
            .map_err(|rule| TypeError::InvalidRefName(format!("'{name}' {rule}")))?;
        Ok(Self(name))
    }

    /// The `HEAD` reference.
    pub fn head() -> Self {
        Self("HEAD".to_string())
    }

    /// The `MERGE_HEAD` reference.
    pub fn merge_head() -> Self {
        Self("MERGE_HEAD".to_string())
    }

    /// Reference path for a branch (`ref/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        // Branch names are validated, so the joined path is too.
        Self(format!("{}{}", Self::HEADS_PREFIX, branch.as_str()))
    }

    /// Reference path for a tag (`ref/tags/<tag>`).
    pub fn for_tag(tag: &TagName) -> Self {
        Self(format!("{}{}", Self::TAGS_PREFIX, tag.as_str()))
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Short branch name if this is a branch ref.
    pub fn branch_name(&self) -> Option<BranchName> {
        self.strip_prefix(Self::HEADS_PREFIX)
            .and_then(|name| BranchName::new(name).ok())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod object_kind {
        use super::*;

        #[test]
        fn parses_known_kinds() {
            assert_eq!("blob".parse::<ObjectKind>(), Ok(ObjectKind::Blob));
            assert_eq!("tree".parse::<ObjectKind>(), Ok(ObjectKind::Tree));
            assert_eq!("commit".parse::<ObjectKind>(), Ok(ObjectKind::Commit));
        }

        #[test]
        fn rejects_unknown_kind() {
            assert!(matches!(
                "tag".parse::<ObjectKind>(),
                Err(TypeError::UnknownObjectKind(_))
            ));
        }

        #[test]
        fn display_matches_tag() {
            assert_eq!(ObjectKind::Tree.to_string(), "tree");
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn valid_sha1() {
            assert!(Oid::new("abc123def4567890abc123def4567890abc12345").is_ok());
        }

        #[test]
        fn sha256_length_rejected() {
            let sha256 = "abc123def4567890abc123def4567890abc123def4567890abc123def456789a";
            assert!(Oid::new(sha256).is_err());
        }

        #[test]
        fn normalizes_to_lowercase() {
            let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
            assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
        }

        #[test]
        fn from_digest_is_hex() {
            let oid = Oid::from_digest([0xab; 20]);
            assert_eq!(oid.as_str(), "ab".repeat(20));
        }

        #[test]
        fn short_form() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(oid.short(7), "abc123d");
            assert_eq!(oid.short(100), oid.as_str());
        }

        #[test]
        fn invalid_inputs() {
            assert!(Oid::new("").is_err());
            assert!(Oid::new("abc123").is_err());
            assert!(Oid::new("xyz123def4567890abc123def4567890abc12345").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
            let json = serde_json::to_string(&oid).unwrap();
            let parsed: Oid = serde_json::from_str(&json).unwrap();
            assert_eq!(oid, parsed);
        }
    }

    mod branch_name {
        use super::*;

        #[test]
        fn valid_branch_names() {
            for name in ["master", "feature/foo", "fix-123", "user@feature", "with.dot"] {
                assert!(BranchName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn invalid_branch_names() {
            for name in [
                "",
                "@",
                ".hidden",
                "foo/.hidden",
                "-flag",
                "branch.lock",
                "branch/",
                "bad..path",
                "foo@{bar",
                "foo//bar",
                "has space",
                "has:colon",
                "has\ttab",
            ] {
                assert!(BranchName::new(name).is_err(), "{name:?} should be invalid");
            }
        }

        #[test]
        fn error_mentions_name() {
            let err = BranchName::new("bad..path").unwrap_err();
            assert!(err.to_string().contains("bad..path"));
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn special_refs() {
            assert_eq!(RefName::head().as_str(), "HEAD");
            assert_eq!(RefName::merge_head().as_str(), "MERGE_HEAD");
            assert!(RefName::new("HEAD").is_ok());
        }

        #[test]
        fn for_branch_and_tag() {
            let branch = BranchName::new("feature/foo").unwrap();
            let refname = RefName::for_branch(&branch);
            assert_eq!(refname.as_str(), "ref/heads/feature/foo");
            assert_eq!(refname.branch_name(), Some(branch));

            let tag = TagName::new("v1.0").unwrap();
            let refname = RefName::for_tag(&tag);
            assert_eq!(refname.as_str(), "ref/tags/v1.0");
            assert_eq!(refname.branch_name(), None);
        }

        #[test]
        fn rejects_traversal() {
            assert!(RefName::new("../outside").is_err());
            assert!(RefName::new("/abs/path").is_err());
            assert!(RefName::new("ref/./heads").is_err());
        }
    }
}

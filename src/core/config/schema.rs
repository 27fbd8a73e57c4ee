//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$MGIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/mgit/config.toml`
//! 3. `~/.mgit/config.toml`
//!
//! # Repo Config
//!
//! Located at `.mgit/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the default branch must be a valid branch name).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Upper bound accepted for `refs.max_symref_depth`.
pub const MAX_SYMREF_DEPTH_LIMIT: usize = 1024;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [init]
/// default_branch = "main"
///
/// [tree]
/// order = "sorted"
///
/// [refs]
/// max_symref_depth = 32
///
/// [merge]
/// conflict_style = "diff3"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Settings used by `init`
    pub init: Option<InitConfig>,

    /// Tree encoding settings
    pub tree: Option<TreeConfig>,

    /// Reference resolution settings
    pub refs: Option<RefsConfig>,

    /// Merge settings
    pub merge: Option<MergeConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(init) = &self.init {
            init.validate()?;
        }
        if let Some(refs) = &self.refs {
            refs.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration, stored in `.mgit/config.toml`.
///
/// # Example
///
/// ```toml
/// [tree]
/// order = "scan"
///
/// [refs]
/// max_symref_depth = 8
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Tree encoding settings
    pub tree: Option<TreeConfig>,

    /// Reference resolution settings
    pub refs: Option<RefsConfig>,

    /// Merge settings
    pub merge: Option<MergeConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(refs) = &self.refs {
            refs.validate()?;
        }
        Ok(())
    }
}

/// `[init]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InitConfig {
    /// Branch that HEAD points at in a fresh repository
    pub default_branch: Option<String>,
}

impl InitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid init.default_branch: {}", e))
            })?;
        }
        Ok(())
    }
}

/// Order in which tree entries are serialized.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreeOrder {
    /// Directory-scan order as reported by the filesystem.
    #[default]
    Scan,
    /// Entries sorted by name, so identical directories always hash the same.
    Sorted,
}

impl TreeOrder {
    /// Config-file spelling of the value.
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeOrder::Scan => "scan",
            TreeOrder::Sorted => "sorted",
        }
    }
}

impl std::str::FromStr for TreeOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(TreeOrder::Scan),
            "sorted" => Ok(TreeOrder::Sorted),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid tree.order '{}', must be one of: scan, sorted",
                other
            ))),
        }
    }
}

/// `[tree]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    /// Entry order used when snapshotting directories
    pub order: Option<TreeOrder>,
}

/// `[refs]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RefsConfig {
    /// Longest symbolic reference chain followed before reporting a cycle
    pub max_symref_depth: Option<usize>,
}

impl RefsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.max_symref_depth {
            Some(0) => Err(ConfigError::InvalidValue(
                "refs.max_symref_depth must be at least 1".to_string(),
            )),
            Some(depth) if depth > MAX_SYMREF_DEPTH_LIMIT => Err(ConfigError::InvalidValue(
                format!("refs.max_symref_depth cannot exceed {}", MAX_SYMREF_DEPTH_LIMIT),
            )),
            _ => Ok(()),
        }
    }
}

/// How conflict hunks are rendered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStyle {
    /// `<<<<<<<` ours `=======` theirs `>>>>>>>`
    #[default]
    Merge,
    /// Like `Merge`, plus the base text after `|||||||`.
    Diff3,
}

impl ConflictStyle {
    /// Config-file spelling of the value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStyle::Merge => "merge",
            ConflictStyle::Diff3 => "diff3",
        }
    }
}

impl std::str::FromStr for ConflictStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge" => Ok(ConflictStyle::Merge),
            "diff3" => Ok(ConflictStyle::Diff3),
            other => Err(ConfigError::InvalidValue(format!(
                "invalid merge.conflict_style '{}', must be one of: merge, diff3",
                other
            ))),
        }
    }
}

/// `[merge]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Conflict marker style
    pub conflict_style: Option<ConflictStyle>,
}

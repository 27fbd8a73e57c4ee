//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! mgit has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides in `.mgit/config.toml`
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$MGIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/mgit/config.toml`
//! 3. `~/.mgit/config.toml`
//!
//! The repo config is read through the repository's
//! [`FileSystem`](crate::fs::FileSystem), so it lives wherever the
//! repository does (including in-memory test repositories).
//!
//! # Example
//!
//! ```
//! use mgit::core::config::{Config, RepoConfig, TreeOrder};
//!
//! let repo = RepoConfig::parse("[tree]\norder = \"sorted\"\n", "config.toml".as_ref()).unwrap();
//! let config = Config::new(Default::default(), Some(repo));
//! assert_eq!(config.tree_order(), TreeOrder::Sorted);
//! assert_eq!(config.default_branch().as_str(), "master");
//! ```

pub mod schema;

pub use schema::{
    ConflictStyle, GlobalConfig, InitConfig, MergeConfig, RefsConfig, RepoConfig, TreeConfig,
    TreeOrder,
};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::BranchName;

/// Branch HEAD points at in a fresh repository when nothing is configured.
pub const DEFAULT_BRANCH: &str = "master";

/// Symbolic reference chain bound used when nothing is configured.
pub const DEFAULT_MAX_SYMREF_DEPTH: usize = 16;

/// Keys accepted by `config get` / `config set`.
pub const KEYS: [&str; 4] = [
    "init.default_branch",
    "tree.order",
    "refs.max_symref_depth",
    "merge.conflict_style",
];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to serialize config: {0}")]
    SerializeError(String),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key '{0}'")]
    UnknownKey(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules automatically: repo config overrides
/// global config, which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if present)
    pub repo: Option<RepoConfig>,
}

impl Config {
    /// Combine already-loaded scopes.
    pub fn new(global: GlobalConfig, repo: Option<RepoConfig>) -> Self {
        Self { global, repo }
    }

    /// Load global configuration from the standard locations.
    ///
    /// Missing files are not an error (defaults are used).
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load_global() -> Result<GlobalConfig, ConfigError> {
        let Some(path) = Self::find_global_path() else {
            return Ok(GlobalConfig::default());
        };

        let contents = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;
        let config: GlobalConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// First existing global config file, if any.
    fn find_global_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("MGIT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("mgit/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".mgit/config.toml"))
            .filter(|path| path.exists())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Branch HEAD points at after `init`.
    pub fn default_branch(&self) -> BranchName {
        self.global
            .init
            .as_ref()
            .and_then(|init| init.default_branch.as_deref())
            .and_then(|name| BranchName::new(name).ok())
            .unwrap_or_else(|| BranchName::new(DEFAULT_BRANCH).expect("default branch is valid"))
    }

    /// Entry order for tree snapshots.
    pub fn tree_order(&self) -> TreeOrder {
        let repo = self.repo.as_ref().and_then(|r| r.tree.as_ref()?.order);
        let global = self.global.tree.as_ref().and_then(|t| t.order);
        repo.or(global).unwrap_or_default()
    }

    /// Longest symbolic reference chain to follow.
    pub fn max_symref_depth(&self) -> usize {
        let repo = self
            .repo
            .as_ref()
            .and_then(|r| r.refs.as_ref()?.max_symref_depth);
        let global = self.global.refs.as_ref().and_then(|r| r.max_symref_depth);
        repo.or(global).unwrap_or(DEFAULT_MAX_SYMREF_DEPTH)
    }

    /// Conflict marker style for merges.
    pub fn conflict_style(&self) -> ConflictStyle {
        let repo = self
            .repo
            .as_ref()
            .and_then(|r| r.merge.as_ref()?.conflict_style);
        let global = self.global.merge.as_ref().and_then(|m| m.conflict_style);
        repo.or(global).unwrap_or_default()
    }

    /// Effective value of a config key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for keys not listed in [`KEYS`].
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "init.default_branch" => self.default_branch().to_string(),
            "tree.order" => self.tree_order().as_str().to_string(),
            "refs.max_symref_depth" => self.max_symref_depth().to_string(),
            "merge.conflict_style" => self.conflict_style().as_str().to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// Every key with its effective value.
    pub fn list(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
            .collect()
    }
}

impl RepoConfig {
    /// Parse and validate repo config text.
    ///
    /// `path` is only used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: RepoConfig = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Set a repo-scoped key from its string form.
    ///
    /// # Errors
    ///
    /// - `ConfigError::UnknownKey` for unknown keys and for
    ///   `init.default_branch`, which only exists in the global scope
    /// - `ConfigError::InvalidValue` if the value does not parse
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "tree.order" => {
                self.tree.get_or_insert_with(Default::default).order = Some(value.parse()?);
            }
            "refs.max_symref_depth" => {
                let depth = value.parse::<usize>().map_err(|_| {
                    ConfigError::InvalidValue(format!(
                        "refs.max_symref_depth must be a number, got '{}'",
                        value
                    ))
                })?;
                self.refs.get_or_insert_with(Default::default).max_symref_depth = Some(depth);
            }
            "merge.conflict_style" => {
                self.merge.get_or_insert_with(Default::default).conflict_style =
                    Some(value.parse()?);
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        self.validate()
    }
}

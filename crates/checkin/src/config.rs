//! Checkin analysis configuration
//!
//! Stored as TOML at `.gtf/config.toml` under the repository root. A missing
//! file means defaults.

use crate::error::CheckinError;
use crate::similarity::{DEFAULT_RENAME_LIMIT, DEFAULT_SIMILARITY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which renames the analysis looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameMode {
    /// Renames are pended as independent deletes and adds
    None,
    /// File renames only; folder renames are never synthesized
    #[serde(alias = "just-files")]
    FileOnly,
    /// File renames collapsed into folder renames where legal
    #[default]
    All,
}

impl FromStr for RenameMode {
    type Err = CheckinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(RenameMode::None),
            "file-only" | "justfiles" | "just-files" => Ok(RenameMode::FileOnly),
            "all" => Ok(RenameMode::All),
            other => Err(CheckinError::Config(format!(
                "unknown rename mode '{}' (expected none, file-only or all)",
                other
            ))),
        }
    }
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameMode::None => write!(f, "none"),
            RenameMode::FileOnly => write!(f, "file-only"),
            RenameMode::All => write!(f, "all"),
        }
    }
}

/// Settings for one checkin analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinConfig {
    pub rename_mode: RenameMode,
    /// Minimum similarity (1-100) for an inexact rename
    pub rename_similarity: u8,
    /// Max files per side considered for inexact renames
    pub rename_limit: usize,
    /// Server folder the repository root maps to
    pub server_path: String,
    /// Local folder blobs are extracted to before pending; a temporary
    /// folder is used when unset
    pub working_folder: Option<PathBuf>,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            rename_mode: RenameMode::All,
            rename_similarity: DEFAULT_SIMILARITY,
            rename_limit: DEFAULT_RENAME_LIMIT,
            server_path: "$/".to_string(),
            working_folder: None,
        }
    }
}

/// Keys accepted by [`CheckinConfig::get_value`] / [`CheckinConfig::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "rename_mode",
    "rename_similarity",
    "rename_limit",
    "server_path",
    "working_folder",
];

impl CheckinConfig {
    /// Config file location for a repository root
    pub fn path_for_repo(repo_root: &Path) -> PathBuf {
        repo_root.join(gtf_core::store::STORE_DIR).join("config.toml")
    }

    /// Load the repository's config, falling back to defaults
    pub fn load_for_repo(repo_root: &Path) -> Result<Self> {
        let path = Self::path_for_repo(repo_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: CheckinConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate and write the config file
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), CheckinError> {
        if !(1..=100).contains(&self.rename_similarity) {
            return Err(CheckinError::Config(format!(
                "rename_similarity must be 1-100, got {}",
                self.rename_similarity
            )));
        }
        if !(1..=100_000).contains(&self.rename_limit) {
            return Err(CheckinError::Config(format!(
                "rename_limit must be 1-100000, got {}",
                self.rename_limit
            )));
        }
        if !self.server_path.starts_with("$/") {
            return Err(CheckinError::Config(format!(
                "server_path must start with '$/', got '{}'",
                self.server_path
            )));
        }
        Ok(())
    }

    /// Current value of `key` as text
    pub fn get_value(&self, key: &str) -> Result<String, CheckinError> {
        let value = match key {
            "rename_mode" => self.rename_mode.to_string(),
            "rename_similarity" => self.rename_similarity.to_string(),
            "rename_limit" => self.rename_limit.to_string(),
            "server_path" => self.server_path.clone(),
            "working_folder" => self
                .working_folder
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Parse `value` into `key`, then re-validate
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), CheckinError> {
        let invalid = |expected: &str| {
            CheckinError::Config(format!("invalid value '{}' for {}: {}", value, key, expected))
        };

        match key {
            "rename_mode" => self.rename_mode = value.parse()?,
            "rename_similarity" => {
                self.rename_similarity = value.parse().map_err(|_| invalid("expected 1-100"))?
            }
            "rename_limit" => {
                self.rename_limit = value.parse().map_err(|_| invalid("expected a positive integer"))?
            }
            "server_path" => self.server_path = value.to_string(),
            "working_folder" => {
                self.working_folder = (!value.is_empty()).then(|| PathBuf::from(value))
            }
            _ => return Err(unknown_key(key)),
        }

        self.validate()
    }

    /// Server path for a repository-relative path
    pub fn server_path_for(&self, path: &str) -> String {
        let root = self.server_path.trim_end_matches('/');
        if path.is_empty() {
            format!("{}/", root)
        } else {
            format!("{}/{}", root, path)
        }
    }
}

fn unknown_key(key: &str) -> CheckinError {
    CheckinError::Config(format!(
        "unknown config key '{}' (known keys: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

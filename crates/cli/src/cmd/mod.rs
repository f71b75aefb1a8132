//! CLI command implementations

pub mod analyze;
pub mod config;
pub mod pend;

use anyhow::{Context, Result};
use gtf_checkin::{CheckinConfig, CheckinPlan, RenameMode};
use gtf_git::GitRepository;
use std::path::{Path, PathBuf};

/// Repository, its root and its effective configuration
pub struct Session {
    pub git: GitRepository,
    pub root: PathBuf,
    pub config: CheckinConfig,
}

impl Session {
    pub fn open(repo: &Path, renames: Option<RenameMode>) -> Result<Self> {
        let git = GitRepository::discover(repo)
            .with_context(|| format!("Failed to open Git repository at {}", repo.display()))?;
        let root = git.workdir().unwrap_or(repo).to_path_buf();

        let mut config = CheckinConfig::load_for_repo(&root)?;
        if let Some(mode) = renames {
            config.rename_mode = mode;
        }

        Ok(Self { git, root, config })
    }

    /// Plan the checkin of `to`, relative to `from` when given
    pub fn plan(&self, from: Option<&str>, to: &str) -> Result<CheckinPlan> {
        let to_tree = self
            .git
            .resolve_tree(to)
            .with_context(|| format!("Failed to resolve '{}'", to))?;
        let from_tree = from
            .map(|rev| {
                self.git
                    .resolve_tree(rev)
                    .with_context(|| format!("Failed to resolve '{}'", rev))
            })
            .transpose()?;

        CheckinPlan::build(&self.git, &self.config, from_tree.as_ref(), &to_tree)
            .context("Checkin analysis failed")
    }
}

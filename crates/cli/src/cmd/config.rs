//! Configuration management command
//!
//! Reads and writes `.gtf/config.toml` under the repository root.

use anyhow::{Context, Result};
use gtf_checkin::config::CONFIG_KEYS;
use gtf_checkin::CheckinConfig;
use owo_colors::OwoColorize;
use std::path::Path;

/// List all configuration values
pub fn run_list(repo: &Path) -> Result<()> {
    let config = CheckinConfig::load_for_repo(repo)?;
    let config_path = CheckinConfig::path_for_repo(repo);

    println!("{}", "Checkin Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    for key in CONFIG_KEYS {
        let value = config.get_value(key)?;
        let shown = if value.is_empty() {
            "(unset)".dimmed().to_string()
        } else {
            value
        };
        println!("  {} = {}", key.cyan(), shown);
    }

    println!("\n{}", "Valid Ranges:".bold());
    println!("  rename_mode: none, file-only, all");
    println!("  rename_similarity: 1-100");
    println!("  rename_limit: 1-100,000");
    println!("  server_path: must start with $/");

    Ok(())
}

/// Get a single configuration value
pub fn run_get(repo: &Path, key: &str) -> Result<()> {
    let config = CheckinConfig::load_for_repo(repo)?;
    println!("{}", config.get_value(key)?);
    Ok(())
}

/// Set a configuration value
pub fn run_set(repo: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = CheckinConfig::load_for_repo(repo)?;
    config
        .set_value(key, value)
        .context("Invalid configuration value")?;
    config.save(&CheckinConfig::path_for_repo(repo))?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtf_checkin::RenameMode;

    #[test]
    fn test_set_then_get() {
        let temp_dir = tempfile::tempdir().unwrap();

        run_set(temp_dir.path(), "rename_mode", "none").unwrap();
        let config = CheckinConfig::load_for_repo(temp_dir.path()).unwrap();
        assert_eq!(config.rename_mode, RenameMode::None);

        assert!(run_get(temp_dir.path(), "rename_mode").is_ok());
        assert!(run_get(temp_dir.path(), "bogus").is_err());
    }

    #[test]
    fn test_invalid_value_not_saved() {
        let temp_dir = tempfile::tempdir().unwrap();

        assert!(run_set(temp_dir.path(), "rename_limit", "0").is_err());
        assert!(!CheckinConfig::path_for_repo(temp_dir.path()).exists());
    }
}

//! Dry run of the pend calls for a commit
//!
//! Drives the real orchestrator against a workspace that prints each call
//! instead of talking to a server.

use super::Session;
use anyhow::{Context, Result};
use gtf_checkin::{CheckinError, PendSpec, PendingChangeOrchestrator, RenameMode, Workspace};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// Workspace that accepts every request and remembers it
#[derive(Debug, Default)]
pub struct DryRunWorkspace {
    pub log: Vec<String>,
}

impl DryRunWorkspace {
    fn accept(&mut self, operation: &str, items: &[PendSpec]) -> usize {
        for item in items {
            let line = match &item.source_server_path {
                Some(source) => format!("{} {} -> {}", operation, source, item.server_path),
                None => format!("{} {}", operation, item.server_path),
            };
            self.log.push(line);
        }
        items.len()
    }
}

impl Workspace for DryRunWorkspace {
    fn pend_edit(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        Ok(self.accept("edit", items))
    }

    fn pend_add(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        Ok(self.accept("add", items))
    }

    fn pend_rename(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        Ok(self.accept("rename", items))
    }

    fn pend_delete(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        Ok(self.accept("delete", items))
    }

    fn undo_all(&mut self) -> Result<(), CheckinError> {
        self.log.push("undo".to_string());
        Ok(())
    }
}

pub fn run(
    repo: &Path,
    from: Option<&str>,
    to: &str,
    renames: Option<RenameMode>,
    working_folder: Option<PathBuf>,
) -> Result<()> {
    let session = Session::open(repo, renames)?;
    let plan = session.plan(from, to)?;

    // Keeps a temporary folder alive until the run ends
    let mut _temp = None;
    let folder = match working_folder.or_else(|| session.config.working_folder.clone()) {
        Some(folder) => folder,
        None => {
            let temp = tempfile::tempdir().context("Failed to create working folder")?;
            let path = temp.path().to_path_buf();
            _temp = Some(temp);
            path
        }
    };

    let mut workspace = DryRunWorkspace::default();
    let summary = PendingChangeOrchestrator::new(&session.git, &mut workspace, &session.config, &folder)
        .apply(&plan)
        .context("Pending changes failed")?;

    for (i, line) in workspace.log.iter().enumerate() {
        println!("{} {}", format!("{:>4}.", i + 1).dimmed(), line);
    }
    println!();
    println!(
        "{} {} changes pended in {} rename batches",
        "✓".green(),
        summary.total(),
        summary.rename_batches
    );

    Ok(())
}

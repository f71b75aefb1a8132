//! Applying a checkin plan to a server workspace
//!
//! The workspace itself (server connection, local mappings) lives outside
//! this crate behind [`Workspace`]. The orchestrator only decides the order
//! and shape of the calls: edits, adds, renames one depth batch at a time,
//! then deletes.

use crate::change::{ItemKind, RenameChange};
use crate::config::CheckinConfig;
use crate::error::CheckinError;
use crate::plan::CheckinPlan;
use gtf_core::{ObjectId, Repository, Tree};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One item handed to the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendSpec {
    /// Server path the item ends up at
    pub server_path: String,
    /// Server path a rename moves from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_server_path: Option<String>,
    /// Extracted content for edits and adds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    pub kind: ItemKind,
}

/// Server-side pending change service
///
/// Every call returns how many of the given items were actually pended.
pub trait Workspace {
    fn pend_edit(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError>;
    fn pend_add(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError>;
    fn pend_rename(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError>;
    fn pend_delete(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError>;
    /// Drop every change pended so far
    fn undo_all(&mut self) -> Result<(), CheckinError>;
}

/// Counts of what was pended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendSummary {
    pub edits: usize,
    pub adds: usize,
    pub renames: usize,
    pub deletes: usize,
    pub rename_batches: usize,
}

impl PendSummary {
    pub fn total(&self) -> usize {
        self.edits + self.adds + self.renames + self.deletes
    }
}

pub struct PendingChangeOrchestrator<'a, R: Repository + ?Sized, W: Workspace + ?Sized> {
    repo: &'a R,
    workspace: &'a mut W,
    config: &'a CheckinConfig,
    working_folder: PathBuf,
}

impl<'a, R: Repository + ?Sized, W: Workspace + ?Sized> PendingChangeOrchestrator<'a, R, W> {
    /// `working_folder` receives extracted blobs before they are pended
    pub fn new(
        repo: &'a R,
        workspace: &'a mut W,
        config: &'a CheckinConfig,
        working_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repo,
            workspace,
            config,
            working_folder: working_folder.into(),
        }
    }

    /// Pend every change in `plan`
    ///
    /// On any failure everything pended so far is undone (best effort) and
    /// the original error is returned.
    pub fn apply(&mut self, plan: &CheckinPlan) -> Result<PendSummary, CheckinError> {
        match self.apply_all(plan) {
            Ok(summary) => {
                info!("pended {} changes", summary.total());
                Ok(summary)
            }
            Err(e) => {
                if let Err(undo) = self.workspace.undo_all() {
                    warn!("failed to undo pending changes after error: {}", undo);
                }
                Err(e)
            }
        }
    }

    fn apply_all(&mut self, plan: &CheckinPlan) -> Result<PendSummary, CheckinError> {
        let mut summary = PendSummary::default();
        let analysis = plan.analysis();

        let edits = analysis
            .edits()
            .iter()
            .map(|edit| self.content_spec(&edit.path, &edit.id))
            .collect::<Result<Vec<_>, _>>()?;
        summary.edits += self.pend("edit", &edits, |ws, items| ws.pend_edit(items))?;

        let adds = analysis
            .adds()
            .iter()
            .map(|add| self.content_spec(&add.path, &add.id))
            .collect::<Result<Vec<_>, _>>()?;
        summary.adds += self.pend("add", &adds, |ws, items| ws.pend_add(items))?;

        let target_tree = self.repo.read_tree(plan.target())?;
        for (depth, batch) in plan.renames().batches().iter().enumerate() {
            if batch.is_empty() {
                continue;
            }
            debug!("pending rename batch at depth {} ({} items)", depth, batch.len());

            let renames: Vec<PendSpec> = batch
                .iter()
                .filter(|rename| !rename.is_edit_only())
                .map(|rename| self.rename_spec(&target_tree, rename))
                .collect();
            summary.renames += self.pend("rename", &renames, |ws, items| ws.pend_rename(items))?;
            summary.rename_batches += 1;

            let edits = batch
                .iter()
                .filter(|rename| rename.is_edit)
                .map(|rename| self.content_spec(&rename.new_path, &rename.id))
                .collect::<Result<Vec<_>, _>>()?;
            summary.edits += self.pend("edit", &edits, |ws, items| ws.pend_edit(items))?;
        }

        let deletes: Vec<PendSpec> = analysis
            .deletes()
            .iter()
            .map(|delete| PendSpec {
                server_path: self.config.server_path_for(&delete.path),
                source_server_path: None,
                local_path: None,
                kind: delete.kind,
            })
            .collect();
        summary.deletes += self.pend("delete", &deletes, |ws, items| ws.pend_delete(items))?;

        Ok(summary)
    }

    fn pend<F>(&mut self, operation: &'static str, items: &[PendSpec], call: F) -> Result<usize, CheckinError>
    where
        F: FnOnce(&mut W, &[PendSpec]) -> Result<usize, CheckinError>,
    {
        if items.is_empty() {
            return Ok(0);
        }

        let pended = call(&mut *self.workspace, items)?;
        if pended != items.len() {
            return Err(CheckinError::PendFailed {
                operation,
                requested: items.len(),
                pended,
            });
        }

        debug!("pended {} {}(s)", pended, operation);
        Ok(pended)
    }

    /// Extract a blob into the working folder and describe it for the server
    fn content_spec(&self, path: &str, id: &ObjectId) -> Result<PendSpec, CheckinError> {
        let local_path = self.extract(path, id)?;
        Ok(PendSpec {
            server_path: self.config.server_path_for(path),
            source_server_path: None,
            local_path: Some(local_path),
            kind: ItemKind::File,
        })
    }

    fn rename_spec(&self, target_tree: &Tree, rename: &RenameChange) -> PendSpec {
        let kind = if target_tree.get(&rename.new_path).is_some() {
            ItemKind::File
        } else {
            ItemKind::Folder
        };

        PendSpec {
            server_path: self.config.server_path_for(&rename.new_path),
            source_server_path: Some(self.config.server_path_for(&rename.old_path)),
            local_path: None,
            kind,
        }
    }

    fn extract(&self, path: &str, id: &ObjectId) -> Result<PathBuf, CheckinError> {
        let local_path = local_path_for(&self.working_folder, path);
        let content = self.repo.read_blob(id)?;

        let write = || -> std::io::Result<()> {
            if let Some(parent) = local_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&local_path, &content)
        };
        write().map_err(|source| CheckinError::Extraction {
            path: local_path.clone(),
            source,
        })?;

        Ok(local_path)
    }
}

/// Local file for a repository path under `working_folder`
pub fn local_path_for(working_folder: &Path, path: &str) -> PathBuf {
    path.split('/')
        .fold(working_folder.to_path_buf(), |acc, segment| acc.join(segment))
}

//! Tree differencer: turns two tree snapshots into a [`CheckinAnalysis`]

use crate::analysis::CheckinAnalysis;
use crate::change::{AddChange, DeleteChange, EditChange, RenameChange};
use crate::config::{CheckinConfig, RenameMode};
use crate::error::CheckinError;
use crate::similarity::{DiffEntry, RenameDetector};
use gtf_core::{EntryKind, ObjectId, Repository, Tree, TreeDiff};
use tracing::{debug, info};

/// Computes the changes that take the server from one tree to another
pub struct TreeDiffer<'a, R: Repository + ?Sized> {
    repo: &'a R,
    rename_mode: RenameMode,
    similarity: u8,
    rename_limit: usize,
}

impl<'a, R: Repository + ?Sized> TreeDiffer<'a, R> {
    pub fn new(repo: &'a R, config: &CheckinConfig) -> Self {
        Self {
            repo,
            rename_mode: config.rename_mode,
            similarity: config.rename_similarity,
            rename_limit: config.rename_limit,
        }
    }

    pub fn with_rename_mode(mut self, rename_mode: RenameMode) -> Self {
        self.rename_mode = rename_mode;
        self
    }

    /// Compare `from` (None for an initial import) against `to`
    ///
    /// Fails before producing anything if `to` holds two paths that differ
    /// only by case.
    pub fn analyze(
        &self,
        from: Option<&ObjectId>,
        to: &ObjectId,
    ) -> Result<CheckinAnalysis, CheckinError> {
        let to_tree = self.repo.read_tree(to)?;
        validate_case(&to_tree)?;

        let Some(from) = from else {
            return Ok(self.initial_import(&to_tree));
        };

        let from_tree = self.repo.read_tree(from)?;
        let diff = without_submodules(TreeDiff::diff(&from_tree, &to_tree));
        let mut analysis = CheckinAnalysis::for_target(*to);

        if self.rename_mode == RenameMode::None {
            for (path, _, entry) in diff.modified {
                analysis.pend_edit(EditChange::new(path, entry.id));
            }
            for (path, entry) in diff.added {
                analysis.pend_add(AddChange::new(path, entry.id));
            }
            for (path, _) in diff.removed {
                analysis.pend_delete(self.repo, DeleteChange::file(path))?;
            }
        } else {
            let entries = RenameDetector::new(self.repo)
                .with_similarity(self.similarity)
                .with_rename_limit(self.rename_limit)
                .compute(diff)?;

            for entry in entries {
                self.pend_entry(&mut analysis, entry)?;
            }
        }

        info!(
            "analyzed {} -> {}: {} adds, {} edits, {} deletes, {} renames",
            from.short(),
            to.short(),
            analysis.adds().len(),
            analysis.edits().len(),
            analysis.deletes().len(),
            analysis.renames().len()
        );

        Ok(analysis)
    }

    fn initial_import(&self, to_tree: &Tree) -> CheckinAnalysis {
        let mut analysis = CheckinAnalysis::new();
        for (path, entry) in to_tree.iter() {
            if entry.id.is_zero() || entry.kind == EntryKind::Submodule {
                debug!("skipping {} in initial import", path);
                continue;
            }
            analysis.pend_add(AddChange::new(path.clone(), entry.id));
        }
        info!("initial import: {} adds", analysis.adds().len());
        analysis
    }

    fn pend_entry(&self, analysis: &mut CheckinAnalysis, entry: DiffEntry) -> Result<(), CheckinError> {
        match entry {
            DiffEntry::Modify { path, new_id, .. } => analysis.pend_edit(EditChange::new(path, new_id)),
            DiffEntry::Add { path, id } => analysis.pend_add(AddChange::new(path, id)),
            DiffEntry::Copy(copy) => {
                debug!("copy {} -> {} pended as add", copy.old_path, copy.new_path);
                analysis.pend_add(AddChange::new(copy.new_path, copy.new_id))
            }
            DiffEntry::Delete { path, .. } => analysis.pend_delete(self.repo, DeleteChange::file(path))?,
            DiffEntry::Rename(rename) => {
                debug!("rename {} -> {} (score {})", rename.old_path, rename.new_path, rename.score);
                let change = if rename.old_id == rename.new_id {
                    RenameChange::pure(rename.old_path, rename.new_path)
                } else {
                    RenameChange::new(rename.old_path, rename.new_path, rename.new_id, true)
                };
                analysis.pend_rename(change);
            }
        }

        Ok(())
    }
}

fn validate_case(tree: &Tree) -> Result<(), CheckinError> {
    match tree.find_case_collision() {
        Some((first, second)) => Err(CheckinError::CaseCollision { first, second }),
        None => Ok(()),
    }
}

/// Submodule links have no content the server can hold
fn without_submodules(mut diff: TreeDiff) -> TreeDiff {
    diff.added.retain(|(_, entry)| entry.kind != EntryKind::Submodule);
    diff.removed.retain(|(_, entry)| entry.kind != EntryKind::Submodule);
    diff.modified
        .retain(|(_, old, new)| old.kind != EntryKind::Submodule && new.kind != EntryKind::Submodule);
    diff
}

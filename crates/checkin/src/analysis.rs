//! Accumulated result of comparing two trees

use crate::change::{AddChange, Change, DeleteChange, EditChange, HasPath, ItemKind, RenameChange};
use crate::error::CheckinError;
use crate::path::get_parent;
use ahash::AHashMap;
use gtf_core::{ObjectId, Repository};
use tracing::debug;

/// Changes found between a source and a target tree
///
/// Populated while the trees are walked, then handed read-only to the folder
/// rename detector and the orchestrator. A path shows up in at most one of
/// adds, edits and deletes.
#[derive(Debug, Clone, Default)]
pub struct CheckinAnalysis {
    adds: Vec<AddChange>,
    edits: Vec<EditChange>,
    deletes: Vec<DeleteChange>,
    renames: Vec<RenameChange>,
    /// Folders already looked up for inference, and whether they still exist
    checked_folders: AHashMap<String, bool>,
    /// Tree the deletes move towards; None disables folder-delete inference
    target: Option<ObjectId>,
}

impl CheckinAnalysis {
    /// Analysis for an initial import: adds only, no folder-delete inference
    pub fn new() -> Self {
        Self::default()
    }

    /// Analysis of a move towards `target`; file deletes that empty a
    /// folder in `target` also delete the folder
    pub fn for_target(target: ObjectId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn infers_folder_deletes(&self) -> bool {
        self.target.is_some()
    }

    pub fn pend_add(&mut self, change: AddChange) {
        self.adds.push(change);
    }

    pub fn pend_edit(&mut self, change: EditChange) {
        self.edits.push(change);
    }

    pub fn pend_rename(&mut self, change: RenameChange) {
        self.renames.push(change);
    }

    /// Record a delete, then delete any folder it leaves empty in the target
    pub fn pend_delete<R: Repository + ?Sized>(
        &mut self,
        repo: &R,
        change: DeleteChange,
    ) -> Result<(), CheckinError> {
        let (start, own_folder) = match change.kind {
            ItemKind::File => (get_parent(&change.path).to_string(), None),
            ItemKind::Folder => (change.path.clone(), Some(change.path.clone())),
        };

        self.deletes.push(change);
        self.infer_folder_delete(repo, start, own_folder.as_deref())
    }

    /// Walk up from `folder` while the target has nothing there and delete
    /// the topmost vanished folder.
    ///
    /// Each folder is looked up at most once per analysis. Reaching a folder
    /// already known to be gone means a folder delete at or above it was
    /// recorded earlier.
    fn infer_folder_delete<R: Repository + ?Sized>(
        &mut self,
        repo: &R,
        mut folder: String,
        own_folder: Option<&str>,
    ) -> Result<(), CheckinError> {
        let Some(target) = self.target else {
            return Ok(());
        };

        let mut topmost_absent: Option<String> = None;
        while !folder.is_empty() {
            let exists = match self.checked_folders.get(&folder) {
                Some(false) => return Ok(()),
                Some(true) => true,
                None => {
                    let exists = repo.path_exists(&target, &folder)?;
                    self.checked_folders.insert(folder.clone(), exists);
                    exists
                }
            };

            if exists {
                break;
            }

            let parent = get_parent(&folder).to_string();
            topmost_absent = Some(std::mem::replace(&mut folder, parent));
        }

        match topmost_absent {
            Some(vanished) if Some(vanished.as_str()) != own_folder => {
                debug!("inferred folder delete: {}", vanished);
                self.deletes.push(DeleteChange::folder(vanished));
            }
            _ => {}
        }

        Ok(())
    }

    pub fn adds(&self) -> &[AddChange] {
        &self.adds
    }

    pub fn edits(&self) -> &[EditChange] {
        &self.edits
    }

    pub fn deletes(&self) -> &[DeleteChange] {
        &self.deletes
    }

    pub fn renames(&self) -> &[RenameChange] {
        &self.renames
    }

    /// Total number of changes across all four lists
    pub fn size(&self) -> usize {
        self.adds.len() + self.edits.len() + self.deletes.len() + self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The change addressed by `path`, if any
    ///
    /// Adds, edits and deletes are checked before renames; renames match on
    /// their destination.
    pub fn change_at(&self, path: &str) -> Option<Change> {
        find_change(&self.adds, path)
            .cloned()
            .map(Change::Add)
            .or_else(|| find_change(&self.edits, path).cloned().map(Change::Edit))
            .or_else(|| find_change(&self.deletes, path).cloned().map(Change::Delete))
            .or_else(|| find_change(&self.renames, path).cloned().map(Change::Rename))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.change_at(path).is_some()
    }

    /// Every change, in add, edit, delete, rename order
    pub fn changes(&self) -> impl Iterator<Item = Change> + '_ {
        self.adds
            .iter()
            .cloned()
            .map(Change::Add)
            .chain(self.edits.iter().cloned().map(Change::Edit))
            .chain(self.deletes.iter().cloned().map(Change::Delete))
            .chain(self.renames.iter().cloned().map(Change::Rename))
    }
}

/// Find the change addressed by `path` in one of the analysis lists
pub fn find_change<'a, T: HasPath>(changes: &'a [T], path: &str) -> Option<&'a T> {
    changes.iter().find(|change| change.path() == path)
}

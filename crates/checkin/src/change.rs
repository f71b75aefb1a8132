//! Pending change model
//!
//! One value per operation the server will be asked to pend. Values are
//! immutable; a rename that later absorbs an edit is replaced by an updated
//! copy (`RenameChange::with_edit_information`).

use gtf_core::ObjectId;
use serde::Serialize;

/// Anything addressed by a repository path
pub trait HasPath {
    fn path(&self) -> &str;
}

/// A new file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddChange {
    pub path: String,
    pub id: ObjectId,
}

impl AddChange {
    pub fn new(path: impl Into<String>, id: ObjectId) -> Self {
        Self {
            path: path.into(),
            id,
        }
    }
}

/// New content at an existing path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditChange {
    pub path: String,
    pub id: ObjectId,
}

impl EditChange {
    pub fn new(path: impl Into<String>, id: ObjectId) -> Self {
        Self {
            path: path.into(),
            id,
        }
    }
}

/// Whether a delete removes one file or a whole folder subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteChange {
    pub path: String,
    pub kind: ItemKind,
}

impl DeleteChange {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::File,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::Folder,
        }
    }
}

/// A move of a file or folder, optionally carrying new content
///
/// `id` is [`ObjectId::ZERO`] for a pure rename. When `old_path == new_path`
/// the record only carries an edit for an item that an enclosing folder
/// rename already moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameChange {
    pub old_path: String,
    pub new_path: String,
    pub id: ObjectId,
    pub is_edit: bool,
}

impl RenameChange {
    pub fn new(
        old_path: impl Into<String>,
        new_path: impl Into<String>,
        id: ObjectId,
        is_edit: bool,
    ) -> Self {
        Self {
            old_path: old_path.into(),
            new_path: new_path.into(),
            id,
            is_edit,
        }
    }

    /// A rename with no content change
    pub fn pure(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self::new(old_path, new_path, ObjectId::ZERO, false)
    }

    /// Same rename, now also carrying `id` as new content when `is_edit`
    ///
    /// An existing edit is never dropped by merging in a non-edit.
    pub fn with_edit_information(&self, id: ObjectId, is_edit: bool) -> Self {
        if !is_edit {
            return self.clone();
        }
        Self {
            id,
            is_edit: true,
            ..self.clone()
        }
    }

    /// True when the record moves nothing and only carries an edit
    pub fn is_edit_only(&self) -> bool {
        self.old_path == self.new_path
    }
}

/// One pending operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    Add(AddChange),
    Edit(EditChange),
    Delete(DeleteChange),
    Rename(RenameChange),
}

impl Change {
    /// Content id, if the operation carries content
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Change::Add(add) => Some(add.id),
            Change::Edit(edit) => Some(edit.id),
            Change::Delete(_) => None,
            Change::Rename(rename) if rename.is_edit => Some(rename.id),
            Change::Rename(_) => None,
        }
    }
}

impl HasPath for AddChange {
    fn path(&self) -> &str {
        &self.path
    }
}

impl HasPath for EditChange {
    fn path(&self) -> &str {
        &self.path
    }
}

impl HasPath for DeleteChange {
    fn path(&self) -> &str {
        &self.path
    }
}

impl HasPath for RenameChange {
    /// Renames are addressed by their destination
    fn path(&self) -> &str {
        &self.new_path
    }
}

impl HasPath for Change {
    fn path(&self) -> &str {
        match self {
            Change::Add(add) => add.path(),
            Change::Edit(edit) => edit.path(),
            Change::Delete(delete) => delete.path(),
            Change::Rename(rename) => rename.path(),
        }
    }
}

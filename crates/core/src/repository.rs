//! Read access to trees and blobs

use crate::error::ObjectError;
use crate::hash::ObjectId;
use crate::tree::Tree;
use std::sync::Arc;

/// Read-only view of an object database
///
/// Tree handles are plain object ids; what an id refers to (a stored tree, a
/// Git tree, a Git commit) is up to the implementation. Trees come back
/// flattened so that path queries never touch the database again.
pub trait Repository {
    /// Load the flattened snapshot named by `tree`
    fn read_tree(&self, tree: &ObjectId) -> Result<Arc<Tree>, ObjectError>;

    /// Read the full content of a blob
    fn read_blob(&self, blob: &ObjectId) -> Result<Vec<u8>, ObjectError>;

    /// True if a file or a non-empty folder exists at `path` in `tree`
    fn path_exists(&self, tree: &ObjectId, path: &str) -> Result<bool, ObjectError> {
        Ok(self.read_tree(tree)?.contains_path(path))
    }
}

impl<R: Repository + ?Sized> Repository for &R {
    fn read_tree(&self, tree: &ObjectId) -> Result<Arc<Tree>, ObjectError> {
        (**self).read_tree(tree)
    }

    fn read_blob(&self, blob: &ObjectId) -> Result<Vec<u8>, ObjectError> {
        (**self).read_blob(blob)
    }

    fn path_exists(&self, tree: &ObjectId, path: &str) -> Result<bool, ObjectError> {
        (**self).path_exists(tree, path)
    }
}

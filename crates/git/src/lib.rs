//! gtf git - reads trees and blobs out of a Git repository
//!
//! Wraps a `git2::Repository` behind the [`gtf_core::Repository`] trait.
//! Tree handles may name either a tree or a commit; commits are peeled to
//! their root tree. Flattened trees are cached per handle.

use ahash::AHashMap;
use git2::{ErrorCode, ObjectType, Oid};
use gtf_core::{Entry, ObjectError, ObjectId, Repository, Tree};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

const MODE_SYMLINK: i32 = 0o120000;

/// A Git repository as a read-only object database
pub struct GitRepository {
    repo: git2::Repository,
    tree_cache: Mutex<AHashMap<ObjectId, Arc<Tree>>>,
}

impl GitRepository {
    /// Open the repository containing `path`
    pub fn discover(path: &Path) -> Result<Self, ObjectError> {
        let repo = git2::Repository::discover(path).map_err(backend)?;
        Ok(Self::from_git2(repo))
    }

    pub fn from_git2(repo: git2::Repository) -> Self {
        Self {
            repo,
            tree_cache: Mutex::new(AHashMap::new()),
        }
    }

    /// Working directory of a non-bare repository
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Resolve a revision (`HEAD`, `main~2`, a hex id...) to its root tree id
    pub fn resolve_tree(&self, rev: &str) -> Result<ObjectId, ObjectError> {
        let object = self.repo.revparse_single(rev).map_err(|e| match e.code() {
            ErrorCode::NotFound => ObjectError::Backend(format!("unknown revision '{}'", rev)),
            _ => backend(e),
        })?;
        let tree = object.peel_to_tree().map_err(|_| ObjectError::IncorrectType {
            id: object_id(object.id()).unwrap_or(ObjectId::ZERO),
            expected: "tree-ish",
        })?;
        object_id(tree.id())
    }

    fn find_tree(&self, id: &ObjectId) -> Result<git2::Tree<'_>, ObjectError> {
        let object = self.repo.find_object(oid(id)?, None).map_err(|e| not_found(e, id))?;
        object.peel_to_tree().map_err(|_| ObjectError::IncorrectType {
            id: *id,
            expected: "tree",
        })
    }

    fn flatten(&self, tree: &git2::Tree<'_>, prefix: &str, out: &mut Tree) -> Result<(), ObjectError> {
        for entry in tree.iter() {
            let Some(name) = entry.name() else {
                warn!("skipping non UTF-8 entry under '{}'", prefix);
                continue;
            };
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            };
            let id = object_id(entry.id())?;

            match entry.kind() {
                Some(ObjectType::Tree) => {
                    let subtree = self.repo.find_tree(entry.id()).map_err(|e| not_found(e, &id))?;
                    self.flatten(&subtree, &path, out)?;
                }
                Some(ObjectType::Blob) if entry.filemode() == MODE_SYMLINK => {
                    out.insert(&path, Entry::symlink(id));
                }
                Some(ObjectType::Blob) => {
                    out.insert(&path, Entry::file(entry.filemode() as u32, id));
                }
                Some(ObjectType::Commit) => out.insert(&path, Entry::submodule(id)),
                other => debug!("skipping {} ({:?})", path, other),
            }
        }
        Ok(())
    }
}

impl Repository for GitRepository {
    fn read_tree(&self, tree: &ObjectId) -> Result<Arc<Tree>, ObjectError> {
        if let Some(cached) = self.tree_cache.lock().get(tree) {
            return Ok(Arc::clone(cached));
        }

        let git_tree = self.find_tree(tree)?;
        let mut flat = Tree::new();
        self.flatten(&git_tree, "", &mut flat)?;
        debug!("flattened tree {} ({} entries)", tree.short(), flat.len());

        let flat = Arc::new(flat);
        self.tree_cache.lock().insert(*tree, Arc::clone(&flat));
        Ok(flat)
    }

    fn read_blob(&self, blob: &ObjectId) -> Result<Vec<u8>, ObjectError> {
        let found = self.repo.find_blob(oid(blob)?).map_err(|e| not_found(e, blob))?;
        Ok(found.content().to_vec())
    }
}

fn oid(id: &ObjectId) -> Result<Oid, ObjectError> {
    Oid::from_bytes(id.as_bytes()).map_err(backend)
}

fn object_id(oid: Oid) -> Result<ObjectId, ObjectError> {
    ObjectId::from_slice(oid.as_bytes())
        .ok_or_else(|| ObjectError::Backend(format!("unsupported object id length for {}", oid)))
}

fn not_found(e: git2::Error, id: &ObjectId) -> ObjectError {
    match e.code() {
        ErrorCode::NotFound => ObjectError::Missing(*id),
        _ => backend(e),
    }
}

fn backend(e: git2::Error) -> ObjectError {
    ObjectError::Backend(e.message().to_string())
}

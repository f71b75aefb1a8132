//! Content-addressed store for blobs and trees

use crate::error::ObjectError;
use crate::hash::{hash_blob, hash_bytes, ObjectId};
use crate::repository::Repository;
use crate::tree::Tree;
use dashmap::DashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Object store backing tests, fixtures and offline analysis
///
/// Either purely in memory, or persisted under a `.gtf/` directory:
/// ```text
/// .gtf/
///   config.toml
///   objects/
///     blobs/<hh>/<rest>   (zstd compressed)
///     trees/<hh>/<rest>
///   tmp/
/// ```
pub struct Store {
    /// Path to .gtf directory (None = in memory only)
    gtf_dir: Option<PathBuf>,
    /// Blob cache (id -> content)
    blob_cache: DashMap<ObjectId, Arc<Vec<u8>>>,
    /// Tree cache (id -> tree)
    tree_cache: DashMap<ObjectId, Arc<Tree>>,
}

/// Name of the store directory under a repository root
pub const STORE_DIR: &str = ".gtf";

const BLOB_COMPRESSION_LEVEL: i32 = 3;

impl Store {
    /// Create a store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            gtf_dir: None,
            blob_cache: DashMap::new(),
            tree_cache: DashMap::new(),
        }
    }

    /// Initialize a new store at the given repository root
    pub fn init(repo_root: &Path) -> Result<Self, ObjectError> {
        let gtf_dir = repo_root.join(STORE_DIR);
        for sub in ["objects/blobs", "objects/trees", "tmp"] {
            fs::create_dir_all(gtf_dir.join(sub))?;
        }
        debug!("initialized object store at {}", gtf_dir.display());
        Self::open(repo_root)
    }

    /// Open an existing store
    pub fn open(repo_root: &Path) -> Result<Self, ObjectError> {
        let gtf_dir = repo_root.join(STORE_DIR);
        if !gtf_dir.join("objects").is_dir() {
            return Err(ObjectError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no object store at {}", gtf_dir.display()),
            )));
        }

        Ok(Self {
            gtf_dir: Some(gtf_dir),
            blob_cache: DashMap::new(),
            tree_cache: DashMap::new(),
        })
    }

    /// Write blob content, returning its Git-compatible id
    pub fn write_blob(&self, content: &[u8]) -> Result<ObjectId, ObjectError> {
        let id = hash_blob(content);
        if self.blob_cache.contains_key(&id) {
            return Ok(id);
        }

        if let Some(gtf_dir) = &self.gtf_dir {
            let target = object_path(gtf_dir, "blobs", &id);
            if !target.exists() {
                let compressed = zstd::encode_all(content, BLOB_COMPRESSION_LEVEL)?;
                atomic_write(&gtf_dir.join("tmp"), &target, &compressed)?;
            }
        }

        self.blob_cache.insert(id, Arc::new(content.to_vec()));
        Ok(id)
    }

    /// Write a tree to storage
    pub fn write_tree(&self, tree: &Tree) -> Result<ObjectId, ObjectError> {
        let bytes = tree.serialize()?;
        let id = hash_bytes(&bytes);

        if let Some(gtf_dir) = &self.gtf_dir {
            let target = object_path(gtf_dir, "trees", &id);
            if !target.exists() {
                atomic_write(&gtf_dir.join("tmp"), &target, &bytes)?;
            }
        }

        self.tree_cache.insert(id, Arc::new(tree.clone()));
        Ok(id)
    }

    /// Get the .gtf directory path, if persisted
    pub fn gtf_dir(&self) -> Option<&Path> {
        self.gtf_dir.as_deref()
    }

    fn load_blob(&self, id: &ObjectId) -> Result<Arc<Vec<u8>>, ObjectError> {
        if let Some(cached) = self.blob_cache.get(id) {
            return Ok(cached.clone());
        }

        let gtf_dir = self.gtf_dir.as_ref().ok_or(ObjectError::Missing(*id))?;
        let path = object_path(gtf_dir, "blobs", id);
        let compressed = read_object_file(&path, id)?;
        let content = zstd::decode_all(compressed.as_slice()).map_err(|e| ObjectError::Corrupt {
            id: *id,
            reason: format!("decompression failed: {}", e),
        })?;

        if hash_blob(&content) != *id {
            return Err(ObjectError::Corrupt {
                id: *id,
                reason: "content does not match its id".to_string(),
            });
        }

        let content = Arc::new(content);
        self.blob_cache.insert(*id, content.clone());
        Ok(content)
    }

    fn load_tree(&self, id: &ObjectId) -> Result<Arc<Tree>, ObjectError> {
        if let Some(cached) = self.tree_cache.get(id) {
            return Ok(cached.clone());
        }

        let gtf_dir = self.gtf_dir.as_ref().ok_or(ObjectError::Missing(*id))?;
        let path = object_path(gtf_dir, "trees", id);
        let bytes = read_object_file(&path, id)?;
        let tree = Arc::new(Tree::deserialize(&bytes)?);

        if tree.hash()? != *id {
            return Err(ObjectError::Corrupt {
                id: *id,
                reason: "tree does not match its id".to_string(),
            });
        }

        self.tree_cache.insert(*id, tree.clone());
        Ok(tree)
    }
}

impl Repository for Store {
    fn read_tree(&self, tree: &ObjectId) -> Result<Arc<Tree>, ObjectError> {
        self.load_tree(tree)
    }

    fn read_blob(&self, blob: &ObjectId) -> Result<Vec<u8>, ObjectError> {
        Ok(self.load_blob(blob)?.as_ref().clone())
    }
}

/// Object path: objects/<kind>/<hh>/<rest>
fn object_path(gtf_dir: &Path, kind: &str, id: &ObjectId) -> PathBuf {
    let hex = id.to_hex();
    gtf_dir.join("objects").join(kind).join(&hex[..2]).join(&hex[2..])
}

fn read_object_file(path: &Path, id: &ObjectId) -> Result<Vec<u8>, ObjectError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ObjectError::Missing(*id)),
        Err(e) => Err(ObjectError::Io(e)),
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Atomic write helper
///
/// Writes data to a temporary file, fsyncs it, then renames it to the target path.
/// Readers never observe a partially written object.
pub fn atomic_write(tmp_dir: &Path, target: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(tmp_dir)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_dir.join(format!(
        "obj-{}-{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&tmp_path, target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    Ok(())
}

//! Tree representation for repository snapshots

use crate::error::ObjectError;
use crate::hash::{hash_bytes, ObjectId};
use ahash::AHashMap;
use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;

/// Type of tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Symbolic link
    Symlink,
    /// Submodule (gitlink); the id names a commit in another repository
    Submodule,
}

impl EntryKind {
    fn to_byte(self) -> u8 {
        match self {
            EntryKind::File => 0,
            EntryKind::Symlink => 1,
            EntryKind::Submodule => 2,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(EntryKind::File),
            1 => Some(EntryKind::Symlink),
            2 => Some(EntryKind::Submodule),
            _ => None,
        }
    }
}

/// Entry in a tree (file, symlink, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Kind of entry
    pub kind: EntryKind,
    /// Unix permission bits (mode)
    pub mode: u32,
    /// Id of the object holding this entry's content
    pub id: ObjectId,
}

impl Entry {
    /// Create a new file entry
    pub fn file(mode: u32, id: ObjectId) -> Self {
        Self {
            kind: EntryKind::File,
            mode,
            id,
        }
    }

    /// Create a new symlink entry
    pub fn symlink(id: ObjectId) -> Self {
        Self {
            kind: EntryKind::Symlink,
            mode: 0o120000, // Standard symlink mode
            id,
        }
    }

    /// Create a new submodule entry
    pub fn submodule(commit: ObjectId) -> Self {
        Self {
            kind: EntryKind::Submodule,
            mode: 0o160000,
            id: commit,
        }
    }
}

/// A tree represents the complete repository state at a point in time
///
/// Only leaves are stored; folders exist implicitly as path prefixes. Paths
/// are repository-relative and `/`-separated, without leading or trailing
/// slashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    /// Mapping from path to entry, ordered so folder subtrees are contiguous
    entries: BTreeMap<String, Entry>,
}

const TREE_MAGIC: &[u8; 4] = b"GTT1";

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert an entry into the tree
    pub fn insert(&mut self, path: &str, entry: Entry) {
        debug_assert!(
            !path.is_empty() && !path.starts_with('/') && !path.ends_with('/'),
            "malformed tree path: {path:?}"
        );
        self.entries.insert(path.to_string(), entry);
    }

    /// Get an entry from the tree
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    /// Remove an entry from the tree
    pub fn remove(&mut self, path: &str) -> Option<Entry> {
        self.entries.remove(path)
    }

    /// Get the number of entries in the tree
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    /// True if anything exists at `path`: a leaf entry, or a folder with at
    /// least one entry beneath it. The empty path is the root and always
    /// exists.
    pub fn contains_path(&self, path: &str) -> bool {
        if path.is_empty() || self.entries.contains_key(path) {
            return true;
        }

        let prefix = format!("{}/", path);
        self.entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .next()
            .map_or(false, |(key, _)| key.starts_with(&prefix))
    }

    /// Find two paths (files or folders) that differ only by letter case
    ///
    /// Returns the first colliding pair in path order.
    pub fn find_case_collision(&self) -> Option<(String, String)> {
        let mut seen: AHashMap<String, &str> = AHashMap::new();

        for path in self.entries.keys() {
            // Every folder prefix is a path on a case-insensitive server too
            let prefixes = path
                .match_indices('/')
                .map(|(idx, _)| &path[..idx])
                .chain(std::iter::once(path.as_str()));

            for candidate in prefixes {
                let folded = candidate.to_lowercase();
                match seen.get(&folded) {
                    Some(existing) if *existing != candidate => {
                        return Some((existing.to_string(), candidate.to_string()));
                    }
                    Some(_) => {}
                    None => {
                        seen.insert(folded, candidate);
                    }
                }
            }
        }

        None
    }

    /// Serialize the tree to bytes (TreeV1 format)
    ///
    /// Format:
    /// - magic: "GTT1" (4 bytes)
    /// - entry_count: u32
    /// - entries (sorted lexicographically by path):
    ///   - path_len: u16
    ///   - path_bytes: [u8; path_len]
    ///   - kind: u8 (0=file, 1=symlink, 2=submodule)
    ///   - mode: u32
    ///   - id: [u8; 20]
    ///
    /// Fails if a path does not fit its `u16` length prefix.
    pub fn serialize(&self) -> Result<Vec<u8>, ObjectError> {
        let mut out = Vec::with_capacity(8 + self.entries.len() * 48);
        out.extend_from_slice(TREE_MAGIC);
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        for (path, entry) in &self.entries {
            let path_len = u16::try_from(path.len()).map_err(|_| ObjectError::PathTooLong { len: path.len() })?;
            out.extend_from_slice(&path_len.to_le_bytes());
            out.extend_from_slice(path.as_bytes());
            out.push(entry.kind.to_byte());
            out.extend_from_slice(&entry.mode.to_le_bytes());
            out.extend_from_slice(entry.id.as_bytes());
        }

        Ok(out)
    }

    /// Deserialize a tree from bytes (TreeV1 format)
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ObjectError> {
        let corrupt = |reason: &str| ObjectError::Corrupt {
            id: hash_bytes(bytes),
            reason: reason.to_string(),
        };

        let mut reader = ByteReader { bytes, pos: 0 };
        if reader.take(4).ok_or_else(|| corrupt("truncated header"))? != TREE_MAGIC {
            return Err(corrupt("bad tree magic"));
        }
        let count = reader.u32().ok_or_else(|| corrupt("truncated header"))?;

        let mut tree = Tree::new();
        for _ in 0..count {
            let path_len = reader.u16().ok_or_else(|| corrupt("truncated entry"))? as usize;
            let path_bytes = reader.take(path_len).ok_or_else(|| corrupt("truncated path"))?;
            let path = std::str::from_utf8(path_bytes).map_err(|_| corrupt("path is not UTF-8"))?;
            let kind = reader
                .u8()
                .and_then(EntryKind::from_byte)
                .ok_or_else(|| corrupt("unknown entry kind"))?;
            let mode = reader.u32().ok_or_else(|| corrupt("truncated entry"))?;
            let id = reader
                .take(20)
                .and_then(ObjectId::from_slice)
                .ok_or_else(|| corrupt("truncated object id"))?;

            tree.entries.insert(path.to_string(), Entry { kind, mode, id });
        }

        if reader.pos != bytes.len() {
            return Err(corrupt("trailing bytes after entries"));
        }

        Ok(tree)
    }

    /// Compute the id of this tree
    ///
    /// Deterministic - same tree content always produces same id
    pub fn hash(&self) -> Result<ObjectId, ObjectError> {
        Ok(hash_bytes(&self.serialize()?))
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Differences between two trees
#[derive(Debug, Clone, Default)]
pub struct TreeDiff {
    /// Entries added in new tree
    pub added: Vec<(String, Entry)>,
    /// Entries removed in new tree
    pub removed: Vec<(String, Entry)>,
    /// Entries modified in new tree (old, new)
    pub modified: Vec<(String, Entry, Entry)>,
}

impl TreeDiff {
    /// Compute the diff between two trees
    ///
    /// Both trees are walked in path order, so each list comes out sorted.
    pub fn diff(old: &Tree, new: &Tree) -> Self {
        let mut diff = TreeDiff::default();
        let mut old_iter = old.entries.iter().peekable();
        let mut new_iter = new.entries.iter().peekable();

        loop {
            match (old_iter.peek(), new_iter.peek()) {
                (Some((old_path, old_entry)), Some((new_path, new_entry))) => {
                    match old_path.cmp(new_path) {
                        std::cmp::Ordering::Less => {
                            diff.removed.push(((*old_path).clone(), **old_entry));
                            old_iter.next();
                        }
                        std::cmp::Ordering::Greater => {
                            diff.added.push(((*new_path).clone(), **new_entry));
                            new_iter.next();
                        }
                        std::cmp::Ordering::Equal => {
                            if old_entry != new_entry {
                                diff.modified.push(((*new_path).clone(), **old_entry, **new_entry));
                            }
                            old_iter.next();
                            new_iter.next();
                        }
                    }
                }
                (Some((old_path, old_entry)), None) => {
                    diff.removed.push(((*old_path).clone(), **old_entry));
                    old_iter.next();
                }
                (None, Some((new_path, new_entry))) => {
                    diff.added.push(((*new_path).clone(), **new_entry));
                    new_iter.next();
                }
                (None, None) => break,
            }
        }

        diff
    }

    /// Check if there are any changes
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

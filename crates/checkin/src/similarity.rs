//! Content similarity rename detection
//!
//! Pairs removed and added files of a raw tree diff into renames and copies:
//! 1. exact renames (identical content id)
//! 2. inexact renames (line similarity at or above a threshold)
//!
//! A deleted file is the source of at most one rename. Further adds paired
//! with an already-used source are copies.

use crate::path::get_file_name;
use ahash::AHashMap;
use gtf_core::{Entry, ObjectError, ObjectId, Repository, TreeDiff};
use similar::TextDiff;
use tracing::debug;

/// How a raw diff entry was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Add,
    Modify,
    Delete,
    Rename,
    Copy,
}

/// A removed file matched with an added one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub old_path: String,
    pub new_path: String,
    pub old_id: ObjectId,
    pub new_id: ObjectId,
    /// Similarity score 0-100
    pub score: u8,
}

impl Pairing {
    fn new(source: &(String, Entry), dest: &(String, Entry), score: u8) -> Self {
        Self {
            old_path: source.0.clone(),
            new_path: dest.0.clone(),
            old_id: source.1.id,
            new_id: dest.1.id,
            score,
        }
    }
}

/// One classified difference between two trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEntry {
    Add { path: String, id: ObjectId },
    Modify { path: String, old_id: ObjectId, new_id: ObjectId },
    Delete { path: String, id: ObjectId },
    Rename(Pairing),
    Copy(Pairing),
}

impl DiffEntry {
    pub fn kind(&self) -> DiffKind {
        match self {
            DiffEntry::Add { .. } => DiffKind::Add,
            DiffEntry::Modify { .. } => DiffKind::Modify,
            DiffEntry::Delete { .. } => DiffKind::Delete,
            DiffEntry::Rename(_) => DiffKind::Rename,
            DiffEntry::Copy(_) => DiffKind::Copy,
        }
    }

    /// A rename for a source not paired yet, a copy otherwise
    fn paired(source_used: bool, pairing: Pairing) -> Self {
        if source_used {
            DiffEntry::Copy(pairing)
        } else {
            DiffEntry::Rename(pairing)
        }
    }
}

/// Default minimum similarity for an inexact rename
pub const DEFAULT_SIMILARITY: u8 = 60;

/// Default cap on sources/destinations considered for inexact matching
pub const DEFAULT_RENAME_LIMIT: usize = 1000;

/// Rename/copy detector over a raw [`TreeDiff`]
pub struct RenameDetector<'a, R: Repository + ?Sized> {
    repo: &'a R,
    similarity: u8,
    rename_limit: usize,
    content_cache: AHashMap<ObjectId, String>,
}

impl<'a, R: Repository + ?Sized> RenameDetector<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            similarity: DEFAULT_SIMILARITY,
            rename_limit: DEFAULT_RENAME_LIMIT,
            content_cache: AHashMap::new(),
        }
    }

    /// Minimum score (0-100) for an inexact rename
    pub fn with_similarity(mut self, similarity: u8) -> Self {
        self.similarity = similarity.min(100);
        self
    }

    /// Skip inexact matching when either side has more files than this
    pub fn with_rename_limit(mut self, rename_limit: usize) -> Self {
        self.rename_limit = rename_limit;
        self
    }

    /// Classify every difference in `diff`
    pub fn compute(mut self, diff: TreeDiff) -> Result<Vec<DiffEntry>, ObjectError> {
        let TreeDiff {
            added,
            removed,
            modified,
        } = diff;

        let mut entries: Vec<DiffEntry> = modified
            .into_iter()
            .map(|(path, old, new)| DiffEntry::Modify {
                path,
                old_id: old.id,
                new_id: new.id,
            })
            .collect();

        let mut source_used = vec![false; removed.len()];
        let mut dest_matched = vec![false; added.len()];

        self.find_exact(&removed, &added, &mut source_used, &mut dest_matched, &mut entries);
        self.find_inexact(&removed, &added, &mut source_used, &mut dest_matched, &mut entries)?;

        for (dest, matched) in added.into_iter().zip(dest_matched) {
            if !matched {
                entries.push(DiffEntry::Add {
                    path: dest.0,
                    id: dest.1.id,
                });
            }
        }
        for (source, used) in removed.into_iter().zip(source_used) {
            if !used {
                entries.push(DiffEntry::Delete {
                    path: source.0,
                    id: source.1.id,
                });
            }
        }

        Ok(entries)
    }

    fn find_exact(
        &self,
        removed: &[(String, Entry)],
        added: &[(String, Entry)],
        source_used: &mut [bool],
        dest_matched: &mut [bool],
        entries: &mut Vec<DiffEntry>,
    ) {
        let mut sources_by_id: AHashMap<ObjectId, Vec<usize>> = AHashMap::new();
        for (idx, (_, entry)) in removed.iter().enumerate() {
            sources_by_id.entry(entry.id).or_default().push(idx);
        }

        for (dest_idx, dest) in added.iter().enumerate() {
            let Some(candidates) = sources_by_id.get(&dest.1.id) else {
                continue;
            };

            // Prefer an unused source, then the one sharing the file name
            let best = candidates
                .iter()
                .copied()
                .max_by_key(|&src| (!source_used[src], name_score(&removed[src].0, &dest.0)));

            if let Some(src) = best {
                entries.push(DiffEntry::paired(source_used[src], Pairing::new(&removed[src], dest, 100)));
                source_used[src] = true;
                dest_matched[dest_idx] = true;
            }
        }
    }

    fn find_inexact(
        &mut self,
        removed: &[(String, Entry)],
        added: &[(String, Entry)],
        source_used: &mut [bool],
        dest_matched: &mut [bool],
        entries: &mut Vec<DiffEntry>,
    ) -> Result<(), ObjectError> {
        let sources: Vec<usize> = (0..removed.len()).filter(|&i| !source_used[i]).collect();
        let dests: Vec<usize> = (0..added.len()).filter(|&i| !dest_matched[i]).collect();

        if sources.is_empty() || dests.is_empty() {
            return Ok(());
        }
        if sources.len() > self.rename_limit || dests.len() > self.rename_limit {
            debug!(
                "skipping inexact rename detection: {} sources x {} destinations exceeds limit {}",
                sources.len(),
                dests.len(),
                self.rename_limit
            );
            return Ok(());
        }

        // (score, name score, source, destination)
        let mut candidates: Vec<(u8, u8, usize, usize)> = Vec::new();
        for &src in &sources {
            for &dst in &dests {
                let score = self.content_score(&removed[src].1.id, &added[dst].1.id)?;
                if score >= self.similarity {
                    candidates.push((score, name_score(&removed[src].0, &added[dst].0), src, dst));
                }
            }
        }

        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)).then(a.3.cmp(&b.3)));

        for (score, _, src, dst) in candidates {
            if dest_matched[dst] {
                continue;
            }
            entries.push(DiffEntry::paired(
                source_used[src],
                Pairing::new(&removed[src], &added[dst], score),
            ));
            source_used[src] = true;
            dest_matched[dst] = true;
        }

        Ok(())
    }

    /// Line similarity of two blobs, 0-100
    fn content_score(&mut self, old: &ObjectId, new: &ObjectId) -> Result<u8, ObjectError> {
        let old_len = self.content(old)?.len();
        let new_len = self.content(new)?.len();

        let (small, large) = (old_len.min(new_len), old_len.max(new_len));
        if large == 0 {
            return Ok(100);
        }
        // Cheap upper bound before running a diff
        if (small * 100 / large) < self.similarity as usize {
            return Ok(0);
        }

        let old_text = &self.content_cache[old];
        let new_text = &self.content_cache[new];
        let ratio = TextDiff::from_lines(old_text.as_str(), new_text.as_str()).ratio();
        Ok((ratio * 100.0).round().clamp(0.0, 100.0) as u8)
    }

    fn content(&mut self, id: &ObjectId) -> Result<&String, ObjectError> {
        if !self.content_cache.contains_key(id) {
            let bytes = self.repo.read_blob(id)?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            self.content_cache.insert(*id, text);
        }
        Ok(&self.content_cache[id])
    }
}

/// 1 when both paths share a file name, else 0
fn name_score(old_path: &str, new_path: &str) -> u8 {
    u8::from(get_file_name(old_path) == get_file_name(new_path))
}

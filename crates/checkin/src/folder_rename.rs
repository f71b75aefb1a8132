//! Folder rename detection
//!
//! Git only records file moves. When a whole folder moves, every file in it
//! shows up as its own rename. This module collapses such groups into one
//! folder rename per renamed folder, keeps whatever file renames and edits
//! are left over, and batches everything by destination depth so that batch
//! `i` can be pended before batch `i + 1`.
//!
//! Old paths of emitted renames are expressed the way the server sees them
//! when their batch runs: beneath any already-emitted folder rename whose
//! destination is no deeper than their own.

use crate::change::{DeleteChange, RenameChange};
use crate::error::CheckinError;
use crate::path::{ancestors, combine, get_folder_depth, get_parent, is_ancestor, make_relative};
use ahash::AHashMap;
use gtf_core::{ObjectId, Repository};
use std::collections::BTreeMap;
use tracing::debug;

/// Renames to pend, flat and grouped by destination depth
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderRenameResult {
    renames: Vec<RenameChange>,
    batches: Vec<Vec<RenameChange>>,
}

impl FolderRenameResult {
    /// Batch renames by the depth of their new path, keeping their order
    pub fn from_renames(renames: Vec<RenameChange>) -> Self {
        let mut batches: Vec<Vec<RenameChange>> = Vec::new();
        for rename in &renames {
            let depth = get_folder_depth(&rename.new_path);
            if batches.len() <= depth {
                batches.resize_with(depth + 1, Vec::new);
            }
            batches[depth].push(rename.clone());
        }
        Self { renames, batches }
    }

    /// Every rename in the order it was produced
    pub fn renames(&self) -> &[RenameChange] {
        &self.renames
    }

    /// `batches()[i]` holds the renames whose new path has depth `i`; some
    /// batches may be empty
    pub fn batches(&self) -> &[Vec<RenameChange>] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Collapses file renames into folder renames between two trees
pub struct FolderRenameDetector<'a, R: Repository + ?Sized> {
    repo: &'a R,
    source_tree: ObjectId,
    target_tree: ObjectId,
    sorted_file_renames: Vec<RenameChange>,
    /// Source tree paths pended as deletes
    deleted_paths: Vec<String>,
    /// Original old path -> new path it was emitted with
    processed: BTreeMap<String, String>,
    /// Original old path -> position in `result_renames`
    result_index: AHashMap<String, usize>,
    result_renames: Vec<RenameChange>,
}

impl<'a, R: Repository + ?Sized> FolderRenameDetector<'a, R> {
    pub fn new(
        repo: &'a R,
        source_tree: ObjectId,
        target_tree: ObjectId,
        file_renames: &[RenameChange],
    ) -> Self {
        let mut sorted_file_renames = file_renames.to_vec();
        sorted_file_renames.sort_by(|a, b| a.old_path.cmp(&b.old_path));

        Self {
            repo,
            source_tree,
            target_tree,
            sorted_file_renames,
            deleted_paths: Vec::new(),
            processed: BTreeMap::new(),
            result_index: AHashMap::new(),
            result_renames: Vec::new(),
        }
    }

    /// Deletes pended alongside the renames; a folder holding one of them
    /// is never renamed as a whole
    pub fn with_deletes(mut self, deletes: &[DeleteChange]) -> Self {
        self.deleted_paths = deletes.iter().map(|delete| delete.path.clone()).collect();
        self
    }

    /// Run the detection
    ///
    /// Any tree lookup failure aborts the whole computation.
    pub fn compute(mut self) -> Result<FolderRenameResult, CheckinError> {
        let renames = std::mem::take(&mut self.sorted_file_renames);

        for rename in &renames {
            let old_parent = get_parent(&rename.old_path);
            let new_parent = get_parent(&rename.new_path);

            if old_parent == new_parent || is_ancestor(new_parent, old_parent) {
                // Sibling rename, or a move up and out of the old folder
                self.ensure_rename_accounted_for(rename);
                continue;
            }

            self.process_rename_level(old_parent, new_parent)?;
            self.ensure_rename_accounted_for(rename);
        }

        debug!(
            "collapsed {} file renames into {} renames",
            renames.len(),
            self.result_renames.len()
        );

        Ok(FolderRenameResult::from_renames(self.result_renames))
    }

    /// Reconcile one folder level of a move, parents first
    fn process_rename_level(&mut self, old_folder: &str, new_folder: &str) -> Result<(), CheckinError> {
        if old_folder.is_empty() || new_folder.is_empty() {
            return Ok(());
        }

        let depth = get_folder_depth(new_folder);
        let rewritten = rewrite_with_processed(&self.processed, old_folder, depth);
        if rewritten == new_folder || is_ancestor(new_folder, &rewritten) {
            return Ok(());
        }

        self.process_rename_level(get_parent(old_folder), get_parent(new_folder))?;

        if self.processed.contains_key(old_folder) {
            return Ok(());
        }

        // The parent level may have just moved this folder into place
        let rewritten = rewrite_with_processed(&self.processed, old_folder, depth);
        if rewritten == new_folder {
            return Ok(());
        }

        if self.can_collapse(old_folder, &rewritten, new_folder)? {
            debug!("folder rename {} -> {}", rewritten, new_folder);
            self.add_rename_to_result(old_folder, RenameChange::pure(rewritten, new_folder));
        }

        Ok(())
    }

    /// A folder rename is only legal if the destination did not exist before
    /// and nothing is left at the source afterwards.
    ///
    /// `original` is the folder's path in the source tree and `rewritten` the
    /// path the server knows it by when the rename's batch runs.
    fn can_collapse(&self, original: &str, rewritten: &str, new_folder: &str) -> Result<bool, CheckinError> {
        if self.repo.path_exists(&self.source_tree, new_folder)? {
            debug!("not collapsing into {}: it already exists in the source tree", new_folder);
            return Ok(false);
        }
        if self.repo.path_exists(&self.target_tree, rewritten)? {
            debug!("not collapsing {}: it still exists in the target tree", rewritten);
            return Ok(false);
        }

        // Deeper batches still carry the folder on; it must be gone once
        // every processed rename has run
        let settled = rewrite_with_processed(&self.processed, original, usize::MAX);
        if settled != rewritten && self.repo.path_exists(&self.target_tree, &settled)? {
            debug!("not collapsing {}: it ends up at {} in the target tree", rewritten, settled);
            return Ok(false);
        }

        if let Some(claimed) = self.processed.values().find(|dest| is_ancestor(new_folder, dest)) {
            debug!("not collapsing into {}: {} was already moved there", new_folder, claimed);
            return Ok(false);
        }

        if let Some(deleted) = self.deleted_paths.iter().find(|path| is_ancestor(original, path)) {
            debug!("not collapsing {}: {} is deleted from it", original, deleted);
            return Ok(false);
        }

        Ok(true)
    }

    /// Emit whatever of `rename` no folder rename already covers
    fn ensure_rename_accounted_for(&mut self, rename: &RenameChange) {
        let depth = get_folder_depth(&rename.new_path);
        let rewritten = rewrite_with_processed(&self.processed, &rename.old_path, depth);

        if rewritten != rename.new_path || rename.is_edit {
            self.add_rename_to_result(
                &rename.old_path,
                RenameChange::new(rewritten, rename.new_path.clone(), rename.id, rename.is_edit),
            );
        }
    }

    /// Append `change`, or merge its edit into the entry already emitted for
    /// `original_old_path`
    fn add_rename_to_result(&mut self, original_old_path: &str, change: RenameChange) {
        if let Some(&idx) = self.result_index.get(original_old_path) {
            let merged = self.result_renames[idx].with_edit_information(change.id, change.is_edit);
            self.result_renames[idx] = merged;
            return;
        }

        self.processed
            .insert(original_old_path.to_string(), change.new_path.clone());
        self.result_index
            .insert(original_old_path.to_string(), self.result_renames.len());
        self.result_renames.push(change);
    }
}

/// Longest processed prefix of `path` (the path itself included) whose
/// destination is at most `max_depth` deep
pub fn longest_processed_prefix<'p>(
    processed: &'p BTreeMap<String, String>,
    path: &str,
    max_depth: usize,
) -> Option<(&'p str, &'p str)> {
    std::iter::once(path)
        .chain(ancestors(path))
        .filter_map(|candidate| processed.get_key_value(candidate))
        .find(|(_, new_path)| get_folder_depth(new_path) <= max_depth)
        .map(|(old, new)| (old.as_str(), new.as_str()))
}

/// Where `path` lives once every processed rename with a destination at most
/// `max_depth` deep has been applied
pub fn rewrite_with_processed(processed: &BTreeMap<String, String>, path: &str, max_depth: usize) -> String {
    match longest_processed_prefix(processed, path, max_depth) {
        Some((old_prefix, new_prefix)) => {
            let rest = make_relative(old_prefix, path).unwrap_or_default();
            combine(new_prefix, rest)
        }
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::get_file_name;
    use gtf_core::{hash_blob, Entry, Store, Tree};
    use std::collections::BTreeSet;

    fn write_tree(store: &Store, paths: &[&str]) -> ObjectId {
        let mut tree = Tree::new();
        for path in paths {
            let id = store.write_blob(get_file_name(path).as_bytes()).unwrap();
            tree.insert(path, Entry::file(0o100644, id));
        }
        store.write_tree(&tree).unwrap()
    }

    fn detect(store: &Store, source: &[&str], target: &[&str], renames: &[RenameChange]) -> FolderRenameResult {
        detect_with_deletes(store, source, target, renames, &[])
    }

    fn detect_with_deletes(
        store: &Store,
        source: &[&str],
        target: &[&str],
        renames: &[RenameChange],
        deletes: &[DeleteChange],
    ) -> FolderRenameResult {
        let from = write_tree(store, source);
        let to = write_tree(store, target);
        FolderRenameDetector::new(store, from, to, renames)
            .with_deletes(deletes)
            .compute()
            .unwrap()
    }

    /// Replays the batches over the source paths the way the server would
    fn replay(source: &[&str], result: &FolderRenameResult) -> BTreeSet<String> {
        let mut paths: BTreeSet<String> = source.iter().map(|p| p.to_string()).collect();
        for rename in result.batches().iter().flatten() {
            let moved: Vec<String> = paths
                .iter()
                .filter(|p| is_ancestor(&rename.old_path, p))
                .cloned()
                .collect();
            assert!(!moved.is_empty(), "{} is not on the server", rename.old_path);
            for path in moved {
                paths.remove(&path);
                let rest = make_relative(&rename.old_path, &path).unwrap_or_default();
                assert!(paths.insert(combine(&rename.new_path, rest)));
            }
        }
        paths
    }

    fn path_set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    const DEEP: &str = "root/parent/child/grandChild/greatGrandChild";
    const DEEP_RENAMED: &str = "root/parent/child/grandChild/greatGrandChild-rename";

    #[test]
    fn test_whole_folder_collapses_to_one_rename() {
        let store = Store::in_memory();
        let names = ["file1.txt", "file2.txt", "file3.txt"];
        let source: Vec<String> = names.iter().map(|n| format!("{}/{}", DEEP, n)).collect();
        let target: Vec<String> = names.iter().map(|n| format!("{}/{}", DEEP_RENAMED, n)).collect();
        let renames: Vec<_> = source
            .iter()
            .zip(&target)
            .map(|(old, new)| RenameChange::pure(old.as_str(), new.as_str()))
            .collect();

        let source: Vec<&str> = source.iter().map(String::as_str).collect();
        let target: Vec<&str> = target.iter().map(String::as_str).collect();
        let result = detect(&store, &source, &target, &renames);

        assert_eq!(result.len(), 1);
        assert_eq!(result.renames()[0], RenameChange::pure(DEEP, DEEP_RENAMED));
        assert_eq!(result.batches()[5], vec![RenameChange::pure(DEEP, DEEP_RENAMED)]);
    }

    #[test]
    fn test_no_collapse_when_old_folder_survives_in_target() {
        let store = Store::in_memory();
        let renames = vec![RenameChange::pure("root/a/one.txt", "root/b/one.txt")];

        let result = detect(
            &store,
            &["root/a/one.txt", "root/a/two.txt"],
            &["root/b/one.txt", "root/a/two.txt"],
            &renames,
        );

        assert_eq!(result.renames(), renames.as_slice());
    }

    #[test]
    fn test_no_collapse_when_new_folder_exists_in_source() {
        let store = Store::in_memory();
        let renames = vec![RenameChange::pure("root/a/one.txt", "root/b/one.txt")];

        let result = detect(
            &store,
            &["root/a/one.txt", "root/b/existing.txt"],
            &["root/b/one.txt", "root/b/existing.txt"],
            &renames,
        );

        assert_eq!(result.renames(), renames.as_slice());
    }

    #[test]
    fn test_edit_inside_collapsed_folder_is_kept() {
        let store = Store::in_memory();
        let edited = hash_blob(b"new content");
        let renames = vec![
            RenameChange::new("root/a/one.txt", "root/b/one.txt", edited, true),
            RenameChange::pure("root/a/two.txt", "root/b/two.txt"),
        ];

        let result = detect(
            &store,
            &["root/a/one.txt", "root/a/two.txt"],
            &["root/b/one.txt", "root/b/two.txt"],
            &renames,
        );

        assert_eq!(
            result.renames(),
            &[
                RenameChange::pure("root/a", "root/b"),
                RenameChange::new("root/b/one.txt", "root/b/one.txt", edited, true),
            ]
        );
        assert!(result.renames()[1].is_edit_only());
    }

    #[test]
    fn test_nested_renames_batched_parent_first() {
        let store = Store::in_memory();
        let renames = vec![
            RenameChange::pure("root/a/b/one.txt", "root/x/y/one.txt"),
            RenameChange::pure("root/a/top.txt", "root/x/top.txt"),
        ];

        let result = detect(
            &store,
            &["root/a/b/one.txt", "root/a/top.txt", "root/keep.txt"],
            &["root/x/y/one.txt", "root/x/top.txt", "root/keep.txt"],
            &renames,
        );

        assert_eq!(
            result.renames(),
            &[
                RenameChange::pure("root/a", "root/x"),
                RenameChange::pure("root/x/b", "root/x/y"),
            ]
        );
        assert_eq!(result.batches()[2], vec![RenameChange::pure("root/a", "root/x")]);
        assert_eq!(result.batches()[3], vec![RenameChange::pure("root/x/b", "root/x/y")]);
    }

    #[test]
    fn test_file_moved_up_is_not_collapsed() {
        let store = Store::in_memory();
        let renames = vec![RenameChange::pure("root/a/b/one.txt", "root/one.txt")];

        let result = detect(
            &store,
            &["root/a/b/one.txt", "root/a/b/two.txt"],
            &["root/one.txt", "root/a/b/two.txt"],
            &renames,
        );

        assert_eq!(result.renames(), renames.as_slice());
        assert_eq!(result.batches()[2], renames);
    }

    #[test]
    fn test_move_out_of_collapsed_folder_keeps_server_order() {
        // root/a moves deep (batch 4) while one file leaves it for a shallow
        // destination (batch 2): the file must be moved from its old place.
        let store = Store::in_memory();
        let renames = vec![
            RenameChange::pure("root/a/keep1.txt", "root/p/q/r/keep1.txt"),
            RenameChange::pure("root/a/keep2.txt", "root/p/q/r/keep2.txt"),
            RenameChange::pure("root/a/zed.txt", "root/p/zed.txt"),
        ];

        let result = detect(
            &store,
            &["root/a/keep1.txt", "root/a/keep2.txt", "root/a/zed.txt"],
            &["root/p/q/r/keep1.txt", "root/p/q/r/keep2.txt", "root/p/zed.txt"],
            &renames,
        );

        assert!(result.renames().contains(&RenameChange::pure("root/a/zed.txt", "root/p/zed.txt")));
        assert!(result.renames().contains(&RenameChange::pure("root/a", "root/p/q/r")));
    }

    #[test]
    fn test_batches_hold_their_depth_only() {
        let store = Store::in_memory();
        let renames = vec![
            RenameChange::pure("a/one.txt", "a/uno.txt"),
            RenameChange::pure("b/c/two.txt", "d/e/two.txt"),
            RenameChange::pure("f/g/h/three.txt", "f/g/i/three.txt"),
        ];

        let result = detect(
            &store,
            &["a/one.txt", "b/c/two.txt", "f/g/h/three.txt"],
            &["a/uno.txt", "d/e/two.txt", "f/g/i/three.txt"],
            &renames,
        );

        for (depth, batch) in result.batches().iter().enumerate() {
            for rename in batch {
                assert_eq!(get_folder_depth(&rename.new_path), depth);
            }
        }
        let total: usize = result.batches().iter().map(Vec::len).sum();
        assert_eq!(total, result.len());
    }

    #[test]
    fn test_same_name_folder_under_surviving_parent_collapses() {
        let store = Store::in_memory();
        let renames = vec![
            RenameChange::pure("root/a/x/f.txt", "root/b/x/f.txt"),
            RenameChange::pure("root/a/x/g.txt", "root/b/x/g.txt"),
        ];

        let result = detect(
            &store,
            &["root/a/x/f.txt", "root/a/x/g.txt", "root/a/keep.txt"],
            &["root/b/x/f.txt", "root/b/x/g.txt", "root/a/keep.txt"],
            &renames,
        );

        // root/a stays, so only the leaf moves, even though its name is unchanged
        assert_eq!(result.renames(), &[RenameChange::pure("root/a/x", "root/b/x")]);
        assert_eq!(result.batches()[3], vec![RenameChange::pure("root/a/x", "root/b/x")]);
    }

    #[test]
    fn test_no_collapse_when_folder_lands_deeper_later() {
        // root/c moves to root/n0/n1 in batch 3, taking root/c/a along. Moving
        // root/c/a to root/m0 in batch 2 would drag f0.txt to the wrong place.
        let store = Store::in_memory();
        let source = ["root/c/a/f0.txt", "root/c/a/f1.txt"];
        let target = ["root/n0/n1/a/f0.txt", "root/m0/moved1.txt"];
        let renames = vec![
            RenameChange::pure("root/c/a/f0.txt", "root/n0/n1/a/f0.txt"),
            RenameChange::pure("root/c/a/f1.txt", "root/m0/moved1.txt"),
        ];

        let result = detect(&store, &source, &target, &renames);

        assert!(result.renames().iter().all(|r| r.new_path != "root/m0"));
        assert_eq!(
            result.batches()[2],
            vec![RenameChange::pure("root/c/a/f1.txt", "root/m0/moved1.txt")]
        );
        assert_eq!(result.batches()[3], vec![RenameChange::pure("root/c", "root/n0/n1")]);
        assert_eq!(replay(&source, &result), path_set(&target));
    }

    #[test]
    fn test_no_collapse_into_already_claimed_folder() {
        let store = Store::in_memory();
        let source = ["root/a/b/a/f0.txt", "root/a/b/a/f1.txt"];
        let target = ["root/n0/a/f0.txt", "root/n0/a/m0/moved1.txt"];
        let renames = vec![
            RenameChange::pure("root/a/b/a/f0.txt", "root/n0/a/f0.txt"),
            RenameChange::pure("root/a/b/a/f1.txt", "root/n0/a/m0/moved1.txt"),
        ];

        let result = detect(&store, &source, &target, &renames);

        assert_eq!(
            result.renames(),
            &[
                RenameChange::pure("root/a/b", "root/n0"),
                RenameChange::pure("root/n0/a/f1.txt", "root/n0/a/m0/moved1.txt"),
            ]
        );
        assert_eq!(replay(&source, &result), path_set(&target));
    }

    #[test]
    fn test_two_folders_merged_into_one_keep_file_renames() {
        let store = Store::in_memory();
        let source = ["root/a/one.txt", "root/q/two.txt"];
        let target = ["root/z/one.txt", "root/z/two.txt"];
        let renames = vec![
            RenameChange::pure("root/a/one.txt", "root/z/one.txt"),
            RenameChange::pure("root/q/two.txt", "root/z/two.txt"),
        ];

        let result = detect(&store, &source, &target, &renames);

        assert_eq!(
            result.renames(),
            &[
                RenameChange::pure("root/a", "root/z"),
                RenameChange::pure("root/q/two.txt", "root/z/two.txt"),
            ]
        );
        assert_eq!(replay(&source, &result), path_set(&target));
    }

    #[test]
    fn test_no_collapse_over_deleted_file() {
        let store = Store::in_memory();
        let renames = vec![RenameChange::pure("root/a/one.txt", "root/b/one.txt")];
        let deletes = vec![DeleteChange::file("root/a/del.txt"), DeleteChange::folder("root/a")];

        let result = detect_with_deletes(
            &store,
            &["root/keep.txt", "root/a/one.txt", "root/a/del.txt"],
            &["root/keep.txt", "root/b/one.txt"],
            &renames,
            &deletes,
        );

        assert_eq!(result.renames(), renames.as_slice());
    }

    #[test]
    fn test_missing_tree_aborts() {
        let store = Store::in_memory();
        let known = write_tree(&store, &["root/b/one.txt"]);
        let renames = vec![RenameChange::pure("root/a/one.txt", "root/b/one.txt")];

        let result = FolderRenameDetector::new(&store, hash_blob(b"gone"), known, &renames).compute();
        assert!(matches!(result, Err(CheckinError::Object(_))));
    }

    #[test]
    fn test_rewrite_with_processed() {
        let mut processed = BTreeMap::new();
        processed.insert("root/a".to_string(), "root/x".to_string());
        processed.insert("root/a/b".to_string(), "root/x/y".to_string());
        processed.insert("deep".to_string(), "p/q/r".to_string());

        assert_eq!(rewrite_with_processed(&processed, "root/a/b/f.txt", 4), "root/x/y/f.txt");
        assert_eq!(rewrite_with_processed(&processed, "root/a/c/f.txt", 4), "root/x/c/f.txt");
        assert_eq!(rewrite_with_processed(&processed, "root/a", 2), "root/x");
        assert_eq!(rewrite_with_processed(&processed, "root/ab", 4), "root/ab");
        assert_eq!(rewrite_with_processed(&processed, "deep/f.txt", 4), "p/q/r/f.txt");
        assert_eq!(rewrite_with_processed(&processed, "deep/f.txt", 2), "deep/f.txt");
    }
}

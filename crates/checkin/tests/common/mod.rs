//! Common utilities for checkin integration tests

#![allow(dead_code)]

use gtf_checkin::{CheckinConfig, CheckinError, CheckinPlan, PendSpec, RenameMode, Workspace};
use gtf_core::{Entry, ObjectId, Store, Tree};

/// Builds trees in an in-memory store from `(path, content)` pairs
pub struct Fixture {
    pub store: Store,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Store::in_memory(),
        }
    }

    pub fn tree(&self, files: &[(&str, &str)]) -> ObjectId {
        let mut tree = Tree::new();
        for (path, content) in files {
            let id = self.store.write_blob(content.as_bytes()).unwrap();
            tree.insert(path, Entry::file(0o100644, id));
        }
        self.store.write_tree(&tree).unwrap()
    }

    /// Tree where every file's content is its own path
    pub fn tree_of(&self, paths: &[&str]) -> ObjectId {
        let files: Vec<(&str, &str)> = paths.iter().map(|p| (*p, *p)).collect();
        self.tree(&files)
    }

    pub fn blob(&self, content: &str) -> ObjectId {
        self.store.write_blob(content.as_bytes()).unwrap()
    }

    pub fn plan(&self, from: Option<&ObjectId>, to: &ObjectId) -> CheckinPlan {
        self.plan_with(RenameMode::All, from, to)
    }

    pub fn plan_with(&self, mode: RenameMode, from: Option<&ObjectId>, to: &ObjectId) -> CheckinPlan {
        let config = CheckinConfig {
            rename_mode: mode,
            ..CheckinConfig::default()
        };
        CheckinPlan::build(&self.store, &config, from, to).unwrap()
    }
}

/// Workspace that accepts everything and remembers the calls
#[derive(Default)]
pub struct RecordingWorkspace {
    pub calls: Vec<(&'static str, Vec<PendSpec>)>,
    pub undone: bool,
}

impl RecordingWorkspace {
    pub fn operations(&self) -> Vec<&'static str> {
        self.calls.iter().map(|(op, _)| *op).collect()
    }

    fn record(&mut self, op: &'static str, items: &[PendSpec]) -> Result<usize, CheckinError> {
        self.calls.push((op, items.to_vec()));
        Ok(items.len())
    }
}

impl Workspace for RecordingWorkspace {
    fn pend_edit(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        self.record("edit", items)
    }

    fn pend_add(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        self.record("add", items)
    }

    fn pend_rename(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        self.record("rename", items)
    }

    fn pend_delete(&mut self, items: &[PendSpec]) -> Result<usize, CheckinError> {
        self.record("delete", items)
    }

    fn undo_all(&mut self) -> Result<(), CheckinError> {
        self.undone = true;
        Ok(())
    }
}

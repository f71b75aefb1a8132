//! Shared formatting for plan output

use gtf_checkin::{CheckinConfig, CheckinPlan, ItemKind, RenameChange};
use serde_json::{json, Value};

/// `$/old -> $/new`, flagged when the rename also carries an edit
pub fn describe_rename(rename: &RenameChange, config: &CheckinConfig) -> String {
    let new_path = config.server_path_for(&rename.new_path);
    let mut text = if rename.is_edit_only() {
        new_path
    } else {
        format!("{} -> {}", config.server_path_for(&rename.old_path), new_path)
    };
    if rename.is_edit {
        text.push_str(" (edited)");
    }
    text
}

pub fn kind_suffix(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::File => "",
        ItemKind::Folder => "(folder)",
    }
}

/// Machine-readable form of a plan
pub fn plan_json(plan: &CheckinPlan) -> Value {
    let analysis = plan.analysis();
    json!({
        "source": plan.source().map(|id| id.to_hex()),
        "target": plan.target().to_hex(),
        "adds": analysis.adds(),
        "edits": analysis.edits(),
        "deletes": analysis.deletes(),
        "file_renames": analysis.renames(),
        "rename_batches": plan.renames().batches(),
        "size": plan.size(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtf_core::hash_blob;

    #[test]
    fn test_describe_rename() {
        let config = CheckinConfig::default();

        let pure = RenameChange::pure("a/old", "a/new");
        assert_eq!(describe_rename(&pure, &config), "$/a/old -> $/a/new");

        let edit_only = RenameChange::new("a/f.txt", "a/f.txt", hash_blob(b"x"), true);
        assert_eq!(describe_rename(&edit_only, &config), "$/a/f.txt (edited)");
    }

    #[test]
    fn test_kind_suffix() {
        assert_eq!(kind_suffix(ItemKind::Folder), "(folder)");
        assert!(kind_suffix(ItemKind::File).is_empty());
    }
}

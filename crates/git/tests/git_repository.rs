//! GitRepository against real throwaway repositories

use git2::Signature;
use gtf_checkin::{CheckinConfig, CheckinPlan, RenameChange};
use gtf_core::{EntryKind, ObjectError, Repository};
use gtf_git::GitRepository;
use std::path::Path;

/// Replace the work tree with `files` and commit everything
fn commit_files(repo: &git2::Repository, files: &[(&str, &str)], message: &str) -> git2::Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    for entry in std::fs::read_dir(&workdir).unwrap() {
        let path = entry.unwrap().path();
        if path.file_name().unwrap() == ".git" {
            continue;
        }
        if path.is_dir() {
            std::fs::remove_dir_all(&path).unwrap();
        } else {
            std::fs::remove_file(&path).unwrap();
        }
    }
    for (path, content) in files {
        let full = workdir.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, content).unwrap();
    }

    let mut index = repo.index().unwrap();
    index.clear().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::now("Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

fn init(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap()
}

#[test]
fn test_read_tree_flattens_commit() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = init(temp_dir.path());
    commit_files(&repo, &[("README.md", "hi\n"), ("src/lib/mod.rs", "mod a;\n")], "first");

    let git = GitRepository::discover(temp_dir.path()).unwrap();
    let head = git.resolve_tree("HEAD").unwrap();
    let tree = git.read_tree(&head).unwrap();

    assert_eq!(tree.len(), 2);
    let entry = tree.get("src/lib/mod.rs").unwrap();
    assert_eq!(entry.kind, EntryKind::File);
    assert_eq!(git.read_blob(&entry.id).unwrap(), b"mod a;\n");
    assert!(git.path_exists(&head, "src/lib").unwrap());
    assert!(!git.path_exists(&head, "src/li").unwrap());
}

#[test]
fn test_commit_id_peels_to_tree() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = init(temp_dir.path());
    let commit = commit_files(&repo, &[("a.txt", "a")], "first");

    let git = GitRepository::discover(temp_dir.path()).unwrap();
    let commit_id = gtf_core::ObjectId::from_slice(commit.as_bytes()).unwrap();

    let via_commit = git.read_tree(&commit_id).unwrap();
    let via_rev = git.read_tree(&git.resolve_tree("HEAD").unwrap()).unwrap();
    assert_eq!(via_commit.hash().unwrap(), via_rev.hash().unwrap());
}

#[test]
fn test_unknown_objects() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = init(temp_dir.path());
    commit_files(&repo, &[("a.txt", "a")], "first");

    let git = GitRepository::discover(temp_dir.path()).unwrap();
    let missing = gtf_core::hash_blob(b"never committed");

    assert!(matches!(git.read_tree(&missing), Err(ObjectError::Missing(_))));
    assert!(matches!(git.read_blob(&missing), Err(ObjectError::Missing(_))));
    assert!(git.resolve_tree("no-such-branch").is_err());
}

#[test]
fn test_plan_between_commits() {
    let temp_dir = tempfile::tempdir().unwrap();
    let repo = init(temp_dir.path());
    commit_files(
        &repo,
        &[("keep.txt", "k"), ("old/one.txt", "one"), ("old/two.txt", "two")],
        "first",
    );
    commit_files(
        &repo,
        &[("keep.txt", "k"), ("new/one.txt", "one"), ("new/two.txt", "two")],
        "second",
    );

    let git = GitRepository::discover(temp_dir.path()).unwrap();
    let from = git.resolve_tree("HEAD~1").unwrap();
    let to = git.resolve_tree("HEAD").unwrap();

    let plan = CheckinPlan::build(&git, &CheckinConfig::default(), Some(&from), &to).unwrap();
    assert_eq!(plan.renames().renames(), &[RenameChange::pure("old", "new")]);
    assert_eq!(plan.size(), 1);
}

//! Shared fixtures for integration tests: building real repositories and
//! workspaces on disk with libgit2, no network involved.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, Signature};
use tempfile::TempDir;

/// Initialize a repository at `path` with one commit on a `main` branch.
pub fn init_repo(path: &Path) -> Repository {
    fs::create_dir_all(path).unwrap();
    let repo = Repository::init(path).unwrap();
    commit_file(&repo, "README.md", "hello", "initial commit");
    let head_oid = repo.head().unwrap().target().unwrap();
    {
        let commit = repo.find_commit(head_oid).unwrap();
        repo.branch("main", &commit, true).unwrap();
    }
    repo.set_head("refs/heads/main").unwrap();
    repo
}

/// Write `name` with `content` into the repository's working tree and commit
/// it.
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), content).unwrap();

    let signature = Signature::now("Test", "test@example.com").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let parent = match repo.head() {
        Ok(head) => Some(repo.find_commit(head.target().unwrap()).unwrap()),
        Err(_) => None,
    };
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap();
}

/// Create a workspace directory containing one initialized repository per
/// name.
pub fn workspace_with(names: &[&str]) -> (TempDir, Vec<PathBuf>) {
    let temp_dir = TempDir::new().unwrap();
    let mut paths = Vec::new();
    for name in names {
        let path = temp_dir.path().join(name);
        init_repo(&path);
        paths.push(path);
    }
    (temp_dir, paths)
}

/// Leave an uncommitted file in the repository's working tree.
pub fn make_dirty(repo_path: &Path) {
    fs::write(repo_path.join("wip.txt"), "uncommitted").unwrap();
}

//! Git repository fixtures built with `git2` only, so tests do not depend
//! on a `git` binary or on the user's git configuration.

use std::fs;
use std::path::Path;

use git2::{Repository, Signature};

/// Initialises a repository with a test identity configured.
///
/// # Panics
/// Panics if the repository cannot be created.
pub fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path)
        .unwrap_or_else(|e| panic!("init_repo: failed at {}: {e}", path.display()));
    {
        let mut config = repo.config().expect("init_repo: no config");
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@test.com").unwrap();
    }
    repo
}

/// Initialises a bare repository to act as a remote.
///
/// # Panics
/// Panics if the repository cannot be created.
pub fn bare_repo(path: &Path) -> Repository {
    Repository::init_bare(path)
        .unwrap_or_else(|e| panic!("bare_repo: failed at {}: {e}", path.display()))
}

/// Writes `content` to `rel` inside the working tree, stages it and commits.
///
/// Returns the new commit hash.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_file(repo: &Repository, rel: &str, content: &str, message: &str) -> String {
    let workdir = repo.workdir().expect("commit_file: bare repository");
    let full = workdir.join(rel);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&full, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(rel)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test User", "test@test.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
        .to_string()
}

/// Creates a lightweight tag at HEAD.
///
/// # Panics
/// Panics if HEAD is unborn or the tag already exists.
pub fn tag_head(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.tag_lightweight(name, head.as_object(), false).unwrap();
}

/// Current HEAD hash.
///
/// # Panics
/// Panics if HEAD is unborn.
pub fn head_hash(repo: &Repository) -> String {
    repo.head().unwrap().peel_to_commit().unwrap().id().to_string()
}

/// Pushes the current branch and all tags of `repo` to `remote`.
///
/// # Panics
/// Panics if the remote is missing or the push fails.
pub fn push_all(repo: &Repository, remote: &str) {
    let branch = repo.head().unwrap().shorthand().unwrap().to_string();
    let mut refspecs = vec![format!("refs/heads/{branch}:refs/heads/{branch}")];
    for tag in repo.tag_names(None).unwrap().iter().flatten() {
        refspecs.push(format!("refs/tags/{tag}:refs/tags/{tag}"));
    }
    repo.find_remote(remote)
        .unwrap()
        .push(&refspecs, None)
        .unwrap();
}

//! Opening, creating and cloning repositories.

use std::path::Path;

use crate::{GitRepo, Result, VersionedRepo, transport};

/// Produces repository handles.
///
/// The factory is shared with the background remote poll, so it must be
/// usable from another thread.
pub trait RepoFactory: Send + Sync {
    /// Open an existing repository.
    fn open(&self, path: &Path) -> Result<Box<dyn VersionedRepo>>;

    /// Create an empty repository, creating the directory if needed.
    fn init(&self, path: &Path) -> Result<Box<dyn VersionedRepo>>;

    /// Clone `url` into `path`.
    fn clone_repo(&self, url: &str, path: &Path) -> Result<Box<dyn VersionedRepo>>;

    /// Connect to `url` and list the names of its references.
    fn list_refs(&self, url: &str) -> Result<Vec<String>>;
}

/// [`RepoFactory`] producing [`GitRepo`] handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitFactory;

impl RepoFactory for GitFactory {
    fn open(&self, path: &Path) -> Result<Box<dyn VersionedRepo>> {
        Ok(Box::new(GitRepo::open(path)?))
    }

    fn init(&self, path: &Path) -> Result<Box<dyn VersionedRepo>> {
        Ok(Box::new(GitRepo::init(path)?))
    }

    fn clone_repo(&self, url: &str, path: &Path) -> Result<Box<dyn VersionedRepo>> {
        Ok(Box::new(GitRepo::clone_from(url, path)?))
    }

    fn list_refs(&self, url: &str) -> Result<Vec<String>> {
        transport::list_remote_refs(url)
    }
}

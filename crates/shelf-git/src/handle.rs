//! The capability interface the datashelf needs from a versioned repository.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::Result;

/// A tag together with the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    /// Tag name, e.g. `v2.0`
    pub name: String,

    /// Full hex hash of the tagged commit
    pub commit: String,

    /// Commit time of the tagged commit
    pub commit_time: DateTime<Utc>,
}

/// Operations the consistency manager performs on a single repository.
///
/// Hashes are opaque 40-character hex strings. Network operations never
/// retry; a failure is reported as [`crate::Error::Network`] and the caller
/// decides what to do.
pub trait VersionedRepo {
    /// Root of the working tree.
    fn workdir(&self) -> &Path;

    /// Hash of the current head commit, `None` for an empty repository.
    fn head_commit(&self) -> Result<Option<String>>;

    /// True when tracked files differ from head, in the index or the
    /// working tree. Untracked files do not count.
    fn is_dirty(&self) -> Result<bool>;

    /// All tags, sorted by commit time ascending.
    ///
    /// Tags on commits with equal timestamps are ordered by numeric version.
    fn tags(&self) -> Result<Vec<TagInfo>>;

    /// Create a lightweight tag at head.
    ///
    /// Re-creating a tag that already points at head is a no-op; a tag
    /// pointing anywhere else is never moved.
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Add files to the index. Paths may be absolute (inside the working
    /// tree) or relative to it.
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Remove files from both the index and the working tree.
    fn remove(&self, paths: &[PathBuf]) -> Result<()>;

    /// Commit the index and return the new head hash.
    fn commit(&self, message: &str) -> Result<String>;

    /// Check out a branch, tag or commit.
    fn checkout(&self, reference: &str) -> Result<()>;

    /// Name of the branch that `latest` resolves to.
    fn default_branch(&self) -> Result<String>;

    /// Name of the checked out branch, `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Push branch refs; with `with_tags` every local tag is pushed as well.
    fn push(&self, remote: &str, branches: &[String], with_tags: bool) -> Result<()>;

    /// Fetch the current branch and fast-forward to it.
    fn pull(&self, remote: &str) -> Result<()>;

    /// Fetch all configured refs and tags without touching the working tree.
    fn fetch(&self, remote: &str) -> Result<()>;

    fn has_remote(&self, name: &str) -> Result<bool>;

    fn add_remote(&self, name: &str, url: &str) -> Result<()>;

    /// Track `<remote>/<branch>` from the current branch.
    fn set_upstream(&self, remote: &str) -> Result<()>;

    /// Name of the tag pointing at head, if any.
    fn tag_at_head(&self) -> Result<Option<String>> {
        let Some(head) = self.head_commit()? else {
            return Ok(None);
        };
        Ok(self
            .tags()?
            .into_iter()
            .rev()
            .find(|t| t.commit == head)
            .map(|t| t.name))
    }
}

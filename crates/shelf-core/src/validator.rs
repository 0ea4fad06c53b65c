//! Hash invariant between the source index and the repositories.

use std::collections::BTreeSet;

use shelf_fs::MAIN_REPO_ID;
use shelf_git::VersionedRepo;

use crate::ledger::SourceIndex;
use crate::{Error, Result};

/// Tracks which repositories passed validation.
///
/// A repository is valid when its head equals the commit hash the index
/// records for it (the main repository is exempt from this check) and its
/// working tree has no uncommitted modifications. The result is cached
/// until [`invalidate`](Self::invalidate) is called for that id.
#[derive(Debug, Default)]
pub struct ConsistencyValidator {
    validated: BTreeSet<String>,
}

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `repo_id` and cache the success.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownSource`] if a source id is missing from the index
    /// - [`Error::InconsistentRepository`] on a hash mismatch
    /// - [`Error::DirtyRepository`] if the working tree is modified
    pub fn validate(
        &mut self,
        repo_id: &str,
        repo: &dyn VersionedRepo,
        index: &SourceIndex,
    ) -> Result<()> {
        if repo_id != MAIN_REPO_ID {
            let recorded = index
                .get(repo_id)
                .ok_or_else(|| Error::UnknownSource(repo_id.to_string()))?
                .commit_hash
                .clone();
            let actual = repo.head_commit()?;
            if recorded != actual {
                return Err(Error::InconsistentRepository {
                    source_id: repo_id.to_string(),
                    recorded,
                    actual,
                });
            }
        }

        if repo.is_dirty()? {
            return Err(Error::DirtyRepository {
                source_id: repo_id.to_string(),
            });
        }

        tracing::debug!(repo = %repo_id, "Repository is clean");
        self.validated.insert(repo_id.to_string());
        Ok(())
    }

    pub fn is_validated(&self, repo_id: &str) -> bool {
        self.validated.contains(repo_id)
    }

    /// Forget a cached validation.
    pub fn invalidate(&mut self, repo_id: &str) {
        self.validated.remove(repo_id);
    }
}

//! Per-repository bookkeeping between mutations and the next commit.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use shelf_fs::MAIN_REPO_ID;

/// Staged paths and touched repositories awaiting a commit cycle.
#[derive(Debug, Default)]
pub struct PendingChangeTracker {
    staged: BTreeMap<String, Vec<PathBuf>>,
    touched: BTreeSet<String>,
}

impl PendingChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `path` for staging in `repo_id` and mark the repository touched.
    pub fn add(&mut self, repo_id: &str, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let staged = self.staged.entry(repo_id.to_string()).or_default();
        if !staged.contains(&path) {
            staged.push(path);
        }
        self.touched.insert(repo_id.to_string());
    }

    /// Mark `repo_id` touched without queueing a path.
    pub fn mark_touched(&mut self, repo_id: &str) {
        self.touched.insert(repo_id.to_string());
    }

    pub fn pending(&self, repo_id: &str) -> &[PathBuf] {
        self.staged.get(repo_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_touched(&self, repo_id: &str) -> bool {
        self.touched.contains(repo_id)
    }

    /// Touched source repositories, the main repository excluded.
    pub fn touched_sources(&self) -> Vec<String> {
        self.touched
            .iter()
            .filter(|id| id.as_str() != MAIN_REPO_ID)
            .cloned()
            .collect()
    }

    /// Forget everything tracked for `repo_id` after it was committed.
    pub fn release(&mut self, repo_id: &str) {
        self.staged.remove(repo_id);
        self.touched.remove(repo_id);
    }

    pub fn clear_touched(&mut self) {
        self.touched.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty() && self.staged.values().all(Vec::is_empty)
    }
}

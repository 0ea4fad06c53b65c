//! [`TestShelf`] builder for datashelf test scenarios.

use std::path::{Path, PathBuf};

use git2::Repository;
use shelf_fs::table;
use shelf_fs::{REMOTE_LEDGER_FIELDS, ShelfLayout, scaffold_empty_datashelf};
use tempfile::TempDir;

use crate::git::{bare_repo, commit_file, init_repo, push_all};

/// A temporary directory holding a scaffolded datashelf plus a directory of
/// bare repositories that stand in for the remote server.
///
/// # Example
///
/// ```rust,no_run
/// use shelf_test_utils::shelf::TestShelf;
///
/// let shelf = TestShelf::new();
/// shelf.publish_source("demo", &[("meta.csv", "collected_by,me\n")]);
/// assert!(shelf.remote_base().ends_with('/'));
/// ```
pub struct TestShelf {
    temp_dir: TempDir,
    layout: ShelfLayout,
}

impl Default for TestShelf {
    fn default() -> Self {
        Self::new()
    }
}

impl TestShelf {
    /// Scaffold an empty datashelf with an initialised main repository.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let layout = scaffold_empty_datashelf(&temp_dir.path().join("shelf"), false).unwrap();
        init_repo(layout.root());
        std::fs::create_dir_all(temp_dir.path().join("server")).unwrap();
        Self { temp_dir, layout }
    }

    pub fn layout(&self) -> &ShelfLayout {
        &self.layout
    }

    /// Root of the datashelf (the main repository).
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// URL prefix of the fake server, ending in a separator so that
    /// `<base><id>.git` is a valid path.
    pub fn remote_base(&self) -> String {
        format!("{}/", self.server_dir().display())
    }

    pub fn server_dir(&self) -> PathBuf {
        self.temp_dir.path().join("server")
    }

    /// Scratch directory outside the datashelf.
    pub fn scratch(&self, name: &str) -> PathBuf {
        let dir = self.temp_dir.path().join("scratch").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Create `<server>/<id>.git` containing one commit with `files`.
    ///
    /// Returns the working repository used to author the commit, which has
    /// the bare repository configured as `origin`.
    pub fn publish_source(&self, id: &str, files: &[(&str, &str)]) -> Repository {
        let bare_path = self.server_dir().join(format!("{id}.git"));
        bare_repo(&bare_path);

        let work = init_repo(&self.scratch(id));
        for (rel, content) in files {
            commit_file(&work, rel, content, &format!("add {rel}"));
        }
        work.remote("origin", &bare_path.to_string_lossy()).unwrap();
        push_all(&work, "origin");
        work
    }

    /// Create `<server>/remote_sources.git` whose ledger holds `rows` of
    /// `(source_id, hash, tag, user)`.
    pub fn publish_remote_ledger(&self, rows: &[(&str, &str, &str, &str)]) -> Repository {
        let bare_path = self.server_dir().join("remote_sources.git");
        if !bare_path.exists() {
            bare_repo(&bare_path);
        }

        let work_dir = self.scratch("remote_sources");
        let work = match Repository::open(&work_dir) {
            Ok(repo) => repo,
            Err(_) => {
                let repo = init_repo(&work_dir);
                repo.remote("origin", &bare_path.to_string_lossy()).unwrap();
                repo
            }
        };

        let records: Vec<[&str; 4]> = rows.iter().map(|(a, b, c, d)| [*a, *b, *c, *d]).collect();
        let ledger = work_dir.join("source_states.csv");
        table::write_rows(&ledger, &REMOTE_LEDGER_FIELDS, &records).unwrap();
        let content = std::fs::read_to_string(&ledger).unwrap();
        commit_file(&work, "source_states.csv", &content, "update remote ledger");
        push_all(&work, "origin");
        work
    }
}

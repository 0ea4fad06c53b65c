//! Datashelf directory layout
//!
//! A datashelf root is the main ledger repository. It holds one repository
//! per source under `database/`, and optionally a clone of the remote ledger
//! under `remote_sources/`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{INVENTORY_FIELDS, SOURCE_META_FIELDS, ShelfPath};
use crate::table::{self, Table};
use crate::{Error, Result};

/// Path resolution for a datashelf rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfLayout {
    root: PathBuf,
}

impl ShelfLayout {
    /// Create a layout for the given datashelf root.
    ///
    /// The root is canonicalized when it exists so that paths compare equal
    /// to the ones reported by git.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sources_ledger(&self) -> PathBuf {
        self.root.join(ShelfPath::SourcesLedger)
    }

    pub fn inventory(&self) -> PathBuf {
        self.root.join(ShelfPath::Inventory)
    }

    pub fn database_dir(&self) -> PathBuf {
        self.root.join(ShelfPath::Database)
    }

    pub fn raw_data_dir(&self) -> PathBuf {
        self.root.join(ShelfPath::RawData)
    }

    /// Working directory of the repository for `source_id`.
    pub fn source_dir(&self, source_id: &str) -> PathBuf {
        self.database_dir().join(source_id)
    }

    pub fn source_meta(&self, source_id: &str) -> PathBuf {
        self.source_dir(source_id).join(ShelfPath::SourceMeta)
    }

    pub fn source_inventory(&self, source_id: &str) -> PathBuf {
        self.source_dir(source_id).join(ShelfPath::SourceInventory)
    }

    pub fn remote_sources_dir(&self) -> PathBuf {
        self.root.join(ShelfPath::RemoteSources)
    }

    pub fn remote_ledger(&self) -> PathBuf {
        self.remote_sources_dir().join(ShelfPath::RemoteLedger)
    }

    pub fn last_access_marker(&self) -> PathBuf {
        self.remote_sources_dir().join(ShelfPath::LastAccessMarker)
    }
}

/// Create the directory skeleton and empty tables of a new datashelf.
///
/// With `force_new` an existing directory at `path` is removed first.
/// Initialising the main repository is left to the caller.
pub fn scaffold_empty_datashelf(path: &Path, force_new: bool) -> Result<ShelfLayout> {
    if force_new && path.exists() {
        tracing::warn!(path = %path.display(), "Removing existing datashelf");
        fs::remove_dir_all(path).map_err(|e| Error::io(path, e))?;
    }
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;

    let layout = ShelfLayout::new(path);
    let database = layout.database_dir();
    if database.exists() {
        return Err(Error::ShelfExists {
            path: layout.root().to_path_buf(),
        });
    }

    fs::create_dir(&database).map_err(|e| Error::io(&database, e))?;
    let raw = layout.raw_data_dir();
    fs::create_dir_all(&raw).map_err(|e| Error::io(&raw, e))?;

    table::write_rows::<()>(&layout.sources_ledger(), &SOURCE_META_FIELDS, &[])?;

    let mut headers = vec![String::new()];
    headers.extend(INVENTORY_FIELDS.iter().map(|f| f.to_string()));
    table::write_table(
        &layout.inventory(),
        &Table {
            headers,
            rows: Vec::new(),
        },
    )?;

    tracing::info!(path = %layout.root().display(), "Created empty datashelf");
    Ok(layout)
}

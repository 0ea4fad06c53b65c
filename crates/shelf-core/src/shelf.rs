//! Creation of a new, empty datashelf.

use std::path::{Path, PathBuf};

use shelf_fs::{ShelfLayout, ShelfPath, scaffold_empty_datashelf};
use shelf_git::RepoFactory;

use crate::Result;

/// Scaffold a datashelf at `path` and make it the main repository.
///
/// The empty ledger and inventory are committed so that the main
/// repository starts with a head. With `force_new` an existing directory
/// at `path` is deleted first.
pub fn create_empty_datashelf(
    factory: &dyn RepoFactory,
    path: &Path,
    force_new: bool,
) -> Result<ShelfLayout> {
    let layout = scaffold_empty_datashelf(path, force_new)?;
    let repo = factory.init(layout.root())?;
    repo.stage(&[
        PathBuf::from(ShelfPath::SourcesLedger.as_str()),
        PathBuf::from(ShelfPath::Inventory.as_str()),
    ])?;
    let commit = repo.commit("Initialize datashelf")?;
    tracing::debug!(commit = %commit, "Initialized main repository");
    Ok(layout)
}

//! Filesystem layer for the datashelf
//!
//! Provides the on-disk layout of a datashelf, atomic locked writes, and the
//! CSV codecs used by the ledgers, metadata and inventory files.

pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod table;

pub use constants::{
    INVENTORY_FIELDS, MAIN_REPO_ID, REMOTE_LEDGER_FIELDS, SOURCE_META_FIELDS, SOURCE_SUB_FOLDERS,
    ShelfPath,
};
pub use error::{Error, Result};
pub use layout::{ShelfLayout, scaffold_empty_datashelf};

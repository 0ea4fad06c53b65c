//! Well-known file and directory names inside a datashelf.

use std::path::Path;

/// Identifier reserved for the main ledger repository.
pub const MAIN_REPO_ID: &str = "main";

/// Columns of the sources ledger, in file order. The first column is the index.
pub const SOURCE_META_FIELDS: [&str; 7] = [
    "SOURCE_ID",
    "collected_by",
    "date",
    "source_url",
    "licence",
    "git_commit_hash",
    "tag",
];

/// Columns of the remote ledger, in file order. The first column is the index.
pub const REMOTE_LEDGER_FIELDS: [&str; 4] = ["source_id", "hash", "tag", "user"];

/// Columns of an inventory table, excluding the leading index column.
pub const INVENTORY_FIELDS: [&str; 10] = [
    "variable",
    "entity",
    "category",
    "pathway",
    "scenario",
    "model",
    "source",
    "source_name",
    "source_year",
    "unit",
];

/// Folders scaffolded inside every new source repository.
pub const SOURCE_SUB_FOLDERS: [&str; 3] = ["raw_data", "tables", "docs"];

/// Standard datashelf filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfPath {
    /// Directory holding one repository per source
    Database,
    /// Directory for unprocessed downloads
    RawData,
    /// The sources ledger tracked in the main repository
    SourcesLedger,
    /// Combined inventory of all sources
    Inventory,
    /// Local clone of the remote ledger repository
    RemoteSources,
    /// Ledger file inside the remote sources repository
    RemoteLedger,
    /// Timestamp of the last remote poll, inside the remote sources directory
    LastAccessMarker,
    /// Per-source metadata dump
    SourceMeta,
    /// Per-source inventory
    SourceInventory,
    /// Placeholder that keeps an empty folder under version control
    GitKeep,
}

impl ShelfPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::RawData => "rawdata",
            Self::SourcesLedger => "sources.csv",
            Self::Inventory => "inventory.csv",
            Self::RemoteSources => "remote_sources",
            Self::RemoteLedger => "source_states.csv",
            Self::LastAccessMarker => "last_accessed_remote",
            Self::SourceMeta => "meta.csv",
            Self::SourceInventory => "source_inventory.csv",
            Self::GitKeep => ".gitkeep",
        }
    }
}

impl AsRef<Path> for ShelfPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ShelfPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ShelfPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

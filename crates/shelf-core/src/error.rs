//! Error types for shelf-core

use std::path::PathBuf;

/// Result type for shelf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shelf-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The recorded hash of a source disagrees with its repository head.
    ///
    /// The repository was changed outside the manager. Never auto-repaired.
    #[error(
        "Source '{source_id}' is inconsistent with the datashelf: ledger records {}, repository head is {}",
        .recorded.as_deref().unwrap_or("<none>"),
        .actual.as_deref().unwrap_or("<none>")
    )]
    InconsistentRepository {
        source_id: String,
        recorded: Option<String>,
        actual: Option<String>,
    },

    /// Uncommitted modifications were found while validating a repository
    #[error("Repository '{source_id}' has uncommitted modifications; commit or discard them first")]
    DirtyRepository { source_id: String },

    /// Checkout of a tag the repository does not have
    #[error("Tag '{tag}' does not exist in source '{source_id}'")]
    TagNotFound { source_id: String, tag: String },

    /// Both the SSH and the HTTPS clone attempt failed
    #[error(
        "Both SSH and HTTPS import of '{source_id}' failed (ssh: {ssh}; https: {https}). {hint}"
    )]
    SourceImportFailed {
        source_id: String,
        ssh: Box<shelf_git::Error>,
        https: Box<shelf_git::Error>,
        hint: String,
    },

    /// Source id is not in the ledger
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Source id is already in the ledger
    #[error("Source '{0}' already exists")]
    SourceExists(String),

    /// Source id cannot be used as a directory and repository name
    #[error("Invalid source id '{0}': use letters, digits, '_', '-' and '.'")]
    InvalidSourceId(String),

    /// The id of the main ledger repository cannot name a source
    #[error("'{0}' is reserved for the main repository")]
    ReservedSourceId(String),

    /// An operation needs remote URLs that are not configured
    #[error("Remote not configured: {0}")]
    RemoteNotConfigured(String),

    /// A mutating operation was attempted on a read-only datashelf
    #[error("Datashelf is read-only; '{operation}' is not allowed")]
    ReadOnly { operation: String },

    /// Per-source metadata does not follow the fixed schema
    #[error("Invalid source metadata in {path}: {message}")]
    MetaSchema { path: PathBuf, message: String },

    /// Configuration could not be loaded
    #[error("Invalid configuration at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The background poll thread panicked
    #[error("Background remote poll failed: {0}")]
    BackgroundPoll(String),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from shelf-fs
    #[error(transparent)]
    Fs(#[from] shelf_fs::Error),

    /// Versioning error from shelf-git
    #[error(transparent)]
    Git(#[from] shelf_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure came from the network transport.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Git(e) if e.is_network())
    }
}

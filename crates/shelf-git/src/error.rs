//! Error types for shelf-git

use std::path::PathBuf;

/// Result type for shelf-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shelf-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository unavailable at {location}: {message}")]
    RepositoryUnavailable { location: String, message: String },

    #[error("Network error during {operation}: {message}")]
    Network { operation: String, message: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Branch '{name}' not found")]
    BranchNotFound { name: String },

    #[error("HEAD is detached in {path}")]
    DetachedHead { path: PathBuf },

    #[error("Tag '{tag}' already exists and points to {commit}")]
    TagExists { tag: String, commit: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },

    #[error("Path {path} is outside the repository at {root}")]
    PathOutsideRepository { path: PathBuf, root: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn network(operation: &str, err: &git2::Error) -> Self {
        Self::Network {
            operation: operation.to_string(),
            message: err.message().to_string(),
        }
    }

    pub(crate) fn unavailable(location: impl std::fmt::Display, err: &git2::Error) -> Self {
        Self::RepositoryUnavailable {
            location: location.to_string(),
            message: err.message().to_string(),
        }
    }

    /// Whether this error came from the transport layer.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

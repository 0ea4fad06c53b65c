//! Error types for shelf-fs

use std::path::PathBuf;

/// Result type for shelf-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shelf-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV at {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    #[error("Failed to serialize CSV for {path}: {message}")]
    CsvSerialize { path: PathBuf, message: String },

    #[error("Unexpected columns in {path}: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Datashelf already exists at {path}")]
    ShelfExists { path: PathBuf },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv_parse(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        Self::CsvParse {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

use docreq_shared::IdError;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error, including busy/locked failures of the counter transaction.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A point write collided with an existing key.
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored id, status or role did not parse.
    #[error("Corrupt record: {0}")]
    Corrupt(#[from] IdError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

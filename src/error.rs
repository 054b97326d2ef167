use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the tag store and content identity.
///
/// `AssetNotFound` and `DuplicateAsset` are ordinary outcomes a caller is
/// expected to branch on; the rest indicate I/O or storage trouble.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("asset already tracked (hash {0}); use update instead")]
    DuplicateAsset(String),

    #[error("failed to read {path:?}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("invalid input: {0}")]
    ValidationError(String),

    #[error("content of {path:?} changed on disk (stored {stored}, found {actual})")]
    HashMismatch {
        path: PathBuf,
        stored: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

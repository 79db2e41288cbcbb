//! Error types for tabvault-extract.

use tabvault_store::StoreError;
use thiserror::Error;

/// Job-level failures. Any of these ends a job before or instead of iteration.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source object {bucket}/{key} could not be fetched: {source}")]
    SourceMissing {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("archive rejected: {0}")]
    CorruptArchive(#[source] tabvault_archive::Error),

    #[error("invalid trigger event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("object key '{0}' is not valid percent-encoded UTF-8")]
    InvalidKeyEncoding(String),
}

/// Failure confined to one archive entry. Recorded, never propagated.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("could not read entry: {0}")]
    ReadFailed(#[source] tabvault_archive::Error),

    #[error("could not write object: {0}")]
    WriteFailed(#[source] StoreError),

    #[error("archive stream broke off: {0}")]
    Truncated(#[source] tabvault_archive::Error),
}

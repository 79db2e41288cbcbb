use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported archive format")]
    UnsupportedFormat,

    #[error("archive is corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("failed to read entry '{name}': {source}")]
    EntryRead { name: String, source: io::Error },

    #[error("entry #{index} could not be opened: {reason}")]
    EntryOpen {
        index: usize,
        name: Option<String>,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn corrupted(reason: impl ToString) -> Self {
        Self::Corrupted {
            reason: reason.to_string(),
        }
    }

    /// Whether the error concerns the container as a whole rather than one entry.
    pub fn is_container_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat | Self::Corrupted { .. } | Self::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

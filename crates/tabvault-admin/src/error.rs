use tabvault_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authorization header is missing or not a bearer token")]
    MissingBearer,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("access denied: membership in group '{group}' required")]
    Forbidden { group: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid bucket name '{name}': {reason}")]
    InvalidBucketName { name: String, reason: &'static str },

    #[error("invalid object key: {0}")]
    InvalidObjectKey(&'static str),

    #[error("folder '{0}' not found")]
    FolderNotFound(String),

    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("could not sign upload policy: {0}")]
    Signing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    /// Whether the caller, rather than the backend, is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Signing(_) | Self::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

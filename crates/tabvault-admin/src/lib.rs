//! Administrative handlers around the extraction pipeline.
//!
//! - [`AccessGuard`] - admits callers by group membership in a bearer token
//! - [`CredentialIssuer`] - signed POST grants for browser uploads
//! - [`DeletionService`] - folder and key-list deletion in batches
//! - [`MetadataService`] - validated metadata merges

pub use credentials::{
    CredentialIssuer, DEFAULT_EXPIRES_IN, DEFAULT_MAX_UPLOAD_BYTES, UploadGrant, UploadPlan,
    UploadRequest,
};
pub use delete::{DeletionReport, DeletionService, DeletionStatus};
pub use error::{Error, Result};
pub use guard::{AccessGuard, Claims, DEFAULT_GROUP_CLAIM, bearer_token, decode_claims};
pub use metadata::{
    MetadataService, PatchRequest, PatchResult, validate_bucket_name, validate_object_key,
};
pub use sign::{PostConditions, SignedPost, SigningKeys};

mod credentials;
mod delete;
mod error;
mod guard;
mod metadata;
mod sign;

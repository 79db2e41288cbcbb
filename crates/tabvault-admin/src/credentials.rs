//! Upload grants.
//!
//! Archives land in the archive bucket under `uploads/` where the extractor
//! picks them up; any other file goes straight to its destination folder in
//! the extracted bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabvault_store::Metadata;
use tracing::info;

use crate::error::{Error, Result};
use crate::sign::{PostConditions, SigningKeys};

pub const DEFAULT_EXPIRES_IN: u32 = 3600;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 256 * 1024 * 1024;

const TARGET_FOLDER: &str = "target-folder";
const ORIGINAL_FILENAME: &str = "original-filename";
const UPLOAD_TIMESTAMP: &str = "upload-timestamp";
const META_PREFIX: &str = "x-amz-meta-";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub folder_prefix: String,
    #[serde(default)]
    pub folder_name: String,
    #[serde(default)]
    pub file_name: String,
    /// Any other fields; carried as metadata of the upload.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Where an upload goes and what it is tagged with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadPlan {
    pub bucket: String,
    pub key: String,
    pub target_folder: String,
    pub file_name: String,
    pub timestamp: String,
    pub metadata: Metadata,
}

/// A signed POST form. Every metadata entry whose name is usable as a
/// header is bound into the form as `x-amz-meta-*`, so it lands on the
/// uploaded object; other names only appear in `metadata`.
#[derive(Clone, Debug, Serialize)]
pub struct UploadGrant {
    pub url: String,
    pub fields: BTreeMap<String, String>,
    pub bucket: String,
    pub key: String,
    pub expires_in: u32,
    pub metadata: Metadata,
}

pub struct CredentialIssuer {
    archive_bucket: String,
    extracted_bucket: String,
    keys: SigningKeys,
    expires_in: u32,
    max_upload_bytes: u64,
}

impl CredentialIssuer {
    pub fn new(
        archive_bucket: impl Into<String>,
        extracted_bucket: impl Into<String>,
        keys: SigningKeys,
    ) -> Self {
        Self {
            archive_bucket: archive_bucket.into(),
            extracted_bucket: extracted_bucket.into(),
            keys,
            expires_in: DEFAULT_EXPIRES_IN,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn expires_in(mut self, seconds: u32) -> Self {
        self.expires_in = seconds;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn issue(&self, request: UploadRequest) -> Result<UploadGrant> {
        self.issue_at(request, Utc::now())
    }

    pub fn issue_at(&self, request: UploadRequest, now: DateTime<Utc>) -> Result<UploadGrant> {
        let plan = self.plan(request, now)?;

        let fields: BTreeMap<String, String> = plan
            .metadata
            .iter()
            .filter(|(name, _)| is_metadata_name(name))
            .map(|(name, value)| {
                let field = format!("{META_PREFIX}{}", name.to_ascii_lowercase());
                (field, value.clone())
            })
            .collect();
        let post = self.keys.sign_post(
            &PostConditions {
                bucket: &plan.bucket,
                key: &plan.key,
                fields: &fields,
                max_bytes: self.max_upload_bytes,
                expires_in: self.expires_in,
            },
            now,
        )?;

        info!(bucket = %plan.bucket, key = %plan.key, "issued upload grant");
        Ok(UploadGrant {
            url: post.url,
            fields: post.fields,
            bucket: plan.bucket,
            key: plan.key,
            expires_in: self.expires_in,
            metadata: plan.metadata,
        })
    }

    /// Destination and metadata for an upload, without signing anything.
    pub fn plan(&self, request: UploadRequest, now: DateTime<Utc>) -> Result<UploadPlan> {
        let folder_prefix = request.folder_prefix.trim();
        let folder_name = request.folder_name.trim();
        let file_name = request.file_name.trim();
        if folder_name.is_empty() || file_name.is_empty() {
            return Err(Error::invalid("folder_name and file_name are required"));
        }

        let target_folder = if folder_prefix.is_empty() {
            folder_name.to_owned()
        } else {
            format!("{folder_prefix}/{folder_name}")
        };
        let timestamp = now.format("%Y%m%d_%H%M%S").to_string();
        let (bucket, key) = if is_archive(file_name) {
            (&self.archive_bucket, format!("uploads/{timestamp}_{file_name}"))
        } else {
            (&self.extracted_bucket, format!("{target_folder}/{file_name}"))
        };

        let mut metadata: Metadata = request
            .extra
            .into_iter()
            .map(|(name, value)| (name, metadata_value(value)))
            .collect();
        metadata.insert("folder_prefix".into(), folder_prefix.to_owned());
        metadata.insert("folder_name".into(), folder_name.to_owned());
        metadata.insert("file_name".into(), file_name.to_owned());
        metadata.insert(TARGET_FOLDER.into(), target_folder.clone());
        metadata.insert(ORIGINAL_FILENAME.into(), file_name.to_owned());
        metadata.insert(UPLOAD_TIMESTAMP.into(), timestamp.clone());

        Ok(UploadPlan {
            bucket: bucket.clone(),
            key,
            target_folder,
            file_name: file_name.to_owned(),
            timestamp,
            metadata,
        })
    }
}

fn is_archive(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".zip")
}

fn is_metadata_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn metadata_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

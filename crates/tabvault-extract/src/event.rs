//! Trigger events and upload-time metadata.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tabvault_store::Metadata;

use crate::error::ExtractError;

pub const TARGET_FOLDER_KEY: &str = "target-folder";
pub const ORIGINAL_FILENAME_KEY: &str = "original-filename";
pub const UPLOAD_TIMESTAMP_KEY: &str = "upload-timestamp";

/// Location of one object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

/// Parse an object-created notification into the objects it references.
///
/// Keys arrive form-encoded (`+` for space, `%XX` escapes) and are decoded.
pub fn parse_event(raw: &[u8]) -> Result<Vec<ObjectRef>, ExtractError> {
    let notification: Notification = serde_json::from_slice(raw)?;
    notification
        .records
        .into_iter()
        .map(|record| {
            Ok(ObjectRef {
                bucket: record.s3.bucket.name,
                key: decode_key(&record.s3.object.key)?,
            })
        })
        .collect()
}

pub fn decode_key(raw: &str) -> Result<String, ExtractError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|_| ExtractError::InvalidKeyEncoding(raw.to_owned()))
}

/// What the uploader recorded on the archive object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadInfo {
    pub target_folder: String,
    pub original_filename: String,
}

impl UploadInfo {
    pub fn from_metadata(metadata: &Metadata, default_folder: &str, source_key: &str) -> Self {
        let pick = |key: &str, fallback: &str| {
            metadata
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .unwrap_or(fallback)
                .to_owned()
        };
        Self {
            target_folder: pick(TARGET_FOLDER_KEY, default_folder),
            original_filename: pick(ORIGINAL_FILENAME_KEY, source_key),
        }
    }
}

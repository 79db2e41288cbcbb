use std::net::Ipv4Addr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tabvault_store::{Metadata, ObjectMeta, ObjectStore};
use tracing::info;

use crate::error::{Error, Result};

static BUCKET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").unwrap());

const MAX_KEY_BYTES: usize = 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct PatchRequest {
    #[serde(alias = "bucket_name")]
    pub bucket: String,
    pub object_key: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatchResult {
    pub bucket: String,
    pub object_key: String,
    pub metadata: Metadata,
}

/// Merges new user metadata into an existing object.
pub struct MetadataService<S> {
    store: Arc<S>,
}

impl<S: ObjectStore> MetadataService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Overlay `request.metadata` on the object's current metadata and
    /// rewrite the object in place. The content type is kept.
    #[tracing::instrument(skip_all, fields(bucket = %request.bucket, key = %request.object_key))]
    pub async fn patch(&self, request: PatchRequest) -> Result<PatchResult> {
        let bucket = request.bucket.trim();
        let key = request.object_key.trim();
        validate_bucket_name(bucket)?;
        validate_object_key(key)?;

        let current = match self.store.head(bucket, key).await {
            Ok(info) => info.meta,
            Err(err) if err.is_not_found() => {
                return Err(Error::ObjectNotFound {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let mut metadata = current.metadata;
        metadata.extend(request.metadata);
        let meta = ObjectMeta {
            content_type: current.content_type,
            metadata: metadata.clone(),
        };
        self.store.copy(bucket, key, key, meta).await?;

        info!(fields = metadata.len(), "metadata updated");
        Ok(PatchResult {
            bucket: bucket.to_owned(),
            object_key: key.to_owned(),
            metadata,
        })
    }
}

pub fn validate_bucket_name(name: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidBucketName {
        name: name.to_owned(),
        reason,
    };
    if !(3..=63).contains(&name.len()) {
        return Err(invalid("must be 3 to 63 characters"));
    }
    if !BUCKET_NAME.is_match(name) {
        return Err(invalid(
            "only lowercase letters, digits, '.' and '-', starting and ending with a letter or digit",
        ));
    }
    if name.contains("..") {
        return Err(invalid("must not contain consecutive periods"));
    }
    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid("must not be formatted as an IP address"));
    }
    Ok(())
}

pub fn validate_object_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_BYTES {
        return Err(Error::InvalidObjectKey("must be 1 to 1024 bytes"));
    }
    if key.starts_with('/') {
        return Err(Error::InvalidObjectKey("must not start with '/'"));
    }
    if key.chars().any(char::is_control) {
        return Err(Error::InvalidObjectKey("must not contain control characters"));
    }
    if key.contains("..") || key.split('/').any(|segment| segment == ".") {
        return Err(Error::InvalidObjectKey("must not contain path traversal segments"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tabvault_store::MemoryStore;

    use super::*;

    #[test]
    fn bucket_names() {
        for ok in ["abc", "tabs-extracted", "my.bucket.1", &"a".repeat(63)] {
            assert!(validate_bucket_name(ok).is_ok(), "{ok}");
        }
        for bad in ["ab", "Tabs", "-abc", "abc-", "a..b", "a_b", "192.168.1.1", &"a".repeat(64)] {
            assert!(validate_bucket_name(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn object_keys() {
        for ok in ["a", "tabs/demo/readme.txt", "tabs/demo/.env", "a b/c"] {
            assert!(validate_object_key(ok).is_ok(), "{ok}");
        }
        let long = "k".repeat(1025);
        for bad in ["", "/abs", "a/../b", "a/./b", "./a", "tab\tkey", long.as_str()] {
            assert!(validate_object_key(bad).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn merges_and_keeps_content_type() {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            "extracted",
            "tabs/demo/a.txt",
            Bytes::from_static(b"body"),
            ObjectMeta::new("text/plain").with("owner", "ann").with("stage", "draft"),
        );
        let service = MetadataService::new(Arc::clone(&store));

        let mut metadata = Metadata::new();
        metadata.insert("stage".into(), "final".into());
        metadata.insert("reviewer".into(), "bo".into());
        let result = service
            .patch(PatchRequest {
                bucket: "extracted".into(),
                object_key: "tabs/demo/a.txt".into(),
                metadata,
            })
            .await
            .unwrap();

        assert_eq!(result.metadata["owner"], "ann");
        assert_eq!(result.metadata["stage"], "final");
        assert_eq!(result.metadata["reviewer"], "bo");

        let object = store.get("extracted", "tabs/demo/a.txt").await.unwrap();
        assert_eq!(&object.body[..], b"body");
        assert_eq!(object.meta.content_type.as_deref(), Some("text/plain"));
        assert_eq!(object.meta.metadata, result.metadata);
    }

    #[tokio::test]
    async fn missing_object() {
        let service = MetadataService::new(Arc::new(MemoryStore::new()));
        let err = service
            .patch(PatchRequest {
                bucket: "extracted".into(),
                object_key: "nope.txt".into(),
                metadata: Metadata::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ObjectNotFound { .. }));
    }

    #[test]
    fn request_accepts_bucket_name_alias() {
        let request: PatchRequest = serde_json::from_str(
            r#"{"bucket_name": "extracted", "object_key": "a.txt", "metadata": {"k": "v"}}"#,
        )
        .unwrap();
        assert_eq!(request.bucket, "extracted");
        assert_eq!(request.metadata["k"], "v");
    }
}

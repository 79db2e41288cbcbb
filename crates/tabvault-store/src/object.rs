use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// User-defined object metadata. Deliberately schema-less.
pub type Metadata = BTreeMap<String, String>;

/// Largest number of keys a single batch delete may carry.
pub const MAX_DELETE_BATCH: usize = 1000;

/// Attributes written alongside an object body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub content_type: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ObjectMeta {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            metadata: Metadata::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A fetched object.
#[derive(Clone, Debug)]
pub struct Object {
    pub body: Bytes,
    pub meta: ObjectMeta,
}

/// Object attributes without the body, as returned by `head` and `list`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub meta: ObjectMeta,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub message: String,
}

/// Per-key result of a batch delete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchDeletion {
    pub deleted: Vec<String>,
    pub errors: Vec<DeleteFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_meta_builder() {
        let meta = ObjectMeta::new("text/plain")
            .with("source-zip", "a.zip")
            .with("file-size", "3");
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));
        assert_eq!(meta.metadata.len(), 2);
        assert_eq!(meta.metadata["file-size"], "3");
    }

    #[test]
    fn object_meta_json_without_metadata() {
        let meta: ObjectMeta = serde_json::from_str(r#"{"content_type":null}"#).unwrap();
        assert_eq!(meta, ObjectMeta::default());
    }
}

use bytes::Bytes;
use tabvault_archive::ExtractionTarget;
use tabvault_store::{ObjectMeta, ObjectStore};
use tracing::{debug, warn};

use crate::error::EntryError;
use crate::outcome::{EntryFailure, EntryResult};

pub const SOURCE_ARCHIVE_KEY: &str = "source-zip";
pub const EXTRACTED_FROM_KEY: &str = "extracted-from";
pub const ORIGINAL_PATH_KEY: &str = "original-path";
pub const FILE_SIZE_KEY: &str = "file-size";

/// Writes extracted entries to the destination bucket.
pub struct Publisher<'a, S> {
    store: &'a S,
    bucket: &'a str,
    source_archive: &'a str,
}

impl<'a, S: ObjectStore> Publisher<'a, S> {
    pub fn new(store: &'a S, bucket: &'a str, source_archive: &'a str) -> Self {
        Self {
            store,
            bucket,
            source_archive,
        }
    }

    /// Metadata describing where an extracted object came from.
    pub fn provenance(&self, target: &ExtractionTarget, entry_name: &str, size: usize) -> ObjectMeta {
        ObjectMeta::new(target.content_type)
            .with(SOURCE_ARCHIVE_KEY, self.source_archive)
            .with(EXTRACTED_FROM_KEY, target.target_folder.as_str())
            .with(ORIGINAL_PATH_KEY, entry_name)
            .with(FILE_SIZE_KEY, size.to_string())
    }

    /// Write one entry. A store error becomes a recorded failure, never an `Err`.
    pub async fn publish(&self, target: ExtractionTarget, entry_name: &str, body: Bytes) -> EntryResult {
        let meta = self.provenance(&target, entry_name, body.len());
        match self
            .store
            .put(self.bucket, &target.destination_key, body, meta)
            .await
        {
            Ok(()) => {
                debug!(entry = entry_name, key = %target.destination_key, "extracted");
                EntryResult::Written {
                    key: target.destination_key,
                }
            }
            Err(err) => {
                warn!(entry = entry_name, key = %target.destination_key, error = %err, "entry write failed");
                EntryResult::Failed(EntryFailure::new(
                    target.original_path,
                    EntryError::WriteFailed(err),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tabvault_store::MemoryStore;

    use super::*;

    #[test]
    fn provenance_fields() {
        let store = MemoryStore::new();
        let publisher = Publisher::new(&store, "extracted", "demo.zip");
        let target = ExtractionTarget::new("tabs", "demo", "src/main.py".into());
        let meta = publisher.provenance(&target, "src\\main.py", 11);

        assert_eq!(meta.content_type.as_deref(), Some("text/x-python"));
        assert_eq!(meta.metadata[SOURCE_ARCHIVE_KEY], "demo.zip");
        assert_eq!(meta.metadata[EXTRACTED_FROM_KEY], "demo");
        assert_eq!(meta.metadata[ORIGINAL_PATH_KEY], "src\\main.py");
        assert_eq!(meta.metadata[FILE_SIZE_KEY], "11");
    }

    #[tokio::test]
    async fn publish_writes_object() {
        let store = MemoryStore::new();
        let publisher = Publisher::new(&store, "extracted", "demo.zip");
        let target = ExtractionTarget::new("tabs", "demo", "readme.txt".into());

        let result = publisher
            .publish(target, "readme.txt", Bytes::from_static(b"hello"))
            .await;
        assert!(matches!(result, EntryResult::Written { ref key } if key == "tabs/demo/readme.txt"));
        let object = store.get("extracted", "tabs/demo/readme.txt").await.unwrap();
        assert_eq!(&object.body[..], b"hello");
        assert_eq!(object.meta.content_type.as_deref(), Some("text/plain"));
    }
}

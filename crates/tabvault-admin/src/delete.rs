use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use tabvault_store::{MAX_DELETE_BATCH, ObjectStore};
use tracing::{info, warn};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeletionStatus {
    Complete,
    Partial,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub deleted: Vec<String>,
    pub errors: Vec<String>,
    pub status: DeletionStatus,
}

impl DeletionReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Removes extracted objects, one folder or an explicit key list at a time.
pub struct DeletionService<S> {
    store: Arc<S>,
    bucket: String,
    prefix: String,
}

impl<S: ObjectStore> DeletionService<S> {
    pub fn new(store: Arc<S>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Delete everything under `<prefix>/<folder>/`. `raw_folder` may be
    /// percent-encoded.
    #[tracing::instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn delete_folder(&self, raw_folder: &str) -> Result<DeletionReport> {
        let folder = raw_folder.trim();
        if folder.is_empty() {
            return Err(Error::invalid("folder name is required"));
        }
        let folder = percent_decode_str(folder)
            .decode_utf8()
            .map_err(|_| Error::invalid("folder name is not valid UTF-8"))?;
        let folder_path = [self.prefix.as_str(), &*folder]
            .iter()
            .flat_map(|part| part.split('/'))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        let keys: Vec<String> = self
            .store
            .list(&self.bucket, &format!("{folder_path}/"))
            .await?
            .into_iter()
            .map(|info| info.key)
            .collect();
        if keys.is_empty() {
            return Err(Error::FolderNotFound(folder_path));
        }

        let report = self.delete_all(keys).await;
        info!(folder = %folder_path, deleted = report.deleted_count(), status = ?report.status, "folder deleted");
        Ok(report)
    }

    /// Delete the given keys. Blank entries are ignored.
    #[tracing::instrument(skip_all, fields(bucket = %self.bucket, requested = keys.len()))]
    pub async fn delete_keys(&self, keys: &[String]) -> Result<DeletionReport> {
        let keys: Vec<String> = keys
            .iter()
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
            .map(str::to_owned)
            .collect();
        if keys.is_empty() {
            return Err(Error::invalid("no valid file paths provided"));
        }

        let report = self.delete_all(keys).await;
        info!(deleted = report.deleted_count(), status = ?report.status, "files deleted");
        Ok(report)
    }

    async fn delete_all(&self, keys: Vec<String>) -> DeletionReport {
        let mut deleted = Vec::with_capacity(keys.len());
        let mut errors = Vec::new();

        for batch in keys.chunks(MAX_DELETE_BATCH) {
            match self.store.delete_batch(&self.bucket, batch).await {
                Ok(result) => {
                    deleted.extend(result.deleted);
                    errors.extend(
                        result
                            .errors
                            .into_iter()
                            .map(|failure| format!("failed to delete {}: {}", failure.key, failure.message)),
                    );
                }
                Err(err) => {
                    warn!(error = %err, size = batch.len(), "batch deletion failed");
                    errors.push(format!("batch deletion failed: {err}"));
                }
            }
        }

        let status = if errors.is_empty() {
            DeletionStatus::Complete
        } else {
            DeletionStatus::Partial
        };
        DeletionReport {
            deleted,
            errors,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use tabvault_store::{MemoryStore, ObjectMeta};

    use super::*;

    fn seeded(keys: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for key in keys {
            store.insert("extracted", key, &b"x"[..], ObjectMeta::default());
        }
        store
    }

    #[tokio::test]
    async fn deletes_folder_contents_only() {
        let store = seeded(&["tabs/demo/a.txt", "tabs/demo/src/b.py", "tabs/demo2/c.txt"]);
        let service = DeletionService::new(Arc::clone(&store), "extracted", "tabs");

        let report = service.delete_folder("demo").await.unwrap();
        assert_eq!(report.status, DeletionStatus::Complete);
        assert_eq!(report.deleted_count(), 2);
        assert_eq!(store.keys("extracted"), vec!["tabs/demo2/c.txt"]);
    }

    #[tokio::test]
    async fn folder_name_is_percent_decoded() {
        let store = seeded(&["tabs/my project/a.txt"]);
        let service = DeletionService::new(Arc::clone(&store), "extracted", "tabs");

        service.delete_folder("my%20project").await.unwrap();
        assert!(store.keys("extracted").is_empty());
    }

    #[tokio::test]
    async fn unknown_or_empty_folder() {
        let service = DeletionService::new(seeded(&["tabs/demo/a.txt"]), "extracted", "tabs");
        assert!(matches!(
            service.delete_folder("other").await,
            Err(Error::FolderNotFound(folder)) if folder == "tabs/other"
        ));
        assert!(matches!(service.delete_folder("  ").await, Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn keys_are_trimmed_and_blank_ones_dropped() {
        let store = seeded(&["tabs/demo/a.txt", "tabs/demo/b.txt"]);
        let service = DeletionService::new(Arc::clone(&store), "extracted", "tabs");

        let report = service
            .delete_keys(&[" tabs/demo/a.txt ".into(), "".into(), "   ".into()])
            .await
            .unwrap();
        assert_eq!(report.deleted, vec!["tabs/demo/a.txt"]);
        assert_eq!(store.keys("extracted"), vec!["tabs/demo/b.txt"]);

        let err = service.delete_keys(&["".into(), " ".into()]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::object::{BatchDeletion, MAX_DELETE_BATCH, Object, ObjectInfo, ObjectMeta};
use crate::store::ObjectStore;

#[derive(Clone, Debug)]
struct Stored {
    body: Bytes,
    meta: ObjectMeta,
}

impl Stored {
    fn info(&self, key: &str) -> ObjectInfo {
        ObjectInfo {
            key: key.to_owned(),
            size: self.body.len() as u64,
            meta: self.meta.clone(),
        }
    }
}

/// Process-local store. Buckets spring into existence on first write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, BTreeMap<String, Stored>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous write, handy for seeding fixtures.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>, meta: ObjectMeta) {
        self.buckets
            .write()
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), Stored { body: body.into(), meta });
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.buckets
            .read()
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(key))
    }

    /// Every key in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lookup(&self, bucket: &str, key: &str) -> Result<Stored> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| StoreError::not_found(bucket, key))
    }
}

impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Object> {
        let stored = self.lookup(bucket, key)?;
        Ok(Object {
            body: stored.body,
            meta: stored.meta,
        })
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        Ok(self.lookup(bucket, key)?.info(key))
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, meta: ObjectMeta) -> Result<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                key: key.to_owned(),
                reason: "empty key",
            });
        }
        self.insert(bucket, key, body, meta);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        if let Some(objects) = self.buckets.write().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn delete_batch(&self, bucket: &str, keys: &[String]) -> Result<BatchDeletion> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(StoreError::BatchTooLarge {
                len: keys.len(),
                max: MAX_DELETE_BATCH,
            });
        }
        let mut buckets = self.buckets.write();
        if let Some(objects) = buckets.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(BatchDeletion {
            deleted: keys.to_vec(),
            errors: Vec::new(),
        })
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let buckets = self.buckets.read();
        let Some(objects) = buckets.get(bucket) else {
            return Ok(Vec::new());
        };
        Ok(objects
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, stored)| stored.info(key))
            .collect())
    }

    async fn copy(&self, bucket: &str, from: &str, to: &str, meta: ObjectMeta) -> Result<()> {
        let source = self.lookup(bucket, from)?;
        self.insert(bucket, to, source.body, meta);
        Ok(())
    }
}

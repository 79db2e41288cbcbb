use bytes::Bytes;
use tabvault_store::{
    BatchDeletion, FsStore, MemoryStore, Object, ObjectInfo, ObjectMeta, ObjectStore, Result,
};

use crate::config::{StorageBackend, StorageConfig};

/// The store selected by configuration.
pub enum Backend {
    Memory(MemoryStore),
    Fs(FsStore),
}

impl Backend {
    pub fn from_config(config: &StorageConfig) -> Self {
        match config.backend {
            StorageBackend::Memory => Self::Memory(MemoryStore::new()),
            StorageBackend::Fs => Self::Fs(FsStore::new(&config.root)),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Backend::Memory($store) => $call.await,
            Backend::Fs($store) => $call.await,
        }
    };
}

impl ObjectStore for Backend {
    async fn get(&self, bucket: &str, key: &str) -> Result<Object> {
        dispatch!(self, store => store.get(bucket, key))
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        dispatch!(self, store => store.head(bucket, key))
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, meta: ObjectMeta) -> Result<()> {
        dispatch!(self, store => store.put(bucket, key, body, meta))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        dispatch!(self, store => store.delete(bucket, key))
    }

    async fn delete_batch(&self, bucket: &str, keys: &[String]) -> Result<BatchDeletion> {
        dispatch!(self, store => store.delete_batch(bucket, keys))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        dispatch!(self, store => store.list(bucket, prefix))
    }

    async fn copy(&self, bucket: &str, from: &str, to: &str, meta: ObjectMeta) -> Result<()> {
        dispatch!(self, store => store.copy(bucket, from, to, meta))
    }
}

use std::future::Future;

use bytes::Bytes;

use crate::error::Result;
use crate::object::{BatchDeletion, Object, ObjectInfo, ObjectMeta};

/// Asynchronous object-store abstraction.
///
/// This is the minimal surface the handlers need from a bucket/key store.
/// Every call is a single attempt; retry policy belongs to the backend's
/// client or to whoever replays the triggering event.
///
/// # Implementations
///
/// - [`MemoryStore`](crate::MemoryStore): process-local, used by tests
/// - [`FsStore`](crate::FsStore): directory tree on local disk
pub trait ObjectStore: Send + Sync {
    /// Fetch an object body together with its metadata.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if the key does not exist.
    fn get(&self, bucket: &str, key: &str) -> impl Future<Output = Result<Object>> + Send;

    /// Fetch an object's attributes without its body.
    fn head(&self, bucket: &str, key: &str) -> impl Future<Output = Result<ObjectInfo>> + Send;

    /// Write an object, replacing any existing object at `key`.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        meta: ObjectMeta,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete one object. Deleting a missing key succeeds.
    fn delete(&self, bucket: &str, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete up to [`MAX_DELETE_BATCH`](crate::MAX_DELETE_BATCH) keys,
    /// reporting the outcome per key.
    ///
    /// # Errors
    ///
    /// `StoreError::BatchTooLarge` when `keys` exceeds the limit; nothing is
    /// deleted in that case.
    fn delete_batch(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> impl Future<Output = Result<BatchDeletion>> + Send;

    /// All objects whose key starts with `prefix`, sorted by key.
    fn list(&self, bucket: &str, prefix: &str)
    -> impl Future<Output = Result<Vec<ObjectInfo>>> + Send;

    /// Server-side copy of `from` to `to` within `bucket`, replacing the
    /// metadata and content type with `meta`. `from == to` rewrites the
    /// object's metadata in place.
    fn copy(
        &self,
        bucket: &str,
        from: &str,
        to: &str,
        meta: ObjectMeta,
    ) -> impl Future<Output = Result<()>> + Send;
}

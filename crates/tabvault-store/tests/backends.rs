//! Behaviour shared by every backend.

use bytes::Bytes;
use tabvault_store::{FsStore, MemoryStore, ObjectMeta, ObjectStore};

async fn exercise<S: ObjectStore>(store: &S) {
    let meta = ObjectMeta::new("application/zip").with("target-folder", "demo");
    store
        .put("archives", "uploads/1_a.zip", Bytes::from_static(b"PK"), meta.clone())
        .await
        .unwrap();

    let info = store.head("archives", "uploads/1_a.zip").await.unwrap();
    assert_eq!(info.size, 2);
    assert_eq!(info.meta, meta);

    // overwrite replaces body and metadata
    store
        .put("archives", "uploads/1_a.zip", Bytes::from_static(b"PK34"), ObjectMeta::default())
        .await
        .unwrap();
    let object = store.get("archives", "uploads/1_a.zip").await.unwrap();
    assert_eq!(&object.body[..], b"PK34");
    assert!(object.meta.metadata.is_empty());

    store.copy("archives", "uploads/1_a.zip", "uploads/copy.zip", meta.clone()).await.unwrap();
    assert_eq!(store.head("archives", "uploads/copy.zip").await.unwrap().meta, meta);

    store.delete("archives", "uploads/1_a.zip").await.unwrap();
    store.delete("archives", "uploads/1_a.zip").await.unwrap();
    assert!(store.get("archives", "uploads/1_a.zip").await.unwrap_err().is_not_found());

    let remaining = store.list("archives", "uploads/").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].key, "uploads/copy.zip");
}

#[tokio::test]
async fn memory_backend_contract() {
    exercise(&MemoryStore::new()).await;
}

#[tokio::test]
async fn fs_backend_contract() {
    let dir = tempfile::tempdir().unwrap();
    exercise(&FsStore::new(dir.path())).await;
}

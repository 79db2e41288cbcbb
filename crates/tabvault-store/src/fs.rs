//! Directory-backed object store.
//!
//! Layout under the root:
//!
//! ```text
//! <root>/<bucket>/<key>                         object body
//! <root>/.tabvault-meta/<bucket>/<key>.json     ObjectMeta sidecar
//! ```
//!
//! Bodies and sidecars are written through a temporary file in the target
//! directory and renamed into place, so readers never observe a partial
//! object. A key cannot be both an object and a "directory" of other keys,
//! which S3-style stores would allow.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::object::{BatchDeletion, DeleteFailure, MAX_DELETE_BATCH, Object, ObjectInfo, ObjectMeta};
use crate::store::ObjectStore;

const META_DIR: &str = ".tabvault-meta";
const TEMP_PREFIX: &str = ".tabvault-";

#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Layout) -> Result<T> + Send + 'static,
    {
        let layout = Layout {
            root: self.root.clone(),
        };
        tokio::task::spawn_blocking(move || op(layout))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
    }
}

/// Owned copy of the root so closures can move it onto the blocking pool.
struct Layout {
    root: PathBuf,
}

impl Layout {
    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        let valid = !bucket.is_empty()
            && !bucket.starts_with('.')
            && !bucket.contains(['/', '\\']);
        if !valid {
            return Err(StoreError::InvalidBucket {
                bucket: bucket.to_owned(),
            });
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.bucket_dir(bucket)?;
        for segment in key_segments(key)? {
            path.push(segment);
        }
        Ok(path)
    }

    fn meta_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        self.bucket_dir(bucket)?;
        let mut path = self.root.join(META_DIR).join(bucket);
        for segment in key_segments(key)? {
            path.push(segment);
        }
        let mut file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        file_name.push(".json");
        path.set_file_name(file_name);
        Ok(path)
    }

    fn read_meta(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
        match fs::read(self.meta_path(bucket, key)?) {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ObjectMeta::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn info(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let path = self.object_path(bucket, key)?;
        let size = match fs::metadata(&path) {
            Ok(stat) if stat.is_file() => stat.len(),
            Ok(_) => return Err(StoreError::not_found(bucket, key)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(bucket, key));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ObjectInfo {
            key: key.to_owned(),
            size,
            meta: self.read_meta(bucket, key)?,
        })
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Object> {
        let body = match fs::read(self.object_path(bucket, key)?) {
            Ok(body) => Bytes::from(body),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::IsADirectory) => {
                return Err(StoreError::not_found(bucket, key));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Object {
            body,
            meta: self.read_meta(bucket, key)?,
        })
    }

    fn put(&self, bucket: &str, key: &str, body: &[u8], meta: &ObjectMeta) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        let meta_path = self.meta_path(bucket, key)?;
        write_atomic(&meta_path, &serde_json::to_vec(meta)?)?;
        write_atomic(&path, body)
    }

    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        remove_if_exists(&self.object_path(bucket, key)?)?;
        remove_if_exists(&self.meta_path(bucket, key)?)
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let dir = self.bucket_dir(bucket)?;
        let mut keys = Vec::new();
        collect_keys(&dir, String::new(), &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        keys.iter().map(|key| self.info(bucket, key)).collect()
    }
}

fn key_segments(key: &str) -> Result<impl Iterator<Item = &str>> {
    let invalid = |reason| StoreError::InvalidKey {
        key: key.to_owned(),
        reason,
    };
    if key.is_empty() {
        return Err(invalid("empty key"));
    }
    if key.contains('\\') || key.contains('\0') {
        return Err(invalid("backslash or NUL in key"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative path segment")),
            s if s.starts_with(TEMP_PREFIX) || s == META_DIR => {
                return Err(invalid("reserved name"));
            }
            _ => {}
        }
    }
    Ok(key.split('/'))
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Backend(format!("no parent directory for {}", path.display())))?;
    fs::create_dir_all(parent)?;
    let mut file = tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(parent)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn collect_keys(dir: &Path, prefix: String, keys: &mut Vec<String>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(TEMP_PREFIX) {
            continue;
        }
        let key = format!("{prefix}{name}");
        if entry.file_type()?.is_dir() {
            collect_keys(&entry.path(), format!("{key}/"), keys)?;
        } else {
            keys.push(key);
        }
    }
    Ok(())
}

impl ObjectStore for FsStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Object> {
        let (bucket, key) = (bucket.to_owned(), key.to_owned());
        self.blocking(move |layout| layout.get(&bucket, &key)).await
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        let (bucket, key) = (bucket.to_owned(), key.to_owned());
        self.blocking(move |layout| layout.info(&bucket, &key)).await
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, meta: ObjectMeta) -> Result<()> {
        let (bucket, key) = (bucket.to_owned(), key.to_owned());
        self.blocking(move |layout| layout.put(&bucket, &key, &body, &meta))
            .await
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let (bucket, key) = (bucket.to_owned(), key.to_owned());
        self.blocking(move |layout| layout.delete(&bucket, &key)).await
    }

    async fn delete_batch(&self, bucket: &str, keys: &[String]) -> Result<BatchDeletion> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(StoreError::BatchTooLarge {
                len: keys.len(),
                max: MAX_DELETE_BATCH,
            });
        }
        let (bucket, keys) = (bucket.to_owned(), keys.to_vec());
        self.blocking(move |layout| {
            let mut outcome = BatchDeletion::default();
            for key in keys {
                match layout.delete(&bucket, &key) {
                    Ok(()) => outcome.deleted.push(key),
                    Err(e) => outcome.errors.push(DeleteFailure {
                        key,
                        message: e.to_string(),
                    }),
                }
            }
            Ok(outcome)
        })
        .await
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let (bucket, prefix) = (bucket.to_owned(), prefix.to_owned());
        self.blocking(move |layout| layout.list(&bucket, &prefix)).await
    }

    async fn copy(&self, bucket: &str, from: &str, to: &str, meta: ObjectMeta) -> Result<()> {
        let (bucket, from, to) = (bucket.to_owned(), from.to_owned(), to.to_owned());
        self.blocking(move |layout| {
            let source = layout.get(&bucket, &from)?;
            layout.put(&bucket, &to, &source.body, &meta)
        })
        .await
    }
}

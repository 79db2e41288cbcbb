//! Object-store abstraction used by the tabvault handlers.
//!
//! - [`ObjectStore`] - async bucket/key interface
//! - [`MemoryStore`] - in-process backend
//! - [`FsStore`] - local directory backend with metadata sidecars

mod error;
mod fs;
mod memory;
mod object;
mod store;

pub use error::{Result, StoreError};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use object::{
    BatchDeletion, DeleteFailure, MAX_DELETE_BATCH, Metadata, Object, ObjectInfo, ObjectMeta,
};
pub use store::ObjectStore;

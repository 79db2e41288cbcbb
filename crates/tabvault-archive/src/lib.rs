//! Archive reading and entry classification for tabvault.
//!
//! # Architecture
//!
//! - `detect.rs` - Format detection from magic bytes
//! - `reader/` - Lazy per-format entry sources
//! - `classify.rs` - Directory/hidden filtering and destination keys
//! - `mime.rs` - Extension to content-type lookup
//! - `data/` - Shared types

pub use classify::{Classification, ExtractionTarget, SkipReason, classify, destination_key};
pub use data::{ArchiveEntry, ArchiveFormat, Compression, EntryKind};
pub use detect::detect_format;
pub use error::{Error, Result};
pub use mime::{OCTET_STREAM, content_type_for};
pub use reader::{EntrySource, PendingEntry, Visitor, open, open_as};

pub mod classify;
pub mod data;
mod detect;
mod error;
pub mod mime;
pub mod reader;

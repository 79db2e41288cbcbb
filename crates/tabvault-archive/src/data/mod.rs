pub mod archive;
pub mod entry;

pub use archive::{ArchiveFormat, Compression};
pub use entry::{ArchiveEntry, EntryKind};

use std::io::{Cursor, Read};

use bytes::Bytes;
use tar::EntryType;

use crate::data::{ArchiveEntry, ArchiveFormat, Compression};
use crate::error::{Error, Result};
use crate::reader::codecs::wrap_reader;
use crate::reader::{EntrySource, PendingEntry, Visitor};

/// Streaming tar reader over an optionally compressed buffer.
///
/// Unlike zip there is no central directory, so corruption only surfaces
/// while walking; a header that cannot be read ends the walk with an error.
pub struct TarSource {
    archive: tar::Archive<Box<dyn Read + Send>>,
    codec: Compression,
}

impl TarSource {
    pub fn new(data: Bytes, codec: Compression) -> Result<Self> {
        let reader = wrap_reader(Cursor::new(data), codec)?;
        Ok(Self {
            archive: tar::Archive::new(reader),
            codec,
        })
    }
}

impl EntrySource for TarSource {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Tar(self.codec)
    }

    fn visit(mut self: Box<Self>, visitor: &mut Visitor<'_>) -> Result<()> {
        let entries = self.archive.entries().map_err(Error::corrupted)?;

        for next in entries {
            let mut file = next.map_err(Error::corrupted)?;

            let name = String::from_utf8_lossy(&file.path_bytes()).into_owned();
            let entry_type = file.header().entry_type();
            let mut entry = ArchiveEntry::new(name, file.size());
            if entry_type.is_dir() {
                entry = entry.directory();
            } else if !is_regular(entry_type) {
                entry = entry.special();
            }

            if visitor(Ok(PendingEntry::new(entry, &mut file))).is_break() {
                break;
            }
        }
        Ok(())
    }
}

fn is_regular(entry_type: EntryType) -> bool {
    entry_type.is_file() || entry_type.is_contiguous()
}

use std::io::{self, Cursor};
use std::ops::ControlFlow;

use bytes::Bytes;

use crate::classify::{Classification, classify};
use crate::data::{ArchiveEntry, ArchiveFormat};
use crate::error::{Error, Result};
use crate::reader::{EntrySource, PendingEntry, Visitor};

pub struct ZipSource {
    archive: zip::ZipArchive<Cursor<Bytes>>,
}

impl ZipSource {
    /// Parses the central directory; entry data is left untouched.
    pub fn new(data: Bytes) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data)).map_err(Error::corrupted)?;
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}

impl EntrySource for ZipSource {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn visit(mut self: Box<Self>, visitor: &mut Visitor<'_>) -> Result<()> {
        for index in 0..self.archive.len() {
            let reason = match self.archive.by_index(index) {
                Ok(mut file) => {
                    let entry = ArchiveEntry::new(file.name(), file.size());
                    if visitor(Ok(PendingEntry::new(entry, &mut file))).is_break() {
                        return Ok(());
                    }
                    continue;
                }
                Err(err) => err.to_string(),
            };

            // Unsupported compression or encryption on one entry does not
            // invalidate the rest of the central directory. Entries that would
            // be skipped anyway are reported by name only.
            let name = self.archive.name_for_index(index).map(str::to_owned);
            let flow = match name {
                Some(name) if skipped_by_name(&name) => {
                    let entry = ArchiveEntry::new(name, 0);
                    visitor(Ok(PendingEntry::new(entry, &mut io::empty())))
                }
                name => visitor(Err(Error::EntryOpen {
                    index,
                    name,
                    reason,
                })),
            };
            if let ControlFlow::Break(()) = flow {
                return Ok(());
            }
        }
        Ok(())
    }
}

fn skipped_by_name(name: &str) -> bool {
    !matches!(classify(&ArchiveEntry::new(name, 0)), Classification::Eligible(_))
}

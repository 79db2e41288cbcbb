//! Lazy, single-pass enumeration of archive entries.
//!
//! A source is opened from an in-memory buffer and then visited exactly once.
//! Entry content is only decompressed when the visitor asks for it, so skipped
//! entries cost nothing beyond their header.

use std::io::Read;
use std::ops::ControlFlow;

use bytes::Bytes;

use crate::data::{ArchiveEntry, ArchiveFormat};
use crate::detect::detect_format;
use crate::error::{Error, Result};

mod codecs;
#[cfg(feature = "tar")]
mod tar;
#[cfg(feature = "zip")]
mod zip;

#[cfg(feature = "tar")]
pub use self::tar::TarSource;
#[cfg(feature = "zip")]
pub use self::zip::ZipSource;

/// Upper bound on the up-front allocation for one entry's content. Declared
/// sizes come from the archive itself and are not trusted beyond this.
const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;

/// An entry whose header has been read but whose content has not.
pub struct PendingEntry<'a> {
    entry: ArchiveEntry,
    content: &'a mut dyn Read,
}

impl<'a> PendingEntry<'a> {
    pub(crate) fn new(entry: ArchiveEntry, content: &'a mut dyn Read) -> Self {
        Self { entry, content }
    }

    pub fn entry(&self) -> &ArchiveEntry {
        &self.entry
    }

    /// Decompress the entry's content. Consumes the pending entry: content can
    /// be read at most once.
    pub fn read_content(self) -> Result<(ArchiveEntry, Vec<u8>)> {
        let mut content = Vec::with_capacity(self.entry.raw_size.min(MAX_PREALLOCATION) as usize);
        match self.content.read_to_end(&mut content) {
            Ok(_) => Ok((self.entry, content)),
            Err(source) => Err(Error::EntryRead {
                name: self.entry.name,
                source,
            }),
        }
    }
}

/// Callback driven by [`EntrySource::visit`]. Returning `Break` stops the walk.
pub type Visitor<'v> = dyn FnMut(Result<PendingEntry<'_>>) -> ControlFlow<()> + 'v;

/// Archive-specific entry source.
pub trait EntrySource: Send {
    fn format(&self) -> ArchiveFormat;

    /// Walk every entry in archive order.
    ///
    /// Errors confined to one entry are handed to the visitor and the walk
    /// continues. An `Err` return means the container itself became unreadable
    /// and no further entries can be produced.
    fn visit(self: Box<Self>, visitor: &mut Visitor<'_>) -> Result<()>;
}

/// Detect the container format from magic bytes and open it.
pub fn open(data: Bytes) -> Result<Box<dyn EntrySource>> {
    let format = detect_format(&data).ok_or(Error::UnsupportedFormat)?;
    open_as(data, format)
}

/// Open a buffer as a known container format.
pub fn open_as(data: Bytes, format: ArchiveFormat) -> Result<Box<dyn EntrySource>> {
    tracing::debug!(%format, bytes = data.len(), "opening archive");
    match format {
        #[cfg(feature = "zip")]
        ArchiveFormat::Zip => Ok(Box::new(ZipSource::new(data)?)),
        #[cfg(feature = "tar")]
        ArchiveFormat::Tar(codec) => Ok(Box::new(TarSource::new(data, codec)?)),
        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    fn zip_with(files: &[(&str, &[u8])]) -> Bytes {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = ::zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
        }
        Bytes::from(writer.finish().unwrap().into_inner())
    }

    fn names(source: Box<dyn EntrySource>) -> Vec<String> {
        let mut seen = Vec::new();
        source
            .visit(&mut |pending| {
                seen.push(pending.unwrap().entry().name.clone());
                ControlFlow::Continue(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn open_random_bytes_is_unsupported() {
        let result = open(Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]));
        assert!(matches!(result, Err(Error::UnsupportedFormat)));
    }

    #[test]
    fn open_truncated_zip_is_corrupted() {
        let data = zip_with(&[("a.txt", b"hello")]);
        let truncated = data.slice(..data.len() / 2);
        let result = open(truncated);
        assert!(matches!(result, Err(Error::Corrupted { .. })));
    }

    #[test]
    fn zip_entries_in_archive_order() {
        let data = zip_with(&[("b.txt", b"b"), ("a/", b""), ("a/c.txt", b"c")]);
        let source = open(data).unwrap();
        assert_eq!(source.format(), ArchiveFormat::Zip);
        assert_eq!(names(source), vec!["b.txt", "a/", "a/c.txt"]);
    }

    #[test]
    fn content_is_read_on_demand() {
        let data = zip_with(&[("skip.bin", b"never read"), ("keep.txt", b"kept")]);
        let mut contents = Vec::new();
        open(data)
            .unwrap()
            .visit(&mut |pending| {
                let pending = pending.unwrap();
                if pending.entry().name == "keep.txt" {
                    contents.push(pending.read_content().unwrap());
                }
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].0.raw_size, 4);
        assert_eq!(contents[0].1, b"kept");
    }

    #[test]
    fn visitor_can_stop_early() {
        let data = zip_with(&[("1", b"1"), ("2", b"2"), ("3", b"3")]);
        let mut count = 0;
        open(data)
            .unwrap()
            .visit(&mut |_| {
                count += 1;
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn empty_zip_has_no_entries() {
        let data = zip_with(&[]);
        assert!(names(open(data).unwrap()).is_empty());
    }
}

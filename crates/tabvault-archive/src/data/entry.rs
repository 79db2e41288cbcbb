/// One item inside an archive container, as the reader enumerated it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Raw path as stored in the archive, separators untouched.
    pub name: String,
    pub is_directory: bool,
    /// Uncompressed byte length.
    pub raw_size: u64,
    pub kind: EntryKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file or directory marker.
    Regular,
    /// Symlinks, hard links, devices and other tar specials.
    Special,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, raw_size: u64) -> Self {
        let name = name.into();
        let is_directory = name.ends_with('/') || name.ends_with('\\');
        Self {
            name,
            is_directory,
            raw_size,
            kind: EntryKind::Regular,
        }
    }

    pub fn directory(mut self) -> Self {
        self.is_directory = true;
        self
    }

    pub fn special(mut self) -> Self {
        self.kind = EntryKind::Special;
        self
    }

    pub fn is_special(&self) -> bool {
        self.kind == EntryKind::Special
    }
}

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(Compression),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
    Zstd,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::Tar(Compression::None) => write!(f, "tar"),
            ArchiveFormat::Tar(Compression::Gzip) => write!(f, "tar.gz"),
            ArchiveFormat::Tar(Compression::Xz) => write!(f, "tar.xz"),
            ArchiveFormat::Tar(Compression::Zstd) => write!(f, "tar.zst"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_format_equality() {
        assert_eq!(ArchiveFormat::Zip, ArchiveFormat::Zip);
        assert_ne!(
            ArchiveFormat::Tar(Compression::Gzip),
            ArchiveFormat::Tar(Compression::None)
        );
        assert_ne!(ArchiveFormat::Zip, ArchiveFormat::Tar(Compression::None));
    }

    #[test]
    fn archive_format_display() {
        assert_eq!(ArchiveFormat::Zip.to_string(), "zip");
        assert_eq!(ArchiveFormat::Tar(Compression::Gzip).to_string(), "tar.gz");
        assert_eq!(ArchiveFormat::Tar(Compression::Zstd).to_string(), "tar.zst");
    }
}

use crate::data::archive::{ArchiveFormat, Compression};

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_END_OF_DIRECTORY: &[u8] = b"PK\x05\x06";
/// Fixed part of the end-of-central-directory record.
const ZIP_EOCD_LEN: usize = 22;

const TAR_CODECS: &[(&[u8], Compression)] = &[
    (&[0x1F, 0x8B], Compression::Gzip),
    (&[0x28, 0xB5, 0x2F, 0xFD], Compression::Zstd),
    (&[0xFD, b'7', b'z', b'X', b'Z', 0x00], Compression::Xz),
];

/// Identify the container in `data`.
///
/// Leading magic bytes are checked first. A zip with data in front of it
/// (self-extracting stubs, spanning markers) is found through the
/// end-of-central-directory record near the tail instead.
pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    if data.starts_with(ZIP_LOCAL_HEADER) || data.starts_with(ZIP_END_OF_DIRECTORY) {
        return Some(ArchiveFormat::Zip);
    }
    if let Some((_, codec)) = TAR_CODECS.iter().find(|(magic, _)| data.starts_with(magic)) {
        return Some(ArchiveFormat::Tar(*codec));
    }
    if has_ustar_magic(data) {
        return Some(ArchiveFormat::Tar(Compression::None));
    }
    has_zip_trailer(data).then_some(ArchiveFormat::Zip)
}

fn has_ustar_magic(data: &[u8]) -> bool {
    // POSIX "ustar\0" and GNU "ustar " share the first five bytes.
    data.get(257..262) == Some(b"ustar".as_slice()) && data.len() >= 512
}

/// The record sits in the last 22 bytes plus at most a 64 KiB comment.
fn has_zip_trailer(data: &[u8]) -> bool {
    if data.len() < ZIP_EOCD_LEN {
        return false;
    }
    let window = ZIP_EOCD_LEN + usize::from(u16::MAX);
    let tail = &data[data.len().saturating_sub(window)..data.len() - ZIP_EOCD_LEN + 4];
    tail.windows(4).any(|w| w == ZIP_END_OF_DIRECTORY)
}

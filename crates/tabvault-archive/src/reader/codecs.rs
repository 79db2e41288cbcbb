#![cfg_attr(not(feature = "tar"), allow(dead_code))]

use std::io::Read;

use crate::data::Compression;
use crate::error::{Error, Result};

pub fn wrap_reader<R: Read + Send + 'static>(
    reader: R,
    codec: Compression,
) -> Result<Box<dyn Read + Send>> {
    match codec {
        Compression::None => Ok(Box::new(reader)),
        #[cfg(feature = "tar")]
        Compression::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
        #[cfg(not(feature = "tar"))]
        Compression::Gzip => Err(Error::UnsupportedFormat),
        #[cfg(feature = "xz")]
        Compression::Xz => Ok(Box::new(xz2::read::XzDecoder::new(reader))),
        #[cfg(not(feature = "xz"))]
        Compression::Xz => Err(Error::UnsupportedFormat),
        #[cfg(feature = "zstd")]
        Compression::Zstd => {
            let decoder = zstd::stream::Decoder::new(reader).map_err(Error::corrupted)?;
            Ok(Box::new(decoder))
        }
        #[cfg(not(feature = "zstd"))]
        Compression::Zstd => Err(Error::UnsupportedFormat),
    }
}

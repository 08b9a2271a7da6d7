//! Factory for creating compression handlers

use crate::errors::{SlicerError, SlicerResult};
use super::deflate::DeflateHandler;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::zstd::ZstdHandler;

/// No compression
pub const NONE: u64 = 1;
/// Adobe Deflate (zlib)
pub const ADOBE_DEFLATE: u64 = 8;
/// Deflate under its original PKZIP code
pub const DEFLATE: u64 = 32946;
/// Zstandard
pub const ZSTD: u64 = 50000;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for the given compression code
    ///
    /// # Returns
    /// The handler, or `UnsupportedCompression` for any other code
    pub fn create_handler(compression: u64) -> SlicerResult<Box<dyn CompressionHandler>> {
        match compression {
            NONE => Ok(Box::new(UncompressedHandler)),
            ADOBE_DEFLATE | DEFLATE => Ok(Box::new(DeflateHandler::new(compression))),
            ZSTD => Ok(Box::new(ZstdHandler)),
            _ => Err(SlicerError::UnsupportedCompression(compression)),
        }
    }

    /// Compression codes with a handler
    pub fn supported_codes() -> &'static [u64] {
        &[NONE, ADOBE_DEFLATE, DEFLATE, ZSTD]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_known_codes() {
        for &code in CompressionFactory::supported_codes() {
            assert_eq!(CompressionFactory::create_handler(code).unwrap().code(), code);
        }
        assert_eq!(CompressionFactory::supported_codes(), &[NONE, ADOBE_DEFLATE, DEFLATE, ZSTD]);
    }

    #[test]
    fn test_lzw_and_jpeg_rejected() {
        for code in [5, 7, 32773] {
            assert!(matches!(
                CompressionFactory::create_handler(code),
                Err(SlicerError::UnsupportedCompression(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_decoders() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4000).collect();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).unwrap();
        let deflated = encoder.finish().unwrap();
        let handler = CompressionFactory::create_handler(ADOBE_DEFLATE).unwrap();
        assert_eq!(handler.decompress(&deflated).unwrap(), data);

        let compressed = zstd::encode_all(&data[..], 3).unwrap();
        let handler = CompressionFactory::create_handler(ZSTD).unwrap();
        assert_eq!(handler.decompress(&compressed).unwrap(), data);

        assert!(handler.decompress(&[1, 2, 3, 4]).is_err());
    }
}

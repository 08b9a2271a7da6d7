//! Handler for Deflate compressed data

use std::io::Read;
use flate2::read::ZlibDecoder;

use crate::errors::{SlicerError, SlicerResult};
use super::handler::CompressionHandler;

/// Zlib-wrapped Deflate handler
///
/// The same stream format is registered under two codes: Adobe Deflate (8)
/// and the older PKZIP-style Deflate (32946).
pub struct DeflateHandler {
    code: u64,
}

impl DeflateHandler {
    pub fn new(code: u64) -> Self {
        DeflateHandler { code }
    }
}

impl CompressionHandler for DeflateHandler {
    fn decompress(&self, data: &[u8]) -> SlicerResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed_data = Vec::new();
        decoder.read_to_end(&mut decompressed_data)
            .map_err(|e| SlicerError::FormatError(format!("Deflate decompression error: {}", e)))?;
        Ok(decompressed_data)
    }

    fn name(&self) -> &'static str {
        if self.code == 8 { "Adobe Deflate" } else { "Deflate" }
    }

    fn code(&self) -> u64 {
        self.code
    }
}

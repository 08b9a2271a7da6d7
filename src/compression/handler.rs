//! Compression handler trait definition

use crate::errors::SlicerResult;

/// Strategy trait for decoding one compression method
pub trait CompressionHandler {
    /// Decompress the data of one strip or tile
    fn decompress(&self, data: &[u8]) -> SlicerResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code
    fn code(&self) -> u64;
}

//! Decompression of TIFF strip and tile data
//!
//! One [`CompressionHandler`] strategy per supported compression code,
//! selected through [`CompressionFactory`].

mod deflate;
mod factory;
mod handler;
mod uncompressed;
mod zstd;

pub use self::deflate::DeflateHandler;
pub use self::factory::{CompressionFactory, ADOBE_DEFLATE, DEFLATE, NONE, ZSTD};
pub use self::handler::CompressionHandler;
pub use self::uncompressed::UncompressedHandler;
pub use self::zstd::ZstdHandler;

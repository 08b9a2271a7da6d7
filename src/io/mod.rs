//! I/O utilities for file handling

pub mod byte_order;
pub mod seekable;

pub use self::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use self::seekable::SeekableReader;

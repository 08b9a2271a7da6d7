//! Seekable reader trait

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek {}

impl<T: Read + Seek> SeekableReader for T {}

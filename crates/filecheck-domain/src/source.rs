use std::io::{Read, Seek};

/// Seekable byte stream handed to the version extractors.
pub trait ByteSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> ByteSource for T {}

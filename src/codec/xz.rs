//! xz codec implementation.

use std::io::{self, Read};

use super::{Compression, Decoder};

/// xz decoder.
pub struct XzDecoder<R: Read> {
    inner: lzma_rust2::XzReader<R>,
}

impl<R: Read> std::fmt::Debug for XzDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XzDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> XzDecoder<R> {
    /// Creates a new xz decoder accepting concatenated streams.
    pub fn new(input: R) -> Self {
        Self {
            inner: lzma_rust2::XzReader::new(input, true),
        }
    }
}

impl<R: Read> Read for XzDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> Decoder for XzDecoder<R> {
    fn compression(&self) -> Compression {
        Compression::Xz
    }
}

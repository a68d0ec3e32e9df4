//! Zstandard (ZSTD) codec implementation.

use std::io::{self, BufRead, Read};

use zstd::stream::read::Decoder as ZstdStreamDecoder;

use super::{Compression, Decoder};

/// ZSTD decoder.
///
/// Concatenated frames are decoded as one stream.
pub struct ZstdDecoder<R: BufRead> {
    inner: ZstdStreamDecoder<'static, R>,
}

impl<R: BufRead> std::fmt::Debug for ZstdDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdDecoder").finish_non_exhaustive()
    }
}

impl<R: BufRead> ZstdDecoder<R> {
    /// Creates a new ZSTD decoder reading directly from a buffered source.
    pub fn new(input: R) -> io::Result<Self> {
        let decoder = ZstdStreamDecoder::with_buffer(input)?;
        Ok(Self { inner: decoder })
    }
}

impl<R: BufRead> Read for ZstdDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: BufRead> Decoder for ZstdDecoder<R> {
    fn compression(&self) -> Compression {
        Compression::Zstd
    }
}

//! Decompression of the package payload.
//!
//! The data member's name suffix selects one of a small, closed set of
//! streaming decoders. Each decoder lives in its own feature-gated module;
//! [`PayloadReader`] is the tagged variant that dispatches between them.

#[cfg(feature = "gzip")]
pub mod gzip;

#[cfg(feature = "xz")]
pub mod xz;

#[cfg(feature = "zstd")]
pub mod zstd;

use std::io::{self, BufRead, Read};

use crate::{Error, Result};

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read {
    /// Returns the compression this decoder undoes.
    fn compression(&self) -> Compression;
}

#[cfg(feature = "gzip")]
pub use gzip::GzipDecoder;

#[cfg(feature = "xz")]
pub use xz::XzDecoder;

#[cfg(feature = "zstd")]
pub use self::zstd::ZstdDecoder;

/// Compression applied to the data member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Stored uncompressed (`data.tar`).
    None,
    /// gzip (`data.tar.gz`).
    Gzip,
    /// xz (`data.tar.xz`).
    Xz,
    /// Zstandard (`data.tar.zst`).
    Zstd,
}

impl Compression {
    /// Maps a data member name suffix to a compression supported by this build.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCompression`] for unknown suffixes and for
    /// known suffixes whose codec feature is disabled.
    pub fn from_suffix(suffix: &str) -> Result<Self> {
        match suffix {
            "" => Ok(Compression::None),
            #[cfg(feature = "gzip")]
            ".gz" => Ok(Compression::Gzip),
            #[cfg(feature = "xz")]
            ".xz" => Ok(Compression::Xz),
            #[cfg(feature = "zstd")]
            ".zst" => Ok(Compression::Zstd),
            _ => Err(Error::UnsupportedCompression {
                suffix: suffix.to_string(),
            }),
        }
    }

    /// Returns the member name suffix for this compression.
    pub fn suffix(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::Xz => ".xz",
            Compression::Zstd => ".zst",
        }
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Xz => "xz",
            Compression::Zstd => "zstd",
        }
    }

    /// Returns `true` unless the payload is stored as-is.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Compression::None)
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uncompressed view of the data member.
pub enum PayloadReader<R: BufRead> {
    /// Pass-through for an uncompressed payload.
    Plain(R),
    /// gzip payload.
    #[cfg(feature = "gzip")]
    Gzip(GzipDecoder<R>),
    /// xz payload.
    #[cfg(feature = "xz")]
    Xz(XzDecoder<R>),
    /// Zstandard payload.
    #[cfg(feature = "zstd")]
    Zstd(ZstdDecoder<R>),
}

impl<R: BufRead> std::fmt::Debug for PayloadReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PayloadReader")
            .field(&self.compression())
            .finish()
    }
}

impl<R: BufRead> PayloadReader<R> {
    /// Wraps raw data member bytes in the decoder for `compression`.
    pub fn new(input: R, compression: Compression) -> Result<Self> {
        match compression {
            Compression::None => Ok(PayloadReader::Plain(input)),
            #[cfg(feature = "gzip")]
            Compression::Gzip => Ok(PayloadReader::Gzip(GzipDecoder::new(input))),
            #[cfg(feature = "xz")]
            Compression::Xz => Ok(PayloadReader::Xz(XzDecoder::new(input))),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Ok(PayloadReader::Zstd(ZstdDecoder::new(input)?)),
            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedCompression {
                suffix: other.suffix().to_string(),
            }),
        }
    }
}

impl<R: BufRead> Read for PayloadReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PayloadReader::Plain(r) => r.read(buf),
            #[cfg(feature = "gzip")]
            PayloadReader::Gzip(d) => d.read(buf),
            #[cfg(feature = "xz")]
            PayloadReader::Xz(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            PayloadReader::Zstd(d) => d.read(buf),
        }
    }
}

impl<R: BufRead> Decoder for PayloadReader<R> {
    fn compression(&self) -> Compression {
        match self {
            PayloadReader::Plain(_) => Compression::None,
            #[cfg(feature = "gzip")]
            PayloadReader::Gzip(d) => d.compression(),
            #[cfg(feature = "xz")]
            PayloadReader::Xz(d) => d.compression(),
            #[cfg(feature = "zstd")]
            PayloadReader::Zstd(d) => d.compression(),
        }
    }
}

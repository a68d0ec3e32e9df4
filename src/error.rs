//! Error types for package repacking.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when repacking a package, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! Every failure is fatal to the repack: there is no partial success and no
//! way to skip a malformed member. Errors propagate to the caller, which is
//! expected to discard the (partial) output.
//!
//! ```rust
//! use debalign::Error;
//!
//! fn print_user_message(error: &Error) {
//!     match error {
//!         Error::Io(e) => println!("File error: {}", e),
//!         Error::InvalidFormat(_) | Error::CorruptHeader { .. } => {
//!             println!("The input is not a valid package.")
//!         }
//!         Error::Truncated { .. } => println!("The package ends unexpectedly."),
//!         Error::UnsupportedCompression { suffix } => {
//!             println!("The payload uses an unsupported compression: {}", suffix)
//!         }
//!         _ => println!("Error: {}", error),
//!     }
//! }
//! ```

use std::io;

/// The main error type for repack operations.
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | Read, write or seek failures |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader] | Invalid container or payload data |
/// | Truncation | [`Truncated`][Self::Truncated] | Input ends in the middle of a structure |
/// | Compatibility | [`UnsupportedCompression`][Self::UnsupportedCompression] | Unknown payload suffix |
/// | Usage | [`InvalidState`][Self::InvalidState] | Pipeline operations called out of order |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading input or writing output.
    ///
    /// This also covers outputs that cannot be repositioned, since the
    /// data member header must be patched after the payload is written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a package container.
    ///
    /// Returned for a wrong `!<arch>` signature or when the container ends
    /// without a data member.
    #[error("Invalid package format: {0}")]
    InvalidFormat(String),

    /// A container member header or payload entry is malformed.
    ///
    /// The offset is the input byte offset of the container header, or the
    /// offset of the payload entry within the decompressed payload.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The input ended in the middle of a structure.
    #[error("Truncated input at offset {offset:#x} while reading {context}")]
    Truncated {
        /// Input offset at which more data was expected.
        offset: u64,
        /// What was being read.
        context: &'static str,
    },

    /// The data member uses a compression this build cannot decode.
    ///
    /// Recognized suffixes are `.gz`, `.xz` and `.zst`, each gated behind the
    /// Cargo feature of the same codec.
    #[error("Unsupported data member compression: {suffix:?}")]
    UnsupportedCompression {
        /// The name suffix following `data.tar`.
        suffix: String,
    },

    /// A pipeline operation was invoked in the wrong state.
    #[error("Cannot {operation} while pipeline is {state}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The state the pipeline was in.
        state: &'static str,
    },
}

impl Error {
    /// Returns `true` for malformed container or payload data.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_) | Error::CorruptHeader { .. } | Error::Truncated { .. }
        )
    }

    /// Returns `true` if the payload compression is not supported.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedCompression { .. })
    }

    /// Returns `true` for I/O failures.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Maps a short read to [`Error::Truncated`], keeping other I/O errors.
    pub(crate) fn from_read(err: io::Error, offset: u64, context: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Truncated { offset, context }
        } else {
            Error::Io(err)
        }
    }
}

/// A specialized Result type for repack operations.
pub type Result<T> = std::result::Result<T, Error>;

//! # debalign
//!
//! Repacks Debian-style packages so that every file in the payload starts on
//! a 4096-byte storage block boundary.
//!
//! A package is an `ar` container holding a `data.tar` member, usually
//! compressed. The repacker copies every member before the data member
//! unchanged, decompresses the payload, and rewrites it as an uncompressed
//! tar in which each regular file's data is preceded by just enough PAX
//! filler to start on a block boundary of the output. Identical files in
//! different repacked packages then occupy identical, block-aligned extents,
//! which filesystems with copy-on-write extent sharing ("reflinks") can
//! deduplicate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use debalign::{RepackOptions, Result, repack};
//!
//! fn main() -> Result<()> {
//!     let input = File::open("hello_1.0_amd64.deb")?;
//!     let mut output = File::create("hello_1.0_amd64.aligned.deb")?;
//!
//!     let summary = repack(input, &mut output, RepackOptions::default())?;
//!     println!(
//!         "aligned {} files, data member is now {} bytes",
//!         summary.aligned_entries, summary.final_size
//!     );
//!     Ok(())
//! }
//! ```
//!
//! The output must support seeking: the data member size is only known once
//! the payload has been written, and is patched into the member header
//! afterwards. See [`Pipeline`] for the step-by-step API.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `gzip` | Yes | `data.tar.gz` payloads |
//! | `xz` | Yes | `data.tar.xz` payloads |
//! | `zstd` | Yes | `data.tar.zst` payloads |
//! | `cli` | No | The `debalign` command-line tool |
//!
//! A suffix whose feature is disabled is reported as
//! [`Error::UnsupportedCompression`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod codec;
mod error;
pub mod format;
mod options;
mod repack;
pub mod sink;

pub use codec::Compression;
pub use error::{Error, Result};
pub use options::RepackOptions;
pub use repack::{Pipeline, PipelineState, RepackSummary, repack};
pub use sink::OutputSink;

//! The repack pipeline.
//!
//! A package is repacked in three fixed-order steps:
//!
//! 1. [`Pipeline::open`] copies the container signature and every member up
//!    to the data member, optionally inserts the `_data-pad` member, and
//!    writes the data member header with its original size.
//! 2. [`Pipeline::run`] decompresses the payload and rewrites it so every
//!    non-empty regular file starts on a 4096-byte boundary, then extends the
//!    output to a block boundary.
//! 3. [`Pipeline::close`] patches the data member size with the number of
//!    bytes actually written.
//!
//! If a pipeline is dropped after `run` succeeded but before `close`, the size
//! patch is still applied and failures are logged.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use debalign::{Pipeline, RepackOptions};
//!
//! # fn main() -> debalign::Result<()> {
//! # let package = {
//! #     let mut builder = tar::Builder::new(Vec::new());
//! #     let mut header = tar::Header::new_ustar();
//! #     header.set_size(5);
//! #     builder.append_data(&mut header, "a", &b"hello"[..])?;
//! #     let tar = builder.into_inner()?;
//! #     let mut deb = b"!<arch>\n".to_vec();
//! #     deb.extend(format!("{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n", "data.tar", 0, 0, 0, 100644, tar.len()).into_bytes());
//! #     deb.extend(tar);
//! #     deb
//! # };
//! let mut output = Vec::new();
//! let mut pipeline = Pipeline::open(package.as_slice(), Cursor::new(&mut output), RepackOptions::default())?;
//! pipeline.run()?;
//! let summary = pipeline.close()?;
//!
//! assert_eq!(summary.aligned_entries, 1);
//! assert_eq!(output.len() % 4096, 0);
//! # Ok(())
//! # }
//! ```

mod aligner;
mod finalizer;
mod scanner;

use std::io::{self, BufReader, Read, Write};

use crate::codec::{Compression, PayloadReader};
use crate::format::ar::{self, MemberHeader};
use crate::options::RepackOptions;
use crate::sink::{OutputSink, TrackedWriter};
use crate::{Error, Result};

use finalizer::PendingSizePatch;
use scanner::ContainerScanner;

/// Lifecycle of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Copying members ahead of the data member.
    Scanning,
    /// The data member header has been written; the payload has not.
    Found,
    /// Rewriting the payload.
    Transforming,
    /// The payload is complete; the size patch is pending.
    Finalizing,
    /// The size patch has been applied.
    Done,
    /// An operation failed; the output is unusable.
    Failed,
}

impl PipelineState {
    /// Returns a lowercase name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Scanning => "scanning",
            PipelineState::Found => "found",
            PipelineState::Transforming => "transforming",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Statistics about a completed repack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepackSummary {
    /// Members copied verbatim ahead of the data member.
    pub copied_members: usize,
    /// Payload size of the inserted `_data-pad` member, if any.
    pub pad_size: Option<u64>,
    /// Compression of the input data member.
    pub compression: Compression,
    /// Regular files whose data was aligned.
    pub aligned_entries: u64,
    /// Other entries (directories, links, empty files, ...).
    pub passthrough_entries: u64,
    /// Filler characters written into `comment` records.
    pub filler_bytes: u64,
    /// Data member size declared by the input.
    pub declared_size: u64,
    /// Data member size written to the output.
    pub final_size: u64,
}

impl RepackSummary {
    fn new(compression: Compression, declared_size: u64) -> Self {
        Self {
            copied_members: 0,
            pad_size: None,
            compression,
            aligned_entries: 0,
            passthrough_entries: 0,
            filler_bytes: 0,
            declared_size,
            final_size: 0,
        }
    }
}

/// A single-use repack of one package from `R` into `S`.
pub struct Pipeline<R: Read, S: OutputSink> {
    state: PipelineState,
    options: RepackOptions,
    input: Option<BufReader<R>>,
    output: Option<TrackedWriter<S>>,
    patch: Option<PendingSizePatch>,
    summary: RepackSummary,
}

impl<R: Read, S: OutputSink> std::fmt::Debug for Pipeline<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state)
            .field("patch", &self.patch)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl<R: Read, S: OutputSink> Pipeline<R, S> {
    /// Scans `input` up to the data member, writing everything before its
    /// payload to `output`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFormat`] for a wrong signature or a package without
    ///   data member
    /// - [`Error::CorruptHeader`] for a malformed member header
    /// - [`Error::Truncated`] if the input ends inside a member
    /// - [`Error::UnsupportedCompression`] for an unknown data member suffix;
    ///   nothing of the data member has been written in that case
    pub fn open(input: R, output: S, options: RepackOptions) -> Result<Self> {
        options.validate()?;
        let output = TrackedWriter::new(output, options.write_buffer_size)?;
        let input = BufReader::with_capacity(options.read_buffer_size, input);

        let mut pipeline = Self {
            state: PipelineState::Scanning,
            options,
            input: None,
            output: Some(output),
            patch: None,
            summary: RepackSummary::new(Compression::None, 0),
        };
        match pipeline.scan(input) {
            Ok(()) => {
                pipeline.state = PipelineState::Found;
                Ok(pipeline)
            }
            Err(e) => {
                pipeline.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    /// Rewrites the data member payload.
    pub fn run(&mut self) -> Result<()> {
        self.expect_state(PipelineState::Found, "run")?;
        self.state = PipelineState::Transforming;
        match self.transform() {
            Ok(()) => {
                self.state = PipelineState::Finalizing;
                Ok(())
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    /// Patches the data member size and flushes the output.
    pub fn close(mut self) -> Result<RepackSummary> {
        self.expect_state(PipelineState::Finalizing, "close")?;
        match self.finalize() {
            Ok(()) => {
                self.state = PipelineState::Done;
                Ok(self.summary.clone())
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn expect_state(&self, expected: PipelineState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState {
                operation,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    fn scan(&mut self, input: BufReader<R>) -> Result<()> {
        let level = self.options.progress_level();
        let pad_data_member = self.options.pad_data_member;
        let Some(output) = self.output.as_mut() else {
            return Err(self.invalid_state("open"));
        };

        let mut scanner = ContainerScanner::new(input);
        scanner.copy_magic(output)?;
        let data = scanner.find_data_member(output)?;
        log::log!(
            level,
            "found {} at offset {} ({}, {} bytes)",
            data.header.name(),
            data.input_offset,
            data.compression,
            data.header.size()
        );

        let mut summary = RepackSummary::new(data.compression, data.header.size());
        summary.copied_members = scanner.copied_members();

        if pad_data_member {
            if let Some(size) = ar::pad_member_size(output.position()) {
                let pad = MemberHeader::padding(size)?;
                output.write_all(pad.as_bytes())?;
                io::copy(&mut io::repeat(0).take(size), output)?;
                log::log!(level, "added {} byte {} member", size, ar::PAD_NAME);
                summary.pad_size = Some(size);
            }
        }

        let mut header = data.header;
        header.set_name(ar::DATA_PREFIX);
        let header_offset = output.position();
        output.write_all(header.as_bytes())?;

        self.patch = Some(PendingSizePatch::new(header_offset, header.size()));
        self.input = Some(scanner.into_inner());
        self.summary = summary;
        Ok(())
    }

    fn transform(&mut self) -> Result<()> {
        let level = self.options.progress_level();
        let (Some(mut input), Some(output), Some(patch)) =
            (self.input.take(), self.output.as_mut(), self.patch)
        else {
            return Err(Error::InvalidState {
                operation: "run",
                state: PipelineState::Transforming.name(),
            });
        };

        let raw = (&mut input).take(patch.declared_size);
        let payload = PayloadReader::new(raw, self.summary.compression)?;
        let stats = aligner::align_payload(payload, output, patch.data_start, level)?;
        log::log!(
            level,
            "aligned {} files ({} filler bytes), {} other entries",
            stats.aligned_entries,
            stats.filler_bytes,
            stats.passthrough_entries
        );

        self.summary.aligned_entries = stats.aligned_entries;
        self.summary.passthrough_entries = stats.passthrough_entries;
        self.summary.filler_bytes = stats.filler_bytes;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let (Some(mut output), Some(patch)) = (self.output.take(), self.patch.take()) else {
            return Err(self.invalid_state("close"));
        };
        self.summary.final_size = patch.apply(&mut output)?;
        let mut sink = output.into_inner()?;
        sink.flush()?;
        Ok(())
    }
}

impl<R: Read, S: OutputSink> Drop for Pipeline<R, S> {
    fn drop(&mut self) {
        if self.state == PipelineState::Finalizing {
            if let Err(e) = self.finalize() {
                log::error!("failed to finalize data member: {}", e);
            }
            self.state = PipelineState::Done;
        }
    }
}

/// Repacks the package read from `input` into `output`.
///
/// Equivalent to [`Pipeline::open`], [`Pipeline::run`] and
/// [`Pipeline::close`] in sequence.
pub fn repack<R: Read, S: OutputSink>(
    input: R,
    output: S,
    options: RepackOptions,
) -> Result<RepackSummary> {
    let mut pipeline = Pipeline::open(input, output, options)?;
    pipeline.run()?;
    pipeline.close()
}

//! Output sinks for the repacked package.
//!
//! The repacker writes its output front to back, then seeks backwards once to
//! patch the data member's size field. Every sink therefore needs random
//! access ([`Write`] + [`Seek`]). Sinks that can also change their length
//! directly (regular files) report it through [`OutputSink::set_len`]; all
//! others are extended by writing a single byte at the new end.

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, SeekFrom, Write};

/// A random-access destination for the repacked package.
pub trait OutputSink: Write + Seek {
    /// Sets the length of the underlying storage, if the sink supports it.
    ///
    /// Returns `None` when the sink has no such capability; the caller then
    /// falls back to seeking and writing.
    fn set_len(&mut self, len: u64) -> Option<io::Result<()>> {
        let _ = len;
        None
    }
}

impl OutputSink for File {
    fn set_len(&mut self, len: u64) -> Option<io::Result<()>> {
        Some(File::set_len(self, len))
    }
}

impl OutputSink for Cursor<Vec<u8>> {}

impl OutputSink for Cursor<&mut Vec<u8>> {}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn set_len(&mut self, len: u64) -> Option<io::Result<()>> {
        (**self).set_len(len)
    }
}

/// A buffered writer that tracks the absolute output position.
pub struct TrackedWriter<S: OutputSink> {
    inner: BufWriter<S>,
    position: u64,
}

impl<S: OutputSink> std::fmt::Debug for TrackedWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedWriter")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl<S: OutputSink> TrackedWriter<S> {
    /// Wraps `sink`, starting at its current stream position.
    pub fn new(mut sink: S, capacity: usize) -> io::Result<Self> {
        let position = sink.stream_position()?;
        Ok(Self {
            inner: BufWriter::with_capacity(capacity.max(1), sink),
            position,
        })
    }

    /// Returns the offset the next byte will be written at.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Extends the output with zeros up to the next multiple of `align`.
    ///
    /// Returns the new end offset.
    pub fn extend_to_boundary(&mut self, align: u64) -> io::Result<u64> {
        self.inner.flush()?;
        let target = crate::format::align_up(self.position, align);
        if target == self.position {
            return Ok(target);
        }

        let sink = self.inner.get_mut();
        match OutputSink::set_len(sink, target) {
            Some(result) => {
                result?;
                sink.seek(SeekFrom::Start(target))?;
            }
            None => {
                sink.seek(SeekFrom::Start(target - 1))?;
                sink.write_all(&[0])?;
            }
        }
        log::debug!("extended output from {} to {} bytes", self.position, target);
        self.position = target;
        Ok(target)
    }

    /// Returns the length of the output, including bytes still buffered.
    pub fn end_offset(&mut self) -> io::Result<u64> {
        self.inner.flush()?;
        let end = self.inner.get_mut().seek(SeekFrom::End(0))?;
        self.position = end;
        Ok(end)
    }

    /// Overwrites already-written bytes at `offset`, then returns to the end.
    pub fn patch(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.inner.flush()?;
        let sink = self.inner.get_mut();
        sink.seek(SeekFrom::Start(offset))?;
        sink.write_all(bytes)?;
        sink.seek(SeekFrom::Start(self.position))?;
        Ok(())
    }

    /// Flushes the buffer and returns the sink.
    pub fn into_inner(self) -> io::Result<S> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

impl<S: OutputSink> Write for TrackedWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

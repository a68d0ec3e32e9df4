//! Patches the data member size once the payload is complete.

use crate::format::ar;
use crate::sink::{OutputSink, TrackedWriter};
use crate::Result;

/// The size field of an emitted data member header, awaiting its true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingSizePatch {
    /// Output offset of the size field.
    pub field_offset: u64,
    /// Output offset of the first payload byte.
    pub data_start: u64,
    /// Size declared by the input header.
    pub declared_size: u64,
}

impl PendingSizePatch {
    pub fn new(header_offset: u64, declared_size: u64) -> Self {
        Self {
            field_offset: header_offset + ar::SIZE_OFFSET as u64,
            data_start: header_offset + ar::HEADER_SIZE as u64,
            declared_size,
        }
    }

    /// Measures the written payload and rewrites the size field if it changed.
    ///
    /// Returns the final payload size.
    pub fn apply<S: OutputSink>(&self, output: &mut TrackedWriter<S>) -> Result<u64> {
        let end = output.end_offset()?;
        let final_size = end - self.data_start;
        if final_size != self.declared_size {
            log::info!(
                "data member size changed from {} to {} bytes",
                self.declared_size,
                final_size
            );
            output.patch(self.field_offset, &ar::encode_size(final_size)?)?;
        }
        Ok(final_size)
    }
}

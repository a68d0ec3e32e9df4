//! Configuration for a repack operation.

/// Options controlling how a package is repacked.
///
/// # Example
///
/// ```rust
/// use debalign::RepackOptions;
///
/// // Default configuration (pad member enabled, 64 KiB buffers)
/// let options = RepackOptions::default();
///
/// // Quieter, smaller buffers, no pad member
/// let options = RepackOptions::new()
///     .pad_data_member(false)
///     .read_buffer_size(16 * 1024)
///     .write_buffer_size(16 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepackOptions {
    /// Report progress messages at info level instead of debug.
    ///
    /// Default: false.
    pub verbose: bool,

    /// Insert a `_data-pad` member so the data member payload starts on a
    /// block boundary of the output.
    ///
    /// Without it, file data is still aligned to absolute output offsets,
    /// which is only possible when the payload starts on a 512-byte tar
    /// record boundary.
    /// Default: true.
    pub pad_data_member: bool,

    /// Buffer size for reading the input package (bytes).
    ///
    /// Default: 64 KiB.
    pub read_buffer_size: usize,

    /// Buffer size for writing the output package (bytes).
    ///
    /// Default: 64 KiB.
    pub write_buffer_size: usize,
}

impl Default for RepackOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            pad_data_member: true,
            read_buffer_size: 64 * 1024,  // 64 KiB
            write_buffer_size: 64 * 1024, // 64 KiB
        }
    }
}

impl RepackOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether progress messages are logged at info level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets whether the `_data-pad` member is inserted.
    pub fn pad_data_member(mut self, pad: bool) -> Self {
        self.pad_data_member = pad;
        self
    }

    /// Sets the input buffer size.
    pub fn read_buffer_size(mut self, bytes: usize) -> Self {
        self.read_buffer_size = bytes;
        self
    }

    /// Sets the output buffer size.
    pub fn write_buffer_size(mut self, bytes: usize) -> Self {
        self.write_buffer_size = bytes;
        self
    }

    /// Validates the options.
    pub fn validate(&self) -> crate::Result<()> {
        if self.read_buffer_size == 0 {
            return Err(crate::Error::InvalidFormat(
                "read_buffer_size must be greater than 0".into(),
            ));
        }

        if self.write_buffer_size == 0 {
            return Err(crate::Error::InvalidFormat(
                "write_buffer_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Level used for progress messages.
    pub(crate) fn progress_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }
}

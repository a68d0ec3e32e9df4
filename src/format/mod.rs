//! Binary format primitives for the package container and its payload.
//!
//! - [`ar`]: the outer `!<arch>` container with its fixed 60-byte member headers.
//! - [`pax`]: PAX extended-header records and the alignment filler computation.

pub mod ar;
pub mod pax;

/// Storage block size at which extent sharing becomes possible.
pub const BLOCK_SIZE: u64 = 4096;

/// Native record size of the tar payload.
pub const RECORD_SIZE: u64 = 512;

/// Rounds `value` up to the next multiple of `align` (a power of two).
#[inline]
pub fn align_up(value: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

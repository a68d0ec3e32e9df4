//! Fuzz target for repacking arbitrary byte input.
//!
//! The input is repacked twice: once as is, and once behind a valid container
//! signature so the member and payload parsers see most of the inputs. Errors
//! are expected; panics, hangs and misaligned output are not.
//!
//! Run with: cargo +nightly fuzz run repack

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;

fn check(input: &[u8]) {
    let mut output = Vec::new();
    if debalign::repack(input, Cursor::new(&mut output), debalign::RepackOptions::default())
        .is_ok()
    {
        assert_eq!(output.len() % 4096, 0);
    }
}

fuzz_target!(|data: &[u8]| {
    check(data);

    let mut package = b"!<arch>\n".to_vec();
    package.extend_from_slice(data);
    check(&package);
});

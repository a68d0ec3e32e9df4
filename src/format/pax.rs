//! PAX extended-header records and block alignment of tar entry data.
//!
//! A PAX record is `"<len> <key>=<value>\n"`, where `<len>` is the decimal
//! length of the whole record including its own digits. Records are stored
//! as the payload of a tar entry of type `x` that precedes the entry they
//! describe.
//!
//! # Alignment
//!
//! A regular file rewritten with a PAX block occupies:
//!
//! ```text
//! offset                 PAX header record (512)
//! offset + 512           PAX records, padded to a multiple of 512
//! offset + 512 + R       entry header record (512)
//! offset + 1024 + R      file data
//! ```
//!
//! [`PaxRecords::push_filler`] appends a `comment` record sized so that the
//! record payload `R` is an exact multiple of 512 and the file data lands on
//! a [`BLOCK_SIZE`] boundary.

use super::{BLOCK_SIZE, RECORD_SIZE};

/// Key of the filler record. Consumers treat it as free-form text.
pub const COMMENT_KEY: &str = "comment";

/// PAX key holding a path longer than the header name field.
pub const PATH_KEY: &str = "path";

/// PAX key holding a link target longer than the header link field.
pub const LINKPATH_KEY: &str = "linkpath";

/// Records preceding the data: the PAX header and the entry header.
const FIXED_RECORDS: u64 = 2 * RECORD_SIZE;

/// Returns `len` filler characters.
pub fn filler(len: usize) -> Vec<u8> {
    vec![b' '; len]
}

/// Number of decimal digits of `n`.
fn digits(n: u64) -> u64 {
    let mut count = 1;
    let mut n = n / 10;
    while n > 0 {
        count += 1;
        n /= 10;
    }
    count
}

/// Length of a `comment` record whose filler is empty-or-longer: the digits,
/// the space, the key, `=` and the trailing newline.
fn comment_overhead(record_len: u64) -> u64 {
    digits(record_len) + COMMENT_KEY.len() as u64 + 3
}

/// Smallest encodable `comment` record (`"12 comment=\n"`).
const MIN_COMMENT_RECORD: u64 = 12;

/// Computes the length of the `comment` record that aligns the data of an
/// entry whose PAX header starts at `header_offset`, given `records_len`
/// bytes of other records in the same block.
///
/// `header_offset` is expected to be a multiple of [`RECORD_SIZE`]; it is
/// rounded up otherwise.
pub fn comment_record_len(header_offset: u64, records_len: u64) -> u64 {
    let header_offset = super::align_up(header_offset, RECORD_SIZE);
    let data_offset = header_offset + FIXED_RECORDS;
    let mut total = (BLOCK_SIZE - data_offset % BLOCK_SIZE) % BLOCK_SIZE;
    while total < records_len + MIN_COMMENT_RECORD {
        total += BLOCK_SIZE;
    }
    total - records_len
}

/// An encoded sequence of PAX records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaxRecords {
    buf: Vec<u8>,
}

impl PaxRecords {
    /// Creates an empty record set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `key=value` record.
    pub fn push(&mut self, key: &[u8], value: &[u8]) {
        // " key=value\n"
        let body = key.len() as u64 + value.len() as u64 + 3;
        let mut len = body + digits(body);
        if digits(len) > digits(body) {
            len += 1;
        }
        self.buf.extend_from_slice(len.to_string().as_bytes());
        self.buf.push(b' ');
        self.buf.extend_from_slice(key);
        self.buf.push(b'=');
        self.buf.extend_from_slice(value);
        self.buf.push(b'\n');
    }

    /// Appends the filler `comment` record for an entry whose PAX header will
    /// be written at `header_offset`, returning the number of filler bytes.
    ///
    /// Must be the last record pushed.
    pub fn push_filler(&mut self, header_offset: u64) -> u64 {
        let record_len = comment_record_len(header_offset, self.buf.len() as u64);
        let fill = record_len - comment_overhead(record_len);
        self.buf.extend_from_slice(record_len.to_string().as_bytes());
        self.buf.push(b' ');
        self.buf.extend_from_slice(COMMENT_KEY.as_bytes());
        self.buf.push(b'=');
        self.buf.extend_from_slice(&filler(fill as usize));
        self.buf.push(b'\n');
        fill
    }

    /// Returns the encoded length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no records were pushed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the encoded records.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

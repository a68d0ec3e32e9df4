//! The `!<arch>` container used as the outer package format.
//!
//! A container is the 8-byte signature followed by members. Each member is a
//! 60-byte ASCII header, `size` payload bytes and one `\n` alignment byte when
//! `size` is odd:
//!
//! | Offset | Length | Field |
//! |--------|--------|-------|
//! | 0 | 16 | name |
//! | 16 | 12 | mtime |
//! | 28 | 6 | uid |
//! | 34 | 6 | gid |
//! | 40 | 8 | mode (octal) |
//! | 48 | 10 | size (decimal) |
//! | 58 | 2 | terminator `` `\n `` |

use crate::{Error, Result};

/// Global container signature.
pub const MAGIC: &[u8; 8] = b"!<arch>\n";

/// Size of a member header.
pub const HEADER_SIZE: usize = 60;

/// Offset of the decimal size field within a member header.
pub const SIZE_OFFSET: usize = 48;

/// Width of the size field.
pub const SIZE_LEN: usize = 10;

/// Name prefix identifying the data member.
pub const DATA_PREFIX: &str = "data.tar";

/// Name of the filler member inserted ahead of the data member.
pub const PAD_NAME: &str = "_data-pad";

const NAME_LEN: usize = 16;
const TERMINATOR: &[u8; 2] = b"`\n";

/// Largest value that fits the size field.
const MAX_SIZE: u64 = 9_999_999_999;

/// A parsed member header, keeping its raw bytes for verbatim copying.
#[derive(Clone, PartialEq, Eq)]
pub struct MemberHeader {
    raw: [u8; HEADER_SIZE],
    name: String,
    size: u64,
}

impl std::fmt::Debug for MemberHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberHeader")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl MemberHeader {
    /// Parses a raw header read at input offset `offset`.
    pub fn parse(raw: [u8; HEADER_SIZE], offset: u64) -> Result<Self> {
        if &raw[58..60] != TERMINATOR {
            return Err(Error::corrupt_header(offset, "missing header terminator"));
        }

        let name = field_str(&raw[..NAME_LEN]);
        let name = String::from_utf8_lossy(name).into_owned();

        let size_field = field_str(&raw[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN]);
        if size_field.is_empty() || !size_field.iter().all(u8::is_ascii_digit) {
            return Err(Error::corrupt_header(
                offset,
                format!(
                    "size field {:?} of member '{}' is not decimal",
                    String::from_utf8_lossy(size_field),
                    name
                ),
            ));
        }
        // At most ten ASCII digits, always fits
        let size = size_field
            .iter()
            .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));

        Ok(Self { raw, name, size })
    }

    /// Builds the header of a `_data-pad` member holding `size` bytes.
    pub fn padding(size: u64) -> Result<Self> {
        let mut raw = [b' '; HEADER_SIZE];
        put_field(&mut raw[..16], PAD_NAME.as_bytes());
        put_field(&mut raw[16..28], b"0");
        put_field(&mut raw[28..34], b"0");
        put_field(&mut raw[34..40], b"0");
        put_field(&mut raw[40..48], b"100644");
        raw[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN].copy_from_slice(&encode_size(size)?);
        raw[58..60].copy_from_slice(TERMINATOR);
        Ok(Self {
            raw,
            name: PAD_NAME.to_string(),
            size,
        })
    }

    /// Returns the member name, without trailing padding.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared payload size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the raw 60 header bytes.
    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.raw
    }

    /// Number of alignment bytes following the payload.
    pub fn alignment_len(&self) -> u64 {
        self.size % 2
    }

    /// Returns the compression suffix if this is the data member.
    ///
    /// A trailing `/`, as written by GNU ar, is not part of the suffix.
    pub fn data_suffix(&self) -> Option<&str> {
        let name = self.name.strip_suffix('/').unwrap_or(&self.name);
        name.strip_prefix(DATA_PREFIX)
    }

    /// Replaces the name field, keeping all other fields.
    pub fn set_name(&mut self, name: &str) {
        put_field(&mut self.raw[..NAME_LEN], name.as_bytes());
        self.name = name.to_string();
    }
}

/// Encodes a size as a left-justified, space-padded decimal field.
pub fn encode_size(size: u64) -> Result<[u8; SIZE_LEN]> {
    if size > MAX_SIZE {
        return Err(Error::InvalidFormat(format!(
            "member size {} does not fit the {}-byte size field",
            size, SIZE_LEN
        )));
    }
    let mut field = [b' '; SIZE_LEN];
    put_field(&mut field, size.to_string().as_bytes());
    Ok(field)
}

/// Size of the `_data-pad` payload so that a member header starting after
/// the pad member ends on a block boundary, or `None` if `offset` already
/// places the next header correctly.
pub fn pad_member_size(offset: u64) -> Option<u64> {
    let header = HEADER_SIZE as u64;
    if (offset + header) % super::BLOCK_SIZE == 0 {
        return None;
    }
    Some(super::align_up(offset + 2 * header, super::BLOCK_SIZE) - 2 * header - offset)
}

/// Returns the field bytes up to the first space or NUL.
fn field_str(field: &[u8]) -> &[u8] {
    let end = field
        .iter()
        .position(|&b| b == b' ' || b == 0)
        .unwrap_or(field.len());
    &field[..end]
}

/// Writes `value` left-justified into `field`, padding with spaces.
fn put_field(field: &mut [u8], value: &[u8]) {
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value[..len]);
    field[len..].fill(b' ');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, size: &str) -> [u8; HEADER_SIZE] {
        let mut raw = [b' '; HEADER_SIZE];
        put_field(&mut raw[..16], name.as_bytes());
        put_field(&mut raw[16..28], b"1700000000");
        put_field(&mut raw[28..34], b"0");
        put_field(&mut raw[34..40], b"0");
        put_field(&mut raw[40..48], b"100644");
        put_field(&mut raw[48..58], size.as_bytes());
        raw[58..60].copy_from_slice(b"`\n");
        raw
    }

    #[test]
    fn test_parse_member() {
        let member = MemberHeader::parse(header("control.tar.xz", "1234"), 8).unwrap();
        assert_eq!(member.name(), "control.tar.xz");
        assert_eq!(member.size(), 1234);
        assert_eq!(member.alignment_len(), 0);
        assert_eq!(member.data_suffix(), None);
    }

    #[test]
    fn test_parse_odd_size() {
        let member = MemberHeader::parse(header("debian-binary", "3"), 8).unwrap();
        assert_eq!(member.alignment_len(), 1);
    }

    #[test]
    fn test_data_suffix() {
        let plain = MemberHeader::parse(header("data.tar", "0"), 8).unwrap();
        assert_eq!(plain.data_suffix(), Some(""));

        let xz = MemberHeader::parse(header("data.tar.xz", "0"), 8).unwrap();
        assert_eq!(xz.data_suffix(), Some(".xz"));

        let gnu = MemberHeader::parse(header("data.tar.zst/", "0"), 8).unwrap();
        assert_eq!(gnu.data_suffix(), Some(".zst"));

        let other = MemberHeader::parse(header("data.ta", "0"), 8).unwrap();
        assert_eq!(other.data_suffix(), None);
    }

    #[test]
    fn test_nul_terminated_fields() {
        let mut raw = header("", "");
        raw[..4].copy_from_slice(b"abc\0");
        raw[48..51].copy_from_slice(b"42\0");
        let member = MemberHeader::parse(raw, 8).unwrap();
        assert_eq!(member.name(), "abc");
        assert_eq!(member.size(), 42);
    }

    #[test]
    fn test_reject_bad_size() {
        let err = MemberHeader::parse(header("control", "12a"), 68).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 68, .. }));

        let err = MemberHeader::parse(header("control", ""), 68).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_reject_bad_terminator() {
        let mut raw = header("control", "10");
        raw[58] = b'!';
        let err = MemberHeader::parse(raw, 8).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 8, .. }));
    }

    #[test]
    fn test_set_name_keeps_other_fields() {
        let mut member = MemberHeader::parse(header("data.tar.gz", "99"), 8).unwrap();
        member.set_name(DATA_PREFIX);
        assert_eq!(&member.as_bytes()[..16], b"data.tar        ");
        assert_eq!(&member.as_bytes()[16..], &header("data.tar.gz", "99")[16..]);
        assert_eq!(member.name(), "data.tar");
    }

    #[test]
    fn test_encode_size() {
        assert_eq!(&encode_size(5).unwrap(), b"5         ");
        assert_eq!(&encode_size(9_999_999_999).unwrap(), b"9999999999");
        assert!(encode_size(10_000_000_000).is_err());
    }

    #[test]
    fn test_padding_header_round_trips() {
        let pad = MemberHeader::padding(3968).unwrap();
        let parsed = MemberHeader::parse(*pad.as_bytes(), 0).unwrap();
        assert_eq!(parsed.name(), PAD_NAME);
        assert_eq!(parsed.size(), 3968);
        assert_eq!(&pad.as_bytes()[40..48], b"100644  ");
    }

    #[test]
    fn test_pad_member_size() {
        // Already aligned: the data header ends on the boundary.
        assert_eq!(pad_member_size(4096 - 60), None);

        for offset in [8u64, 80, 1000, 4036 - 60, 4096, 10_000] {
            let size = pad_member_size(offset).unwrap();
            assert_eq!((offset + 60 + size + 60) % 4096, 0, "offset {}", offset);
            assert!(size < 4096);
            assert_eq!(size % 2, 0);
        }
    }
}

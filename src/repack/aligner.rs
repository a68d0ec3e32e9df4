//! Rewrites the payload tar so file data lands on block boundaries.
//!
//! Every entry is re-emitted with a fresh USTAR header. Non-empty regular
//! files are preceded by a PAX extended header whose `comment` record pads
//! the header block so that the file data starts at a multiple of
//! [`BLOCK_SIZE`] in the output.
//!
//! Tar records are 512 bytes long, so exact alignment needs a payload that
//! starts on a record boundary of the output. The `_data-pad` member
//! guarantees that; without it a misplaced payload is rewritten anyway and
//! reported with a warning.

use std::io::{self, Read, Write};

use tar::{Archive, Builder, EntryType, Header};

use crate::format::pax::{self, PaxRecords};
use crate::format::{BLOCK_SIZE, RECORD_SIZE, align_up};
use crate::sink::{OutputSink, TrackedWriter};
use crate::{Error, Result};

/// Name written into PAX extended headers.
const PAX_HEADER_NAME: &[u8] = b"././@PaxHeader";

/// Width of the USTAR name and link name fields.
const USTAR_NAME_LEN: usize = 100;

/// Counters collected while rewriting the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AlignStats {
    pub aligned_entries: u64,
    pub passthrough_entries: u64,
    pub filler_bytes: u64,
}

/// Streams the tar read from `payload` into `output`, aligning file data.
///
/// `data_start` is the output offset of the first payload byte. Alignment is
/// computed from absolute output offsets. On success the output has been
/// extended to the next block boundary.
pub(crate) fn align_payload<R, S>(
    payload: R,
    output: &mut TrackedWriter<S>,
    data_start: u64,
    level: log::Level,
) -> Result<AlignStats>
where
    R: Read,
    S: OutputSink,
{
    let mut stats = AlignStats::default();
    let mut archive = Archive::new(payload);
    let mut builder = Builder::new(&mut *output);
    let mut payload_offset = 0u64;

    let record_aligned = data_start % RECORD_SIZE == 0;
    if !record_aligned {
        log::warn!(
            "payload starts at offset {}, which is not a multiple of {}; file data cannot be block aligned",
            data_start,
            RECORD_SIZE
        );
    }

    let entries = archive
        .entries()
        .map_err(|e| decode_error(e, payload_offset, "payload header"))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| decode_error(e, payload_offset, "payload header"))?;
        let entry_offset = entry.raw_header_position();
        payload_offset = align_up(entry.raw_file_position() + entry.size(), RECORD_SIZE);

        let entry_type = entry.header().entry_type();
        if entry_type.is_gnu_sparse() {
            return Err(Error::corrupt_header(
                entry_offset,
                format!(
                    "sparse entry '{}' is not supported",
                    String::from_utf8_lossy(&entry.path_bytes())
                ),
            ));
        }

        let path = entry.path_bytes().into_owned();
        let link = entry.link_name_bytes().map(|l| l.into_owned());
        let size = entry.size();

        let mut records = PaxRecords::new();
        if path.len() > USTAR_NAME_LEN {
            records.push(pax::PATH_KEY.as_bytes(), &path);
        }
        if let Some(link) = link.as_deref().filter(|l| l.len() > USTAR_NAME_LEN) {
            records.push(pax::LINKPATH_KEY.as_bytes(), link);
        }
        if !entry_type.is_pax_global_extensions() {
            carry_records(&mut entry, &mut records, entry_offset)?;
        }

        let header = output_header(entry.header(), &path, link.as_deref(), size, entry_offset)?;
        let position = builder.get_ref().position();

        let aligned = is_regular(entry_type) && size > 0;
        if aligned {
            let fill = records.push_filler(position);
            stats.filler_bytes += fill;
            stats.aligned_entries += 1;
        } else {
            stats.passthrough_entries += 1;
        }

        if !records.is_empty() {
            let pax_header = extension_header(&header, records.len() as u64);
            builder.append(&pax_header, records.as_bytes())?;
        }

        if aligned {
            let file_offset = builder.get_ref().position() + RECORD_SIZE;
            debug_assert!(!record_aligned || file_offset % BLOCK_SIZE == 0);
            log::log!(
                level,
                "aligning {} ({} bytes) at offset {}",
                String::from_utf8_lossy(&path),
                size,
                file_offset
            );
        } else {
            log::trace!("copying {} ({:?})", String::from_utf8_lossy(&path), entry_type);
        }

        let data_offset = entry.raw_file_position();
        let mut data = ExactReader::new(&mut entry, size);
        if let Err(e) = builder.append(&header, &mut data) {
            return Err(if data.failed() {
                decode_error(e, data_offset, "entry data")
            } else {
                Error::Io(e)
            });
        }
    }

    let output = builder.into_inner()?;
    output.flush()?;
    output.extend_to_boundary(BLOCK_SIZE)?;

    Ok(stats)
}

/// Appends the input entry's PAX records that are not regenerated.
fn carry_records<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    records: &mut PaxRecords,
    offset: u64,
) -> Result<()> {
    let Some(extensions) = entry
        .pax_extensions()
        .map_err(|e| decode_error(e, offset, "PAX records"))?
    else {
        return Ok(());
    };

    for extension in extensions {
        let extension = extension
            .map_err(|e| Error::corrupt_header(offset, format!("malformed PAX record: {}", e)))?;
        let key = extension.key_bytes();
        if key == pax::PATH_KEY.as_bytes()
            || key == pax::LINKPATH_KEY.as_bytes()
            || key == pax::COMMENT_KEY.as_bytes()
        {
            continue;
        }
        records.push(key, extension.value_bytes());
    }
    Ok(())
}

fn is_regular(entry_type: EntryType) -> bool {
    matches!(entry_type, EntryType::Regular | EntryType::Continuous)
}

/// Builds the USTAR header written for an input entry.
fn output_header(
    input: &Header,
    path: &[u8],
    link: Option<&[u8]>,
    size: u64,
    offset: u64,
) -> Result<Header> {
    let entry_type = input.entry_type();
    let raw = input.as_old();
    let devices = input
        .as_ustar()
        .map(|u| (u.dev_major, u.dev_minor))
        .or_else(|| input.as_gnu().map(|g| (g.dev_major, g.dev_minor)));

    let mut header = Header::new_ustar();
    header.set_entry_type(entry_type);
    header.set_size(size);

    // Numeric fields are copied verbatim: blank fields and GNU base-256
    // values stay as they were.
    if let Some(ustar) = header.as_ustar_mut() {
        ustar.mode = raw.mode;
        ustar.uid = raw.uid;
        ustar.gid = raw.gid;
        ustar.mtime = raw.mtime;
        if entry_type.is_character_special() || entry_type.is_block_special() {
            let Some((major, minor)) = devices else {
                return Err(Error::corrupt_header(offset, "device entry without device numbers"));
            };
            ustar.dev_major = major;
            ustar.dev_minor = minor;
        }
        copy_field(&mut ustar.name, path);
        if let Some(link) = link {
            copy_field(&mut ustar.linkname, link);
        }
        copy_field(&mut ustar.uname, input.username_bytes().unwrap_or_default());
        copy_field(&mut ustar.gname, input.groupname_bytes().unwrap_or_default());
    }
    header.set_cksum();
    Ok(header)
}

/// Builds the `x` header carrying `records_len` bytes of PAX records.
fn extension_header(entry: &Header, records_len: u64) -> Header {
    let mut header = Header::new_ustar();
    header.set_entry_type(EntryType::XHeader);
    header.set_mode(0o644);
    header.set_mtime(entry.mtime().unwrap_or(0));
    header.set_size(records_len);
    if let Some(ustar) = header.as_ustar_mut() {
        copy_field(&mut ustar.name, PAX_HEADER_NAME);
    }
    header.set_cksum();
    header
}

/// Copies as much of `value` as fits, NUL-padding the remainder.
fn copy_field(field: &mut [u8], value: &[u8]) {
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value[..len]);
    field[len..].fill(0);
}

/// Maps payload decoding failures onto the crate error type.
fn decode_error(err: io::Error, offset: u64, context: &'static str) -> Error {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated { offset, context },
        io::ErrorKind::Other | io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
            Error::corrupt_header(offset, err.to_string())
        }
        _ => Error::Io(err),
    }
}

/// Reads exactly `remaining` bytes, failing if the source ends early.
struct ExactReader<R> {
    inner: R,
    remaining: u64,
    failed: bool,
}

impl<R: Read> ExactReader<R> {
    fn new(inner: R, len: u64) -> Self {
        Self {
            inner,
            remaining: len,
            failed: false,
        }
    }

    /// Returns `true` if a read from the source failed or ended early.
    fn failed(&self) -> bool {
        self.failed
    }
}

impl<R: Read> Read for ExactReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = buf.len().min(self.remaining.min(usize::MAX as u64) as usize);
        let n = match self.inner.read(&mut buf[..max]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Err(e),
            Err(e) => {
                self.failed = true;
                return Err(e);
            }
        };
        if n == 0 {
            self.failed = true;
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("entry data ended {} bytes early", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

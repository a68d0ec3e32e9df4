//! Walks the outer container up to the data member.

use std::io::{self, BufRead, Read, Write};

use crate::codec::Compression;
use crate::format::ar::{self, MemberHeader};
use crate::{Error, Result};

/// The data member located by [`ContainerScanner::find_data_member`].
#[derive(Debug)]
pub(crate) struct DataMember {
    pub header: MemberHeader,
    pub compression: Compression,
    /// Input offset of the member header.
    pub input_offset: u64,
}

/// Copies container members verbatim until the data member is reached.
pub(crate) struct ContainerScanner<R> {
    input: R,
    offset: u64,
    copied_members: usize,
}

impl<R: BufRead> ContainerScanner<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            offset: 0,
            copied_members: 0,
        }
    }

    /// Reads the container signature and copies it to `output`.
    pub fn copy_magic<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let mut magic = [0u8; 8];
        self.input
            .read_exact(&mut magic)
            .map_err(|e| Error::from_read(e, self.offset, "container signature"))?;
        if &magic != ar::MAGIC {
            return Err(Error::InvalidFormat(format!(
                "not a package container (signature {:?})",
                String::from_utf8_lossy(&magic)
            )));
        }
        output.write_all(&magic)?;
        self.offset += magic.len() as u64;
        Ok(())
    }

    /// Copies members to `output` until the data member header is read.
    ///
    /// The data member header itself is not copied. Its compression is
    /// resolved before returning, so an unsupported suffix fails with nothing
    /// of the data member written.
    pub fn find_data_member<W: Write>(&mut self, output: &mut W) -> Result<DataMember> {
        loop {
            let input_offset = self.offset;
            let raw = self.read_header()?.ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "no {} member in package ({} members copied)",
                    ar::DATA_PREFIX,
                    self.copied_members
                ))
            })?;
            let header = MemberHeader::parse(raw, input_offset)?;
            log::debug!(
                "member '{}' at offset {} ({} bytes)",
                header.name(),
                input_offset,
                header.size()
            );

            if let Some(suffix) = header.data_suffix() {
                let compression = Compression::from_suffix(suffix)?;
                return Ok(DataMember {
                    header,
                    compression,
                    input_offset,
                });
            }

            output.write_all(header.as_bytes())?;
            self.copy_exact(output, header.size() + header.alignment_len())?;
            self.copied_members += 1;
        }
    }

    /// Number of members copied so far.
    pub fn copied_members(&self) -> usize {
        self.copied_members
    }

    /// Current input offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the input, positioned after the last header read.
    pub fn into_inner(self) -> R {
        self.input
    }

    /// Reads a member header, returning `None` at a clean end of input.
    fn read_header(&mut self) -> Result<Option<[u8; ar::HEADER_SIZE]>> {
        let mut raw = [0u8; ar::HEADER_SIZE];
        let mut filled = 0;
        while filled < raw.len() {
            match self.input.read(&mut raw[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            n if n == raw.len() => {
                self.offset += n as u64;
                Ok(Some(raw))
            }
            n => Err(Error::Truncated {
                offset: self.offset + n as u64,
                context: "member header",
            }),
        }
    }

    fn copy_exact<W: Write>(&mut self, output: &mut W, len: u64) -> Result<()> {
        let copied = io::copy(&mut (&mut self.input).take(len), output)?;
        self.offset += copied;
        if copied < len {
            return Err(Error::Truncated {
                offset: self.offset,
                context: "member payload",
            });
        }
        Ok(())
    }
}

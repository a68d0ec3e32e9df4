//! Shared test utilities for integration tests.
//!
//! This module builds in-memory packages and takes repacked output apart
//! again so tests can check offsets and contents.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Cursor, Read};

use debalign::{Compression, RepackOptions, RepackSummary};

/// Builds a raw `ar` member: header, payload and alignment byte.
pub fn ar_member(name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
        name,
        1_700_000_000,
        0,
        0,
        100644,
        data.len()
    )
    .into_bytes();
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(b'\n');
    }
    out
}

/// Builds a package from raw members.
pub fn package(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = b"!<arch>\n".to_vec();
    for (name, data) in members {
        out.extend(ar_member(name, data));
    }
    out
}

/// A file to place in a test payload.
#[derive(Debug, Clone)]
pub struct TestEntry {
    pub path: String,
    pub kind: tar::EntryType,
    pub data: Vec<u8>,
    pub link: Option<String>,
}

impl TestEntry {
    pub fn file(path: &str, data: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            kind: tar::EntryType::Regular,
            data: data.to_vec(),
            link: None,
        }
    }

    pub fn dir(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: tar::EntryType::Directory,
            data: Vec::new(),
            link: None,
        }
    }

    pub fn symlink(path: &str, target: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: tar::EntryType::Symlink,
            data: Vec::new(),
            link: Some(target.to_string()),
        }
    }
}

/// Builds a GNU-format tar the way `dpkg-deb` does, with long names in
/// GNU extension entries.
pub fn tar_archive(entries: &[TestEntry]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(entry.kind);
        header.set_size(entry.data.len() as u64);
        header.set_mode(if entry.kind.is_dir() { 0o755 } else { 0o644 });
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(1_700_000_000);
        header.set_username("root").unwrap();
        header.set_groupname("root").unwrap();
        match &entry.link {
            Some(target) => builder
                .append_link(&mut header, &entry.path, target)
                .unwrap(),
            None => builder
                .append_data(&mut header, &entry.path, entry.data.as_slice())
                .unwrap(),
        }
    }
    builder.into_inner().unwrap()
}

/// Builds a tar of regular files.
pub fn tar_of_files(files: &[(&str, &[u8])]) -> Vec<u8> {
    let entries: Vec<TestEntry> = files
        .iter()
        .map(|(path, data)| TestEntry::file(path, data))
        .collect();
    tar_archive(&entries)
}

/// Compresses `data` for a `data.tar` member.
pub fn compress(compression: Compression, data: &[u8]) -> Vec<u8> {
    match compression {
        Compression::None => data.to_vec(),
        #[cfg(feature = "gzip")]
        Compression::Gzip => {
            use std::io::Write;
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        #[cfg(feature = "xz")]
        Compression::Xz => {
            use std::io::Write;
            let mut writer = lzma_rust2::XzWriter::new(
                Vec::new(),
                lzma_rust2::XzOptions::with_preset(6),
            )
            .unwrap();
            writer.write_all(data).unwrap();
            writer.finish().unwrap()
        }
        #[cfg(feature = "zstd")]
        Compression::Zstd => zstd::encode_all(Cursor::new(data), 3).unwrap(),
        #[allow(unreachable_patterns)]
        other => panic!("{} not enabled", other),
    }
}

/// Builds a typical binary package: `debian-binary`, a control member and
/// the payload compressed with `compression`.
pub fn deb(compression: Compression, payload_tar: &[u8]) -> Vec<u8> {
    let data_name = format!("data.tar{}", compression.suffix());
    let data = compress(compression, payload_tar);
    package(&[
        ("debian-binary", b"2.0\n" as &[u8]),
        ("control.tar.xz", b"not really a control archive"),
        (data_name.as_str(), data.as_slice()),
    ])
}

/// Repacks `input` into memory.
pub fn repack_to_vec(input: &[u8], options: RepackOptions) -> debalign::Result<(Vec<u8>, RepackSummary)> {
    let mut output = Vec::new();
    let summary = debalign::repack(input, Cursor::new(&mut output), options)?;
    Ok((output, summary))
}

/// A member of a parsed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub header_offset: usize,
    pub data_offset: usize,
    pub size: usize,
}

/// Splits a package into members, checking the container structure.
pub fn members(package: &[u8]) -> Vec<Member> {
    assert_eq!(&package[..8], b"!<arch>\n");
    let mut out = Vec::new();
    let mut offset = 8;
    while offset < package.len() {
        let header = &package[offset..offset + 60];
        assert_eq!(&header[58..60], b"`\n", "header at {}", offset);
        let name = String::from_utf8_lossy(&header[..16]).trim_end().to_string();
        let size: usize = std::str::from_utf8(&header[48..58])
            .unwrap()
            .trim_end()
            .parse()
            .unwrap();
        out.push(Member {
            name,
            header_offset: offset,
            data_offset: offset + 60,
            size,
        });
        offset += 60 + size + size % 2;
    }
    out
}

/// Returns the data member of a repacked package.
pub fn data_member(package: &[u8]) -> Member {
    members(package)
        .into_iter()
        .find(|m| m.name.starts_with("data.tar"))
        .expect("no data member")
}

/// An entry read back from a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    pub path: Vec<u8>,
    pub kind: tar::EntryType,
    pub data: Vec<u8>,
    /// Offset of the entry data within the payload.
    pub data_offset: u64,
}

/// Reads every entry of an uncompressed tar.
pub fn payload_entries(tar: &[u8]) -> Vec<PayloadEntry> {
    let mut archive = tar::Archive::new(tar);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let mut data = Vec::new();
            let path = entry.path_bytes().into_owned();
            let kind = entry.header().entry_type();
            let data_offset = entry.raw_file_position();
            entry.read_to_end(&mut data).unwrap();
            PayloadEntry {
                path,
                kind,
                data,
                data_offset,
            }
        })
        .collect()
}

/// Returns the `(path, type, content)` triples of a payload.
pub fn contents(tar: &[u8]) -> Vec<(Vec<u8>, tar::EntryType, Vec<u8>)> {
    payload_entries(tar)
        .into_iter()
        .map(|e| (e.path, e.kind, e.data))
        .collect()
}

/// Asserts that a repacked package satisfies every layout invariant and
/// returns its payload.
pub fn assert_aligned(output: &[u8]) -> Vec<u8> {
    assert_eq!(output.len() % 4096, 0, "output length {}", output.len());

    let data = data_member(output);
    assert_eq!(data.name, "data.tar");
    assert_eq!(data.data_offset + data.size, output.len());

    let payload = &output[data.data_offset..];
    for entry in payload_entries(payload) {
        if entry.kind == tar::EntryType::Regular && !entry.data.is_empty() {
            let absolute = data.data_offset as u64 + entry.data_offset;
            assert_eq!(
                absolute % 4096,
                0,
                "{} starts at {}",
                String::from_utf8_lossy(&entry.path),
                absolute
            );
        }
    }
    payload.to_vec()
}

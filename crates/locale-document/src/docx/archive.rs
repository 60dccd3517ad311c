// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zip member I/O shared by template documents and localisation packages.
//
// Member order is preserved on both read and write so a re-serialised
// document keeps `[Content_Types].xml` first, which Word expects.

use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Path prefix of a document's embedded media collection.
pub const MEDIA_PREFIX: &str = "word/media/";

/// One file inside a zip archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub name: String,
    pub data: Vec<u8>,
}

impl ArchiveMember {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Read every file member (directories skipped) in archive order.
pub fn read_members(bytes: &[u8]) -> ZipResult<Vec<ArchiveMember>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut data = Vec::with_capacity(capacity_hint(entry.size()));
        entry.read_to_end(&mut data)?;
        members.push(ArchiveMember { name, data });
    }
    debug!(members = members.len(), "archive read");
    Ok(members)
}

/// Upper bound on buffer space reserved up front from a member's declared
/// size. The declaration comes from the archive and is not trusted.
const MAX_RESERVED: u64 = 1 << 20;

fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_RESERVED)).unwrap_or(0)
}

/// Write members to a new zip archive in the order given.
///
/// Media files are STORED and everything else DEFLATED, the layout Word
/// itself produces.
pub fn write_members<'a, I>(members: I) -> ZipResult<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut count = 0usize;
    for (name, data) in members {
        let options = if name.starts_with(MEDIA_PREFIX) {
            stored
        } else {
            deflated
        };
        zip.start_file(name, options)?;
        zip.write_all(data)?;
        count += 1;
    }
    let bytes = zip.finish()?.into_inner();
    debug!(members = count, bytes = bytes.len(), "archive written");
    Ok(bytes)
}

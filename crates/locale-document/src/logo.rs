// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Logo replacement — swap the placeholder logo inside a document's embedded
// media for the site logo.
//
// The document is unpacked into a scratch directory unique to the operation,
// the matching media file is overwritten on disk, and the archive is rebuilt
// from the scratch tree. The scratch directory is removed when the
// `ScratchSpace` drops, on success and on every error path.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use locale_core::error::{LocaleError, Result};
use locale_core::types::{Fingerprint, LogoOutcome, OperationId};
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;

use crate::docx::{MEDIA_PREFIX, archive};
use crate::image::{ImageProcessor, find_match};

/// Per-operation scratch directory.
#[derive(Debug)]
pub struct ScratchSpace {
    operation: OperationId,
    dir: TempDir,
}

impl ScratchSpace {
    /// Create `locale-<operation id>-*` under `root`, or under the system
    /// temp dir when `root` is `None`.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let operation = OperationId::new();
        let mut builder = tempfile::Builder::new();
        let prefix = format!("locale-{operation}-");
        builder.prefix(&prefix);
        let dir = match root {
            Some(root) => {
                fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        debug!(operation = %operation, path = %dir.path().display(), "scratch space created");
        Ok(Self { operation, dir })
    }

    pub fn operation(&self) -> OperationId {
        self.operation
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Result of replacing the logo in one document.
#[derive(Debug, Clone)]
pub struct LogoReplacement {
    /// Document bytes; the input unchanged unless `outcome` is `Replaced`.
    pub bytes: Vec<u8>,
    pub outcome: LogoOutcome,
}

/// Replaces the placeholder logo, identified by fingerprint, with a site
/// logo.
#[derive(Debug, Clone)]
pub struct LogoReplacer {
    placeholder: Fingerprint,
    replacement: Vec<u8>,
    scratch_root: Option<PathBuf>,
}

impl LogoReplacer {
    pub fn new(placeholder: Fingerprint, replacement: Vec<u8>) -> Self {
        Self {
            placeholder,
            replacement,
            scratch_root: None,
        }
    }

    /// Put scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Replace the placeholder logo in one .docx.
    ///
    /// A missing placeholder or an unusable replacement image is not an
    /// error: the document comes back unchanged with the matching
    /// [`LogoOutcome`]. Errors are reserved for unreadable archives and I/O.
    #[instrument(skip(self, document_bytes), fields(document = document_name))]
    pub fn replace(&self, document_name: &str, document_bytes: &[u8]) -> Result<LogoReplacement> {
        let scratch = ScratchSpace::create(self.scratch_root.as_deref())?;
        let order = unpack(document_name, document_bytes, scratch.path())?;

        let media = read_media(scratch.path(), &order)?;
        let candidates = media.iter().map(|(name, data)| (name.as_str(), data.as_slice()));
        let Some(member) = find_match(candidates, &self.placeholder) else {
            info!(document = document_name, "placeholder logo not found");
            return Ok(LogoReplacement {
                bytes: document_bytes.to_vec(),
                outcome: LogoOutcome::NotFound,
            });
        };
        let member = member.to_string();

        if let Err(err) = ImageProcessor::from_bytes(&self.replacement) {
            warn!(document = document_name, error = %err, "replacement logo unusable, skipped");
            return Ok(LogoReplacement {
                bytes: document_bytes.to_vec(),
                outcome: LogoOutcome::Skipped {
                    reason: err.to_string(),
                },
            });
        }

        fs::write(scratch.path().join(&member), &self.replacement)?;
        let bytes = repack(document_name, scratch.path(), &order)?;
        info!(
            document = document_name,
            member = %member,
            operation = %scratch.operation(),
            "placeholder logo replaced"
        );
        Ok(LogoReplacement {
            bytes,
            outcome: LogoOutcome::Replaced { member },
        })
    }
}

/// Extract every file member into `root`, returning member names in
/// archive order. Members whose names escape `root` are rejected.
fn unpack(document_name: &str, bytes: &[u8], root: &Path) -> Result<Vec<String>> {
    let format_error = |reason: String| LocaleError::DocumentFormat {
        document: document_name.to_string(),
        reason,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| format_error(format!("not a valid .docx archive: {err}")))?;
    let mut order = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| format_error(format!("unreadable member: {err}")))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            return Err(format_error(format!(
                "member '{}' escapes the archive root",
                entry.name()
            )));
        };
        let target = root.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut file)?;
        order.push(entry.name().to_string());
    }
    debug!(members = order.len(), "document unpacked");
    Ok(order)
}

/// Media members, sorted by name.
fn read_media(root: &Path, order: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut names: Vec<&String> = order
        .iter()
        .filter(|name| name.starts_with(MEDIA_PREFIX))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| Ok((name.clone(), fs::read(root.join(name))?)))
        .collect()
}

/// Rebuild the archive from the scratch tree in the original member order.
fn repack(document_name: &str, root: &Path, order: &[String]) -> Result<Vec<u8>> {
    let contents = order
        .iter()
        .map(|name| Ok((name.as_str(), fs::read(root.join(name))?)))
        .collect::<Result<Vec<(&str, Vec<u8>)>>>()?;
    archive::write_members(contents.iter().map(|(name, data)| (*name, data.as_slice()))).map_err(
        |err| LocaleError::DocumentFormat {
            document: document_name.to_string(),
            reason: format!("failed to repack: {err}"),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::TemplateDocument;
    use crate::fixtures::{DocxBuilder, logo_png, other_logo_png};
    use crate::image::fingerprint;

    fn media_of(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let doc = TemplateDocument::open("t.docx", bytes).unwrap();
        doc.media()
            .map(|(name, data)| (name.to_string(), data.to_vec()))
            .collect()
    }

    #[test]
    fn replaces_matching_member_only() {
        let placeholder = logo_png(40, 40);
        let unrelated = other_logo_png(40, 40);
        let site_logo = other_logo_png(120, 60);
        let bytes = DocxBuilder::new()
            .paragraph("Dear <<PI name>>")
            .image("image1.png", unrelated.clone())
            .image("image2.png", placeholder.clone())
            .build();

        let scratch = tempfile::tempdir().unwrap();
        let replacer = LogoReplacer::new(fingerprint(&placeholder).unwrap(), site_logo.clone())
            .with_scratch_root(scratch.path());
        let result = replacer.replace("letter.docx", &bytes).unwrap();

        assert_eq!(
            result.outcome,
            LogoOutcome::Replaced {
                member: "word/media/image2.png".into()
            }
        );
        let media = media_of(&result.bytes);
        assert_eq!(media[0], ("word/media/image1.png".to_string(), unrelated));
        assert_eq!(media[1], ("word/media/image2.png".to_string(), site_logo));

        let text: Vec<String> = TemplateDocument::open("letter.docx", &result.bytes)
            .unwrap()
            .paragraphs()
            .into_iter()
            .map(|p| p.text)
            .collect();
        assert!(text.contains(&"Dear <<PI name>>".to_string()));
    }

    #[test]
    fn missing_placeholder_leaves_document_unchanged() {
        let bytes = DocxBuilder::new()
            .image("image1.png", other_logo_png(40, 40))
            .build();
        let replacer = LogoReplacer::new(fingerprint(&logo_png(40, 40)).unwrap(), logo_png(10, 10));
        let result = replacer.replace("t.docx", &bytes).unwrap();
        assert_eq!(result.outcome, LogoOutcome::NotFound);
        assert_eq!(result.bytes, bytes);
    }

    #[test]
    fn document_without_media_is_not_found() {
        let bytes = DocxBuilder::new().paragraph("text only").build();
        let replacer = LogoReplacer::new(fingerprint(&logo_png(40, 40)).unwrap(), logo_png(10, 10));
        assert_eq!(replacer.replace("t.docx", &bytes).unwrap().outcome, LogoOutcome::NotFound);
    }

    #[test]
    fn empty_replacement_is_skipped() {
        let placeholder = logo_png(40, 40);
        let bytes = DocxBuilder::new().image("image1.png", placeholder.clone()).build();
        let replacer = LogoReplacer::new(fingerprint(&placeholder).unwrap(), Vec::new());
        let result = replacer.replace("t.docx", &bytes).unwrap();
        assert!(matches!(result.outcome, LogoOutcome::Skipped { .. }));
        assert_eq!(result.bytes, bytes);
    }

    #[test]
    fn undecodable_replacement_is_skipped() {
        let placeholder = logo_png(40, 40);
        let bytes = DocxBuilder::new().image("image1.png", placeholder.clone()).build();
        let replacer = LogoReplacer::new(fingerprint(&placeholder).unwrap(), b"GIF89a?".to_vec());
        let result = replacer.replace("t.docx", &bytes).unwrap();
        assert!(matches!(result.outcome, LogoOutcome::Skipped { .. }));
    }

    #[test]
    fn scratch_is_removed_after_every_call() {
        let root = tempfile::tempdir().unwrap();
        let placeholder = logo_png(40, 40);
        let bytes = DocxBuilder::new().image("image1.png", placeholder.clone()).build();
        let replacer = LogoReplacer::new(fingerprint(&placeholder).unwrap(), logo_png(8, 8))
            .with_scratch_root(root.path());

        replacer.replace("t.docx", &bytes).unwrap();
        assert!(replacer.replace("broken.docx", b"not a zip").is_err());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn scratch_spaces_are_unique() {
        let a = ScratchSpace::create(None).unwrap();
        let b = ScratchSpace::create(None).unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.operation(), b.operation());
    }

    #[test]
    fn escaping_member_is_rejected() {
        let bytes = archive::write_members([
            ("word/document.xml", b"<w:document/>".as_slice()),
            ("../evil.txt", b"x".as_slice()),
        ])
        .unwrap();
        let root = tempfile::tempdir().unwrap();
        let err = unpack("evil.docx", &bytes, root.path()).unwrap_err();
        assert!(matches!(err, LocaleError::DocumentFormat { .. }));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Docx module — zip member I/O, WordprocessingML tag scanning, and the
// scoped template document model.

pub mod archive;
pub mod document;
pub(crate) mod xml;

pub use archive::{ArchiveMember, MEDIA_PREFIX};
pub use document::{Paragraph, Scope, SectionVariant, TemplateDocument};

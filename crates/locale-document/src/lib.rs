// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// locale-document — Template document processing for the LOCALE engine.
//
// Opens .docx templates and walks every text scope (body, table cells,
// headers and footers with their page variants), extracts delimiter-bounded
// variables, substitutes localisation values, and finds and replaces the
// placeholder logo by perceptual fingerprint.

pub mod docx;
pub mod extract;
pub mod image;
pub mod logo;
pub mod substitute;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

// Re-export the primary types so callers can use `locale_document::TemplateDocument` etc.
pub use docx::{Paragraph, Scope, SectionVariant, TemplateDocument};
pub use extract::{extract_tokens, extract_variables};
pub use image::{ImageProcessor, find_match, fingerprint};
pub use logo::{LogoReplacement, LogoReplacer, ScratchSpace};
pub use substitute::{SubstitutionEngine, Substitutions};

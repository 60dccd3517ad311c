// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordination-side extraction — build a draft manifest from a zip of
// templates.

use locale_core::error::Result;
use locale_core::types::{Delimiters, Diagnostic, ManifestRow};
use locale_document::{TemplateDocument, extract_variables};
use tracing::{info, instrument, warn};

use crate::intake::unpack_templates;
use crate::manifest::Manifest;

/// Draft manifest plus the templates that could not be read.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub manifest: Manifest,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract every variable from every template in `zip_bytes`.
///
/// Produces one row per (document, variable) with `document_type` and
/// `localisation` blank for the coordinator to fill. Templates are taken in
/// archive order, variables in sorted order. A template that fails to open is
/// skipped with an `ExtractionSkipped` diagnostic.
#[instrument(skip(zip_bytes, delimiters), fields(bytes_len = zip_bytes.len()))]
pub fn extract_package(
    zip_bytes: &[u8],
    delimiters: &Delimiters,
    manifest_file_name: &str,
) -> Result<Extraction> {
    delimiters.validate()?;
    let templates = unpack_templates(zip_bytes)?;

    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();
    for template in &templates {
        let document = match TemplateDocument::open(&template.name, &template.bytes) {
            Ok(document) => document,
            Err(err) => {
                let diagnostic = Diagnostic::ExtractionSkipped {
                    document: template.name.clone(),
                    reason: err.to_string(),
                };
                warn!(%diagnostic, "template skipped");
                diagnostics.push(diagnostic);
                continue;
            }
        };
        let variables = extract_variables(&document, delimiters)?;
        info!(document = %template.name, variables = variables.len(), "variables extracted");
        rows.extend(
            variables
                .into_iter()
                .map(|variable| ManifestRow::blank(template.name.clone(), variable)),
        );
    }

    Ok(Extraction {
        manifest: Manifest::from_rows(manifest_file_name, rows),
        diagnostics,
    })
}

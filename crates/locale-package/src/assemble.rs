// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output assembly — the site package of localised documents plus the final
// manifest.

use std::collections::BTreeSet;

use locale_core::error::{LocaleError, Result};
use locale_document::docx::archive;
use tracing::{info, instrument};

/// Name of a localised document in the output package.
pub fn output_name(prefix: &str, template_name: &str) -> String {
    format!("{prefix}{template_name}")
}

/// Zip `documents` (already carrying their output names) and the manifest.
///
/// Members are written in the order given, manifest last.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn assemble_output(
    documents: &[(String, Vec<u8>)],
    manifest_file_name: &str,
    manifest_csv: &[u8],
) -> Result<Vec<u8>> {
    let members = documents
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .chain(std::iter::once((manifest_file_name, manifest_csv)));
    let bytes = archive::write_members(members)
        .map_err(|err| LocaleError::PackageFormat(format!("failed to write output: {err}")))?;
    info!(bytes = bytes.len(), "output package assembled");
    Ok(bytes)
}

/// Check that an output package holds exactly one prefixed member per
/// template plus the manifest, and nothing else.
pub fn verify_output_package(
    bytes: &[u8],
    template_names: &BTreeSet<String>,
    output_prefix: &str,
    manifest_file_name: &str,
) -> Result<()> {
    let members = archive::read_members(bytes)
        .map_err(|err| LocaleError::PackageFormat(err.to_string()))?;
    let actual: BTreeSet<String> = members.into_iter().map(|m| m.name).collect();
    let expected: BTreeSet<String> = template_names
        .iter()
        .map(|name| output_name(output_prefix, name))
        .chain(std::iter::once(manifest_file_name.to_string()))
        .collect();

    if actual == expected {
        return Ok(());
    }
    Err(LocaleError::OutputMismatch {
        unexpected: actual.difference(&expected).cloned().collect(),
        missing: expected.difference(&actual).cloned().collect(),
    })
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Each returns the run's diagnostics so the
// caller can print them; fatal conditions come back as errors.

use std::path::Path;

use locale_core::LocaleConfig;
use locale_core::config::DEFAULT_MANIFEST_FILE;
use locale_core::error::Result;
use locale_core::types::Diagnostic;
use locale_package::{Manifest, Pipeline, carry_over, extract_package};
use tracing::{info, instrument};

/// Coordination side: draft manifest from a zip of templates.
#[instrument(skip_all, fields(templates = %templates.display()))]
pub fn extract(config: &LocaleConfig, templates: &Path, output: &Path) -> Result<Vec<Diagnostic>> {
    let bytes = std::fs::read(templates)?;
    let extraction = extract_package(&bytes, &config.delimiters, &config.manifest_file_name)?;
    std::fs::write(output, extraction.manifest.to_csv(false)?)?;

    println!(
        "Wrote {} variable(s) from {} document(s) to {}",
        extraction.manifest.rows().len(),
        extraction.manifest.document_names().len(),
        output.display()
    );
    println!("Fill in document_type, then zip the templates, placeholder logo and manifest.");
    Ok(extraction.diagnostics)
}

/// Site side: validate a package and write the manifest to review, one row
/// per paragraph occurrence.
#[instrument(skip_all, fields(package = %package.display()))]
pub fn inspect(
    config: LocaleConfig,
    package: &Path,
    previous: Option<&Path>,
    output: &Path,
) -> Result<Vec<Diagnostic>> {
    let bytes = std::fs::read(package)?;
    let unpacked = Pipeline::unpack(&bytes, config)?;
    let logo = unpacked.placeholder_logo();
    println!(
        "Placeholder logo '{}' is {}x{} px; supply the site logo at the same size.",
        logo.name, logo.width, logo.height
    );

    let validated = unpacked.validate()?;
    let mut diagnostics = validated.diagnostics().to_vec();
    let (mut rows, review_diagnostics) = validated.review_rows();
    diagnostics.extend(review_diagnostics);

    if let Some(path) = previous {
        let previous = read_manifest(path)?;
        let filled = carry_over(&mut rows, &previous)?;
        info!(filled, "values carried over");
        println!("Carried over {filled} value(s) from {}", path.display());
    }

    let review = Manifest::from_rows(validated.config().manifest_file_name.clone(), rows);
    std::fs::write(output, review.to_csv(true)?)?;
    println!(
        "Wrote {} row(s) for {} document(s) to {}",
        review.rows().len(),
        validated.store().len(),
        output.display()
    );
    Ok(diagnostics)
}

/// Site side: full localisation run.
#[instrument(skip_all, fields(package = %package.display()))]
pub fn localise(
    config: LocaleConfig,
    package: &Path,
    logo: &Path,
    manifest: Option<&Path>,
    output: &Path,
    report: Option<&Path>,
) -> Result<Vec<Diagnostic>> {
    let package_bytes = std::fs::read(package)?;
    let site_logo = std::fs::read(logo)?;
    let manifest = manifest.map(read_manifest).transpose()?;

    let assembled = locale_package::localise(&package_bytes, site_logo, manifest, config)?;
    let (bytes, run_report) = assembled.into_parts();
    std::fs::write(output, &bytes)?;
    if let Some(path) = report {
        std::fs::write(path, serde_json::to_vec_pretty(&run_report)?)?;
    }

    println!(
        "Localised {} document(s) into {}",
        run_report.documents.len(),
        output.display()
    );
    Ok(run_report.diagnostics)
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_MANIFEST_FILE);
    Manifest::from_csv(&bytes, name)
}

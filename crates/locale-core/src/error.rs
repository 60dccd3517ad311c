// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for LOCALE.
//
// Structural errors (archive, components, schema, name sets) abort a run
// before any document is touched. Per-document content problems are not
// errors at all: they are reported as `Diagnostic` values (see types.rs).

use std::collections::BTreeSet;

use thiserror::Error;

use crate::types::PackageComponent;

/// Top-level error type for all LOCALE operations.
#[derive(Debug, Error)]
pub enum LocaleError {
    // -- Package errors --
    #[error("package archive is unreadable: {0}")]
    PackageFormat(String),

    #[error("package is missing required components: {}", join_components(.missing))]
    MissingComponent { missing: Vec<PackageComponent> },

    #[error("template name '{0}' appears more than once in the package")]
    DuplicateTemplate(String),

    // -- Manifest errors --
    #[error("'{file}' is missing required columns: {}", .missing.join(", "))]
    Schema { file: String, missing: Vec<String> },

    #[error("'{file}' line {line}: {reason}")]
    InvalidRow {
        file: String,
        line: u64,
        reason: String,
    },

    #[error(
        "document lists do not match (present in manifest only: {}; present in templates only: {})",
        join_names(.manifest_only),
        join_names(.templates_only)
    )]
    SetMismatch {
        manifest_only: BTreeSet<String>,
        templates_only: BTreeSet<String>,
    },

    #[error(
        "conflicting localisation values for {variable} in '{document}': {}",
        .values.join(" / ")
    )]
    ConflictingLocalisation {
        document: String,
        variable: String,
        values: Vec<String>,
    },

    #[error("invalid variable delimiters: {0}")]
    InvalidDelimiters(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Document errors --
    #[error("document '{document}' could not be processed: {reason}")]
    DocumentFormat { document: String, reason: String },

    #[error("placeholder logo '{name}' is not a usable image: {reason}")]
    PlaceholderLogo { name: String, reason: String },

    #[error("image processing failed: {0}")]
    InvalidImage(String),

    #[error(
        "output package members do not match (unexpected: {}; missing: {})",
        join_names(.unexpected),
        join_names(.missing)
    )]
    OutputMismatch {
        unexpected: BTreeSet<String>,
        missing: BTreeSet<String>,
    },

    // -- I/O and serialisation --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LocaleError>;

fn join_names(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn join_components(components: &[PackageComponent]) -> String {
    components
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

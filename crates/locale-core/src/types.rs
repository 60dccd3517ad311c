// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the LOCALE localisation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LocaleError, Result};

/// Unique identifier for one document-processing operation or pipeline run.
///
/// Used to key per-operation scratch storage so overlapping invocations never
/// share a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prefix/suffix pair bounding a variable token, e.g. `<<` and `>>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub prefix: String,
    pub suffix: String,
}

impl Delimiters {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Reject pairs that cannot bound a token.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(LocaleError::InvalidDelimiters("prefix is empty".into()));
        }
        if self.suffix.is_empty() {
            return Err(LocaleError::InvalidDelimiters("suffix is empty".into()));
        }
        Ok(())
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("<<", ">>")
    }
}

/// The three things a coordination package must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageComponent {
    /// At least one `.docx` template.
    Templates,
    /// One PNG/JPEG placeholder logo outside any document.
    PlaceholderLogo,
    /// The `localisation.csv` manifest.
    Manifest,
}

impl std::fmt::Display for PackageComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Templates => write!(f, "template documents (.docx)"),
            Self::PlaceholderLogo => write!(f, "placeholder logo (.png/.jpg/.jpeg)"),
            Self::Manifest => write!(f, "localisation manifest"),
        }
    }
}

/// One row of `localisation.csv`.
///
/// `related_paragraph` is an audit aid: the paragraph text in which the
/// variable was found. It is absent from coordination manifests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManifestRow {
    pub document_type: String,
    pub document_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_paragraph: Option<String>,
    pub variable: String,
    #[serde(default)]
    pub localisation: String,
}

impl ManifestRow {
    /// A fresh row as produced by coordination-side extraction: document
    /// type left blank for the operator and no localisation yet.
    pub fn blank(document_name: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            document_type: String::new(),
            document_name: document_name.into(),
            related_paragraph: None,
            variable: variable.into(),
            localisation: String::new(),
        }
    }
}

/// How to treat several rows for the same (document_name, variable) whose
/// localisation values differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `ConflictingLocalisation`.
    #[default]
    Reject,
    /// The last non-empty value read is authoritative.
    LastWins,
}

/// Order in which a paragraph's (token, value) pairs are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// Every pair is tried in list order against the latest paragraph text,
    /// so all distinct tokens resolve in one pass.
    #[default]
    Sequential,
    /// Stop after the first pair that changed the paragraph.
    FirstMatch,
}

/// 64-bit average-hash fingerprint of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Number of differing bits.
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Exact-match policy: only zero distance counts.
    pub fn matches(&self, other: &Fingerprint) -> bool {
        self.distance(other) == 0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Non-fatal, per-document conditions. A batch carries on past every one of
/// these; they are returned to the caller and logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A template could not be opened for extraction and was skipped.
    ExtractionSkipped { document: String, reason: String },
    /// The placeholder logo fingerprint is absent from the document's media.
    LogoNotFound { document: String },
    /// The replacement logo was empty or undecodable.
    InvalidReplacementImage { document: String, reason: String },
    /// The document could not be unpacked, patched or re-opened during logo
    /// replacement. Its substituted text is kept.
    LogoReplacementFailed { document: String, reason: String },
    /// A manifest variable does not occur anywhere in the document.
    VariableNotFound { document: String, variable: String },
    /// A manifest row has no localisation value; the token is left in place.
    EmptyLocalisation { document: String, variable: String },
}

impl Diagnostic {
    /// Name of the document the diagnostic refers to.
    pub fn document(&self) -> &str {
        match self {
            Self::ExtractionSkipped { document, .. }
            | Self::LogoNotFound { document }
            | Self::InvalidReplacementImage { document, .. }
            | Self::LogoReplacementFailed { document, .. }
            | Self::VariableNotFound { document, .. }
            | Self::EmptyLocalisation { document, .. } => document,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtractionSkipped { document, reason } => {
                write!(f, "skipping '{document}': {reason}")
            }
            Self::LogoNotFound { document } => {
                write!(f, "placeholder logo not found in '{document}'")
            }
            Self::InvalidReplacementImage { document, reason } => {
                write!(f, "logo in '{document}' left unchanged: {reason}")
            }
            Self::LogoReplacementFailed { document, reason } => {
                write!(f, "logo replacement failed for '{document}': {reason}")
            }
            Self::VariableNotFound { document, variable } => {
                write!(f, "{variable} does not occur in '{document}'")
            }
            Self::EmptyLocalisation { document, variable } => {
                write!(f, "no localisation value for {variable} in '{document}'")
            }
        }
    }
}

/// Stages of a site-side localisation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Unpacked,
    Validated,
    Substituted,
    LogoReplaced,
    Assembled,
}

/// What happened to the placeholder logo inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LogoOutcome {
    /// The media member was overwritten with the site logo.
    Replaced { member: String },
    /// No media member matched the placeholder fingerprint.
    NotFound,
    /// A match existed but the replacement image was unusable.
    Skipped { reason: String },
    /// The document itself could not be processed.
    Failed { reason: String },
}

/// Per-document record in a run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document_name: String,
    pub output_name: String,
    /// SHA-256 of the template bytes as received.
    pub input_hash: String,
    /// SHA-256 of the localised document bytes.
    pub output_hash: String,
    pub paragraphs_rewritten: usize,
    pub logo: LogoOutcome,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub operation_id: OperationId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: Vec<DocumentReport>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delimiters_are_chevrons() {
        let delimiters = Delimiters::default();
        assert_eq!(delimiters.prefix, "<<");
        assert_eq!(delimiters.suffix, ">>");
        assert!(delimiters.validate().is_ok());
    }

    #[test]
    fn empty_delimiters_rejected() {
        assert!(matches!(
            Delimiters::new("", ">>").validate(),
            Err(LocaleError::InvalidDelimiters(_))
        ));
        assert!(matches!(
            Delimiters::new("{{", "").validate(),
            Err(LocaleError::InvalidDelimiters(_))
        ));
    }

    #[test]
    fn fingerprint_distance_is_hamming() {
        let a = Fingerprint(0b1011);
        let b = Fingerprint(0b0001);
        assert_eq!(a.distance(&b), 2);
        assert!(!a.matches(&b));
        assert!(a.matches(&a));
    }

    #[test]
    fn fingerprint_displays_as_fixed_width_hex() {
        assert_eq!(Fingerprint(0xff).to_string(), "00000000000000ff");
    }

    #[test]
    fn diagnostic_serialises_with_kind_tag() {
        let diagnostic = Diagnostic::LogoNotFound {
            document: "letter.docx".into(),
        };
        let json = serde_json::to_string(&diagnostic).unwrap();
        assert!(json.contains("\"kind\":\"logo_not_found\""));
        assert_eq!(diagnostic.document(), "letter.docx");
    }

    #[test]
    fn operation_ids_are_unique() {
        assert_ne!(OperationId::new(), OperationId::new());
    }
}

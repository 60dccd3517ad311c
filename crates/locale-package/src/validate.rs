// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manifest validation — cross-check a manifest against the templates it
// describes and turn it into per-document substitution lists.

use std::collections::{BTreeMap, BTreeSet};

use locale_core::error::{LocaleError, Result};
use locale_core::types::{Diagnostic, DuplicatePolicy, ManifestRow};
use locale_document::Substitutions;
use tracing::{debug, instrument, warn};

use crate::manifest::Manifest;
use crate::store::DocumentStore;

/// Variables the manifest expects in each document, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedTokens {
    by_document: BTreeMap<String, Vec<String>>,
}

impl ExpectedTokens {
    fn from_manifest(manifest: &Manifest) -> Self {
        let mut by_document: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in manifest.rows() {
            let tokens = by_document.entry(row.document_name.clone()).or_default();
            if !tokens.contains(&row.variable) {
                tokens.push(row.variable.clone());
            }
        }
        Self { by_document }
    }

    pub fn for_document(&self, document_name: &str) -> &[String] {
        self.by_document
            .get(document_name)
            .map_or(&[], |tokens| tokens.as_slice())
    }
}

/// Substitution lists per document, plus what was left out and why.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionPlan {
    pub by_document: BTreeMap<String, Substitutions>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SubstitutionPlan {
    pub fn for_document(&self, document_name: &str) -> Option<&Substitutions> {
        self.by_document.get(document_name)
    }
}

/// Checks manifests against packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestValidator {
    policy: DuplicatePolicy,
}

impl ManifestValidator {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    /// The manifest's document names must equal the template names exactly.
    /// A mismatch reports both directions.
    #[instrument(skip_all, fields(manifest = manifest.file_name(), templates = template_names.len()))]
    pub fn validate(
        &self,
        manifest: &Manifest,
        template_names: &BTreeSet<String>,
    ) -> Result<ExpectedTokens> {
        let manifest_names = manifest.document_names();
        if &manifest_names != template_names {
            let manifest_only: BTreeSet<String> =
                manifest_names.difference(template_names).cloned().collect();
            let templates_only: BTreeSet<String> =
                template_names.difference(&manifest_names).cloned().collect();
            warn!(?manifest_only, ?templates_only, "document lists do not match");
            return Err(LocaleError::SetMismatch {
                manifest_only,
                templates_only,
            });
        }
        let expected = ExpectedTokens::from_manifest(manifest);
        debug!(documents = manifest_names.len(), "manifest matches templates");
        Ok(expected)
    }

    /// Rows for operator review: one per paragraph containing an expected
    /// variable, with the paragraph text as `related_paragraph`.
    ///
    /// A variable found nowhere in its document still gets one row (with an
    /// empty `related_paragraph`) and a `VariableNotFound` diagnostic.
    #[instrument(skip_all)]
    pub fn review_rows(
        &self,
        manifest: &Manifest,
        expected: &ExpectedTokens,
        store: &DocumentStore,
    ) -> (Vec<ManifestRow>, Vec<Diagnostic>) {
        let mut rows = Vec::new();
        let mut diagnostics = Vec::new();

        for (name, stored) in store.iter() {
            let document_type = manifest.document_type(name).unwrap_or("").to_string();
            let paragraphs = stored.document.paragraphs();
            for variable in expected.for_document(name) {
                let mut found = false;
                for paragraph in paragraphs.iter().filter(|p| p.text.contains(variable.as_str())) {
                    found = true;
                    rows.push(ManifestRow {
                        document_type: document_type.clone(),
                        document_name: name.to_string(),
                        related_paragraph: Some(paragraph.text.clone()),
                        variable: variable.clone(),
                        localisation: String::new(),
                    });
                }
                if !found {
                    let diagnostic = Diagnostic::VariableNotFound {
                        document: name.to_string(),
                        variable: variable.clone(),
                    };
                    warn!(%diagnostic, "variable missing from document");
                    diagnostics.push(diagnostic);
                    rows.push(ManifestRow {
                        document_type: document_type.clone(),
                        document_name: name.to_string(),
                        related_paragraph: Some(String::new()),
                        variable: variable.clone(),
                        localisation: String::new(),
                    });
                }
            }
        }
        (rows, diagnostics)
    }

    /// Per-document (variable, localisation) lists in manifest order.
    ///
    /// Rows repeating the same value, or leaving it blank, agree with each
    /// other. Distinct non-empty values for one (document, variable) are a
    /// conflict under `Reject`; under `LastWins` the last one is used. A
    /// variable with no value at all is left in place and reported as
    /// `EmptyLocalisation`.
    #[instrument(skip_all, fields(policy = ?self.policy))]
    pub fn substitution_plan(&self, manifest: &Manifest) -> Result<SubstitutionPlan> {
        // (document, variable) -> distinct non-empty values in read order
        let mut values: BTreeMap<(&str, &str), Vec<&str>> = BTreeMap::new();
        let mut order: Vec<(&str, &str)> = Vec::new();
        for row in manifest.rows() {
            let key = (row.document_name.as_str(), row.variable.as_str());
            let seen = values.entry(key).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            if row.localisation.is_empty() {
                continue;
            }
            seen.retain(|v| *v != row.localisation);
            seen.push(row.localisation.as_str());
        }

        let mut plan = SubstitutionPlan::default();
        for (document, variable) in order {
            let candidates = values.get(&(document, variable)).map_or(&[][..], Vec::as_slice);
            let subs = plan.by_document.entry(document.to_string()).or_default();
            match (candidates, self.policy) {
                ([], _) => {
                    let diagnostic = Diagnostic::EmptyLocalisation {
                        document: document.to_string(),
                        variable: variable.to_string(),
                    };
                    warn!(%diagnostic, "localisation left empty");
                    plan.diagnostics.push(diagnostic);
                }
                ([value], _) => subs.push(variable, *value),
                (_, DuplicatePolicy::Reject) => {
                    let mut conflicting: Vec<String> =
                        candidates.iter().map(|v| v.to_string()).collect();
                    conflicting.sort();
                    return Err(LocaleError::ConflictingLocalisation {
                        document: document.to_string(),
                        variable: variable.to_string(),
                        values: conflicting,
                    });
                }
                (_, DuplicatePolicy::LastWins) => {
                    if let Some(last) = candidates.last() {
                        subs.push(variable, *last);
                    }
                }
            }
        }
        debug!(
            documents = plan.by_document.len(),
            skipped = plan.diagnostics.len(),
            "substitution plan built"
        );
        Ok(plan)
    }
}

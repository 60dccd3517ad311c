// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document store — the templates of one run, owned by that run.

use std::collections::BTreeMap;

use locale_core::types::LogoOutcome;
use locale_document::TemplateDocument;

use crate::integrity::hash_bytes;

/// One opened template and what has happened to it so far.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub document: TemplateDocument,
    /// SHA-256 of the template bytes as received.
    pub input_hash: String,
    pub paragraphs_rewritten: usize,
    /// Set once logo replacement has run for this document.
    pub logo: Option<LogoOutcome>,
}

/// Opened templates keyed by name; iteration is in name order.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: BTreeMap<String, StoredDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an opened document. `original` is the byte form it was opened
    /// from, used for the input digest.
    pub fn insert(&mut self, document: TemplateDocument, original: &[u8]) {
        let stored = StoredDocument {
            input_hash: hash_bytes(original),
            document,
            paragraphs_rewritten: 0,
            logo: None,
        };
        self.documents
            .insert(stored.document.name().to_string(), stored);
    }

    pub fn get(&self, name: &str) -> Option<&StoredDocument> {
        self.documents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredDocument)> {
        self.documents.iter().map(|(name, doc)| (name.as_str(), doc))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut StoredDocument)> {
        self.documents
            .iter_mut()
            .map(|(name, doc)| (name.as_str(), doc))
    }
}

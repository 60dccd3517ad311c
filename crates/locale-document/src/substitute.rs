// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text substitution — rewrite variable tokens to their localisation values
// in every text-bearing scope of a template document.

use locale_core::types::Precedence;
use tracing::{debug, instrument};

use crate::docx::TemplateDocument;

/// Ordered (token, value) pairs for one document.
///
/// Order is significant: pairs are tried first to last against each
/// paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    pairs: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair. Empty tokens are ignored since they would match
    /// everywhere.
    pub fn push(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        self.pairs.push((token, value.into()));
    }

    pub fn from_pairs<I, T, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, V)>,
        T: Into<String>,
        V: Into<String>,
    {
        let mut subs = Self::new();
        for (token, value) in pairs {
            subs.push(token, value);
        }
        subs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }
}

/// Rewrites paragraphs whose text contains a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstitutionEngine {
    precedence: Precedence,
}

impl SubstitutionEngine {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    /// Apply `subs` to one paragraph's text. Returns `None` when nothing
    /// changed.
    ///
    /// Every occurrence of a matching token is replaced. Under
    /// [`Precedence::Sequential`] each pair sees the text left by the pairs
    /// before it; under [`Precedence::FirstMatch`] the first pair that
    /// changes the text ends processing of this paragraph.
    pub fn apply_to_text(&self, text: &str, subs: &Substitutions) -> Option<String> {
        let mut current: Option<String> = None;
        for (token, value) in subs.iter() {
            let latest = current.as_deref().unwrap_or(text);
            if !latest.contains(token) {
                continue;
            }
            current = Some(latest.replace(token, value));
            if self.precedence == Precedence::FirstMatch {
                break;
            }
        }
        current.filter(|new_text| new_text != text)
    }

    /// Substitute across body, table cell, header and footer paragraphs.
    ///
    /// Returns the number of paragraphs rewritten. A rewritten paragraph
    /// keeps its paragraph properties but its runs collapse into one.
    #[instrument(skip(self, document, subs), fields(document = %document.name(), pairs = subs.len()))]
    pub fn apply(&self, document: &mut TemplateDocument, subs: &Substitutions) -> usize {
        if subs.is_empty() {
            return 0;
        }
        let rewritten = document.rewrite_paragraphs(|_, text| self.apply_to_text(text, subs));
        debug!(rewritten, "substitution complete");
        rewritten
    }
}

#[cfg(test)]
mod tests {
    use locale_core::types::Delimiters;
    use proptest::prelude::*;

    use super::*;
    use crate::docx::SectionVariant;
    use crate::extract::{extract_tokens, extract_variables};
    use crate::fixtures::DocxBuilder;

    const PARAGRAPH: &str = "Dear <<PI name>>, regards <<Site>>.";

    #[test]
    fn single_pair_leaves_other_tokens() {
        let engine = SubstitutionEngine::default();
        let subs = Substitutions::from_pairs([("<<PI name>>", "Dr. Jane Doe")]);
        assert_eq!(
            engine.apply_to_text(PARAGRAPH, &subs).as_deref(),
            Some("Dear Dr. Jane Doe, regards <<Site>>.")
        );
    }

    #[test]
    fn sequential_resolves_every_token_in_one_pass() {
        let engine = SubstitutionEngine::new(Precedence::Sequential);
        let subs = Substitutions::from_pairs([("<<PI name>>", "Dr. Jane Doe"), ("<<Site>>", "Leeds")]);
        assert_eq!(
            engine.apply_to_text(PARAGRAPH, &subs).as_deref(),
            Some("Dear Dr. Jane Doe, regards Leeds.")
        );
    }

    #[test]
    fn first_match_stops_after_one_pair() {
        let engine = SubstitutionEngine::new(Precedence::FirstMatch);
        let subs = Substitutions::from_pairs([("<<Site>>", "Leeds"), ("<<PI name>>", "Dr. Jane Doe")]);
        assert_eq!(
            engine.apply_to_text(PARAGRAPH, &subs).as_deref(),
            Some("Dear <<PI name>>, regards Leeds.")
        );
    }

    #[test]
    fn all_occurrences_are_replaced() {
        let engine = SubstitutionEngine::default();
        let subs = Substitutions::from_pairs([("<<X>>", "y")]);
        assert_eq!(engine.apply_to_text("<<X>>-<<X>>", &subs).as_deref(), Some("y-y"));
    }

    #[test]
    fn no_match_is_none() {
        let engine = SubstitutionEngine::default();
        let subs = Substitutions::from_pairs([("<<X>>", "y")]);
        assert_eq!(engine.apply_to_text("plain", &subs), None);
    }

    #[test]
    fn empty_tokens_are_dropped() {
        let subs = Substitutions::from_pairs([("", "x"), ("<<A>>", "a")]);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn rewrites_every_scope_and_clears_tokens() {
        let bytes = DocxBuilder::new()
            .paragraph_runs(&["Dear <<PI", " name>>, regards <<Site>>."])
            .table(&[&["Site: <<Site>>"]])
            .header(SectionVariant::Default, "<<Site>> research")
            .header(SectionVariant::EvenPage, "<<Site>> even")
            .footer(SectionVariant::FirstPage, "PI <<PI name>>")
            .build();
        let mut doc = TemplateDocument::open("letter.docx", &bytes).unwrap();
        let subs = Substitutions::from_pairs([("<<PI name>>", "Dr. Jane Doe"), ("<<Site>>", "Leeds")]);

        let rewritten = SubstitutionEngine::default().apply(&mut doc, &subs);
        assert_eq!(rewritten, 5);

        let reopened = TemplateDocument::open("letter.docx", &doc.to_bytes().unwrap()).unwrap();
        assert!(extract_variables(&reopened, &Delimiters::default()).unwrap().is_empty());
        let texts: Vec<String> = reopened.paragraphs().into_iter().map(|p| p.text).collect();
        assert!(texts.contains(&"Dear Dr. Jane Doe, regards Leeds.".to_string()));
        assert!(texts.contains(&"Leeds even".to_string()));
    }

    #[test]
    fn second_application_changes_nothing() {
        let bytes = DocxBuilder::new().paragraph(PARAGRAPH).build();
        let mut doc = TemplateDocument::open("t.docx", &bytes).unwrap();
        let subs = Substitutions::from_pairs([("<<PI name>>", "Dr. Jane Doe"), ("<<Site>>", "Leeds")]);
        let engine = SubstitutionEngine::default();

        assert_eq!(engine.apply(&mut doc, &subs), 1);
        let once: Vec<String> = doc.paragraphs().into_iter().map(|p| p.text).collect();
        assert_eq!(engine.apply(&mut doc, &subs), 0);
        let twice: Vec<String> = doc.paragraphs().into_iter().map(|p| p.text).collect();
        assert_eq!(once, twice);
    }

    // -- Properties over generated paragraphs ---------------------------------

    /// Delimiter pairs, including pairs whose prefix equals the suffix.
    fn delimiters_strategy() -> impl Strategy<Value = Delimiters> {
        prop::sample::select(vec![
            ("<<", ">>"),
            ("{{", "}}"),
            ("[", "]"),
            ("%%", "%%"),
            ("$", "$"),
        ])
        .prop_map(|(prefix, suffix)| Delimiters::new(prefix, suffix))
    }

    /// Filler and values: lower case, never delimiter characters.
    const PLAIN: &str = "[a-z0-9 ,.]{0,16}";

    /// Token bodies are upper case, so filler or a value between two
    /// delimiters can never spell a token.
    const TOKEN_BODY: &str = "[A-Z][A-Z_]{0,7}";

    /// A paragraph of fillers and tokens, plus the tokens in text order.
    fn paragraph_strategy() -> impl Strategy<Value = (Delimiters, String, Vec<String>)> {
        (
            delimiters_strategy(),
            prop::collection::vec((PLAIN, TOKEN_BODY), 0..6),
            PLAIN,
        )
            .prop_map(|(delimiters, parts, tail)| {
                let mut text = String::new();
                let mut tokens = Vec::new();
                for (filler, inner) in parts {
                    let token = format!("{}{inner}{}", delimiters.prefix, delimiters.suffix);
                    text.push_str(&filler);
                    text.push_str(&token);
                    tokens.push(token);
                }
                text.push_str(&tail);
                (delimiters, text, tokens)
            })
    }

    fn substitutions_for(tokens: &[String], values: &[String]) -> Substitutions {
        let mut subs = Substitutions::new();
        let mut seen = std::collections::BTreeSet::new();
        for (index, token) in tokens.iter().enumerate() {
            if seen.insert(token.clone()) {
                subs.push(token.clone(), values[index % values.len()].clone());
            }
        }
        subs
    }

    proptest! {
        #[test]
        fn extraction_finds_every_generated_token(
            (delimiters, text, tokens) in paragraph_strategy(),
        ) {
            prop_assert_eq!(extract_tokens(&text, &delimiters), tokens);
        }

        #[test]
        fn substituted_text_has_no_tokens_left(
            (delimiters, text, tokens) in paragraph_strategy(),
            values in prop::collection::vec(PLAIN, 1..4),
        ) {
            let subs = substitutions_for(&tokens, &values);
            let engine = SubstitutionEngine::default();
            let once = engine.apply_to_text(&text, &subs).unwrap_or_else(|| text.clone());
            prop_assert!(extract_tokens(&once, &delimiters).is_empty());
        }

        #[test]
        fn substitution_is_idempotent(
            (_delimiters, text, tokens) in paragraph_strategy(),
            values in prop::collection::vec(PLAIN, 1..4),
        ) {
            let subs = substitutions_for(&tokens, &values);
            let engine = SubstitutionEngine::default();
            let once = engine.apply_to_text(&text, &subs).unwrap_or_else(|| text.clone());
            prop_assert_eq!(engine.apply_to_text(&once, &subs), None);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn documents_are_cleared_in_every_scope(
            (delimiters, body, body_tokens) in paragraph_strategy(),
            cell_inner in TOKEN_BODY,
            header_inner in TOKEN_BODY,
            values in prop::collection::vec(PLAIN, 1..4),
        ) {
            let cell = format!("{}{cell_inner}{}", delimiters.prefix, delimiters.suffix);
            let header = format!("x {}{header_inner}{} y", delimiters.prefix, delimiters.suffix);
            let bytes = DocxBuilder::new()
                .paragraph(&body)
                .table(&[&[cell.as_str()]])
                .header(SectionVariant::EvenPage, &header)
                .build();
            let mut doc = TemplateDocument::open("generated.docx", &bytes).unwrap();

            let found = extract_variables(&doc, &delimiters).unwrap();
            let tokens: Vec<String> = found.iter().cloned().collect();
            for token in body_tokens.iter().chain([&cell]) {
                prop_assert!(found.contains(token));
            }

            let subs = substitutions_for(&tokens, &values);
            let engine = SubstitutionEngine::default();
            engine.apply(&mut doc, &subs);
            let reopened = TemplateDocument::open("generated.docx", &doc.to_bytes().unwrap()).unwrap();
            prop_assert!(extract_variables(&reopened, &delimiters).unwrap().is_empty());

            let mut again = reopened;
            prop_assert_eq!(engine.apply(&mut again, &subs), 0);
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Variable extraction — find delimiter-bounded tokens in paragraph text.

use std::collections::BTreeSet;

use locale_core::error::Result;
use locale_core::types::Delimiters;
use tracing::{debug, instrument};

use crate::docx::TemplateDocument;

/// Tokens in one paragraph, left to right, duplicates included.
///
/// A token runs from a prefix occurrence to the first suffix that starts
/// after the prefix ends, delimiters included. Scanning resumes after each
/// token. A prefix with no suffix after it ends the scan for this text.
pub fn extract_tokens<'a>(text: &'a str, delimiters: &Delimiters) -> Vec<&'a str> {
    let mut tokens = Vec::new();
    let (prefix, suffix) = (delimiters.prefix.as_str(), delimiters.suffix.as_str());
    if prefix.is_empty() || suffix.is_empty() {
        return tokens;
    }

    let mut cursor = 0usize;
    while let Some(offset) = text[cursor..].find(prefix) {
        let start = cursor + offset;
        let after_prefix = start + prefix.len();
        let Some(suffix_offset) = text[after_prefix..].find(suffix) else {
            break;
        };
        let end = after_prefix + suffix_offset + suffix.len();
        tokens.push(&text[start..end]);
        cursor = end;
    }
    tokens
}

/// Distinct tokens across every scope of a document.
#[instrument(skip(document, delimiters), fields(document = %document.name()))]
pub fn extract_variables(
    document: &TemplateDocument,
    delimiters: &Delimiters,
) -> Result<BTreeSet<String>> {
    delimiters.validate()?;
    let variables: BTreeSet<String> = document
        .paragraphs()
        .iter()
        .flat_map(|paragraph| extract_tokens(&paragraph.text, delimiters))
        .map(str::to_string)
        .collect();
    debug!(count = variables.len(), "variables extracted");
    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::SectionVariant;
    use crate::fixtures::DocxBuilder;

    #[test]
    fn finds_every_token_in_a_paragraph() {
        let tokens = extract_tokens("Dear <<PI name>>, regards <<Site>>.", &Delimiters::default());
        assert_eq!(tokens, vec!["<<PI name>>", "<<Site>>"]);
    }

    #[test]
    fn unterminated_prefix_stops_silently() {
        let tokens = extract_tokens("<<A>> then <<B and nothing else", &Delimiters::default());
        assert_eq!(tokens, vec!["<<A>>"]);
    }

    #[test]
    fn identical_prefix_and_suffix() {
        let delimiters = Delimiters::new("%%", "%%");
        let tokens = extract_tokens("%%one%% and %%two%%", &delimiters);
        assert_eq!(tokens, vec!["%%one%%", "%%two%%"]);
    }

    #[test]
    fn nested_prefix_is_part_of_the_token() {
        let tokens = extract_tokens("<<a <<b>> c>>", &Delimiters::default());
        assert_eq!(tokens, vec!["<<a <<b>>"]);
    }

    #[test]
    fn multibyte_text_is_handled() {
        let tokens = extract_tokens("Café «<<Nom>>» ✓", &Delimiters::default());
        assert_eq!(tokens, vec!["<<Nom>>"]);
    }

    #[test]
    fn covers_all_scopes_and_deduplicates() {
        let bytes = DocxBuilder::new()
            .paragraph_runs(&["Dear <<PI", " name>>"])
            .table(&[&["<<Site>>", "<<PI name>>"]])
            .header(SectionVariant::FirstPage, "<<Trial>>")
            .footer(SectionVariant::Default, "v<<Version>>")
            .build();
        let doc = TemplateDocument::open("letter.docx", &bytes).unwrap();
        let variables = extract_variables(&doc, &Delimiters::default()).unwrap();
        let expected: BTreeSet<String> = ["<<PI name>>", "<<Site>>", "<<Trial>>", "<<Version>>"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(variables, expected);
    }

    #[test]
    fn token_split_across_paragraphs_is_not_found() {
        let bytes = DocxBuilder::new().paragraph("<<Split").paragraph("here>>").build();
        let doc = TemplateDocument::open("t.docx", &bytes).unwrap();
        assert!(extract_variables(&doc, &Delimiters::default()).unwrap().is_empty());
    }

    #[test]
    fn empty_delimiters_are_rejected() {
        let bytes = DocxBuilder::new().paragraph("<<A>>").build();
        let doc = TemplateDocument::open("t.docx", &bytes).unwrap();
        assert!(extract_variables(&doc, &Delimiters::new("", ">>")).is_err());
    }
}

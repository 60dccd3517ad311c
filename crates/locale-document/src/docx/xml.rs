// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal tag scanner for WordprocessingML parts.
//
// Template edits are byte-range splices into the original XML, so everything
// the engine does not touch (styles, drawings, field codes, section
// properties) is written back byte-for-byte.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Element tag: `<name attrs>`, `</name>` or `<name attrs/>`.
/// Attribute values may contain `/` and `>` when quoted.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z_][A-Za-z0-9_.:\-]*)((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#)
        .expect("invalid tag regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_.:\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("invalid attribute regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    Open,
    Close,
    Empty,
}

/// One tag located in a part, with byte offsets into the source string.
#[derive(Debug, Clone)]
pub(crate) struct Tag<'a> {
    pub start: usize,
    pub end: usize,
    pub name: &'a str,
    pub attrs: &'a str,
    pub kind: TagKind,
}

impl<'a> Tag<'a> {
    /// Value of attribute `name`, unescaped.
    pub fn attr(&self, name: &str) -> Option<String> {
        ATTR_RE.captures_iter(self.attrs).find_map(|caps| {
            if &caps[1] != name {
                return None;
            }
            let raw = caps.get(2).or_else(|| caps.get(3))?.as_str();
            Some(unescape_text(raw).into_owned())
        })
    }
}

/// All tags of `xml` in document order.
pub(crate) fn scan_tags(xml: &str) -> Vec<Tag<'_>> {
    TAG_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let closing = !caps[1].is_empty();
            let self_closing = !caps[4].is_empty();
            let kind = match (closing, self_closing) {
                (true, _) => TagKind::Close,
                (false, true) => TagKind::Empty,
                (false, false) => TagKind::Open,
            };
            Some(Tag {
                start: whole.start(),
                end: whole.end(),
                name: caps.get(2)?.as_str(),
                attrs: caps.get(3).map_or("", |m| m.as_str()),
                kind,
            })
        })
        .collect()
}

/// Decode XML entities in element text. Malformed entities are kept verbatim.
pub(crate) fn unescape_text(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Encode text for use as element content.
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_open_close_and_empty() {
        let xml = r#"<w:p><w:r><w:t xml:space="preserve">a</w:t><w:tab/></w:r></w:p>"#;
        let tags = scan_tags(xml);
        let summary: Vec<(&str, TagKind)> = tags.iter().map(|t| (t.name, t.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("w:p", TagKind::Open),
                ("w:r", TagKind::Open),
                ("w:t", TagKind::Open),
                ("w:t", TagKind::Close),
                ("w:tab", TagKind::Empty),
                ("w:r", TagKind::Close),
                ("w:p", TagKind::Close),
            ]
        );
    }

    #[test]
    fn skips_declaration_and_reads_attributes() {
        let xml = r#"<?xml version="1.0"?><w:headerReference w:type="first" r:id="rId7"/>"#;
        let tags = scan_tags(xml);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].attr("w:type").as_deref(), Some("first"));
        assert_eq!(tags[0].attr("r:id").as_deref(), Some("rId7"));
        assert_eq!(tags[0].attr("w:val"), None);
    }

    #[test]
    fn quoted_slash_does_not_self_close() {
        let xml = r#"<Relationship Target="media/image1.png" Id="rId4"></Relationship>"#;
        let tags = scan_tags(xml);
        assert_eq!(tags[0].kind, TagKind::Open);
        assert_eq!(tags[0].attr("Target").as_deref(), Some("media/image1.png"));
    }

    #[test]
    fn escape_round_trip() {
        let text = "Smith & Jones <PI>";
        let escaped = escape_text(text);
        assert_eq!(escaped, "Smith &amp; Jones &lt;PI&gt;");
        assert_eq!(unescape_text(&escaped), text);
    }
}

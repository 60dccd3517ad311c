// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Template document — a .docx package opened for scope traversal and
// paragraph rewriting.
//
// Text lives in "story" parts: the main document (body paragraphs and table
// cell paragraphs) plus every header and footer part referenced from it. Each
// header/footer is tagged with the section variant that uses it (default,
// first page, even page).

use std::collections::HashMap;

use locale_core::error::{LocaleError, Result};
use tracing::{debug, instrument};

use super::archive::{self, ArchiveMember, MEDIA_PREFIX};
use super::xml::{self, Tag, TagKind};

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Relationships of the main document part.
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

const HEADER_REL_SUFFIX: &str = "/header";
const FOOTER_REL_SUFFIX: &str = "/footer";

/// Which pages of a section a header or footer applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionVariant {
    Default,
    FirstPage,
    EvenPage,
}

impl SectionVariant {
    fn from_ooxml(value: &str) -> Self {
        match value {
            "first" => Self::FirstPage,
            "even" => Self::EvenPage,
            _ => Self::Default,
        }
    }
}

/// Structural region a paragraph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Body,
    TableCell,
    Header(SectionVariant),
    Footer(SectionVariant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoryKind {
    Main,
    Header(SectionVariant),
    Footer(SectionVariant),
}

#[derive(Debug, Clone)]
struct Story {
    part: String,
    kind: StoryKind,
    xml: String,
}

/// Read-only view of one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub scope: Scope,
    /// Part the paragraph lives in, e.g. `word/header1.xml`.
    pub part: String,
    /// Concatenated text of the paragraph's runs.
    pub text: String,
}

/// A piece of run content that contributes to paragraph text.
#[derive(Debug, Clone)]
enum PieceKind {
    /// `<w:t>` with the byte range of its content.
    Text { content_start: usize, content_end: usize },
    Tab,
    Break,
}

#[derive(Debug, Clone)]
struct Piece {
    start: usize,
    end: usize,
    kind: PieceKind,
}

/// A paragraph located in a story part.
#[derive(Debug, Clone)]
struct ParagraphSpan {
    in_table: bool,
    /// Offset of the closing `</w:p>` tag.
    close_start: usize,
    pieces: Vec<Piece>,
}

impl ParagraphSpan {
    fn text(&self, xml_src: &str) -> String {
        let mut text = String::new();
        for piece in &self.pieces {
            match piece.kind {
                PieceKind::Text {
                    content_start,
                    content_end,
                } => text.push_str(&xml::unescape_text(&xml_src[content_start..content_end])),
                PieceKind::Tab => text.push('\t'),
                PieceKind::Break => text.push('\n'),
            }
        }
        text
    }
}

/// An opened template document.
///
/// Owns the raw archive members; story parts are held as decoded XML and
/// spliced back into the member list by [`TemplateDocument::to_bytes`].
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    name: String,
    members: Vec<ArchiveMember>,
    stories: Vec<Story>,
}

impl TemplateDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a .docx from raw bytes. `name` is the template name used in
    /// diagnostics and manifests.
    #[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
    pub fn open(name: &str, bytes: &[u8]) -> Result<Self> {
        let members = archive::read_members(bytes).map_err(|err| LocaleError::DocumentFormat {
            document: name.to_string(),
            reason: format!("not a valid .docx archive: {err}"),
        })?;

        let main_xml = part_text(name, &members, DOCUMENT_PART)?.ok_or_else(|| {
            LocaleError::DocumentFormat {
                document: name.to_string(),
                reason: format!("{DOCUMENT_PART} is missing"),
            }
        })?;

        let mut stories = vec![Story {
            part: DOCUMENT_PART.to_string(),
            kind: StoryKind::Main,
            xml: main_xml,
        }];

        let mut header_footer = header_footer_parts(name, &members, &stories[0].xml)?;
        header_footer.sort_by(|a, b| a.0.cmp(&b.0));
        for (part, kind) in header_footer {
            match part_text(name, &members, &part)? {
                Some(xml) => stories.push(Story { part, kind, xml }),
                None => debug!(document = name, part = %part, "referenced part missing, skipped"),
            }
        }

        debug!(
            document = name,
            members = members.len(),
            stories = stories.len(),
            "document opened"
        );

        Ok(Self {
            name: name.to_string(),
            members,
            stories,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every text-bearing paragraph across all scopes: body and table cells
    /// of the main part first, then headers and footers by part name.
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        let mut paragraphs = Vec::new();
        for story in &self.stories {
            for span in locate_paragraphs(&story.xml) {
                paragraphs.push(Paragraph {
                    scope: scope_of(story.kind, span.in_table),
                    part: story.part.clone(),
                    text: span.text(&story.xml),
                });
            }
        }
        paragraphs
    }

    /// Embedded media members (`word/media/*`) in archive order.
    pub fn media(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.members
            .iter()
            .filter(|m| m.name.starts_with(MEDIA_PREFIX))
            .map(|m| (m.name.as_str(), m.data.as_slice()))
    }

    // -- Mutation -------------------------------------------------------------

    /// Rewrite paragraphs in place.
    ///
    /// `rewrite` receives each paragraph's scope and concatenated text and
    /// returns the new text, or `None` to leave the paragraph untouched. A
    /// rewritten paragraph has the text of every existing run cleared and a
    /// single new run appended holding the full new text, so run-level
    /// character formatting inside that paragraph collapses. Drawings and
    /// other non-text run content are kept.
    ///
    /// Returns the number of paragraphs rewritten.
    pub fn rewrite_paragraphs<F>(&mut self, mut rewrite: F) -> usize
    where
        F: FnMut(Scope, &str) -> Option<String>,
    {
        let mut rewritten = 0usize;
        for story in &mut self.stories {
            let mut edits: Vec<(usize, usize, String)> = Vec::new();
            for span in locate_paragraphs(&story.xml) {
                let current = span.text(&story.xml);
                let Some(new_text) = rewrite(scope_of(story.kind, span.in_table), &current) else {
                    continue;
                };
                for piece in &span.pieces {
                    edits.push((piece.start, piece.end, String::new()));
                }
                edits.push((span.close_start, span.close_start, run_xml(&new_text)));
                rewritten += 1;
            }
            if edits.is_empty() {
                continue;
            }
            // Spans never overlap; apply back to front so offsets stay valid.
            edits.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
            for (start, end, replacement) in edits {
                story.xml.replace_range(start..end, &replacement);
            }
        }
        debug!(document = %self.name, rewritten, "paragraphs rewritten");
        rewritten
    }

    // -- Output ---------------------------------------------------------------

    /// Re-serialise the document, preserving member order.
    #[instrument(skip(self), fields(document = %self.name))]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let story_xml: HashMap<&str, &str> = self
            .stories
            .iter()
            .map(|s| (s.part.as_str(), s.xml.as_str()))
            .collect();

        let members = self.members.iter().map(|member| {
            let data = story_xml
                .get(member.name.as_str())
                .map_or(member.data.as_slice(), |xml| xml.as_bytes());
            (member.name.as_str(), data)
        });

        archive::write_members(members).map_err(|err| LocaleError::DocumentFormat {
            document: self.name.clone(),
            reason: format!("failed to serialise: {err}"),
        })
    }
}

fn scope_of(kind: StoryKind, in_table: bool) -> Scope {
    match kind {
        StoryKind::Main if in_table => Scope::TableCell,
        StoryKind::Main => Scope::Body,
        StoryKind::Header(variant) => Scope::Header(variant),
        StoryKind::Footer(variant) => Scope::Footer(variant),
    }
}

/// Decode a member as UTF-8 XML, if present.
fn part_text(document: &str, members: &[ArchiveMember], part: &str) -> Result<Option<String>> {
    let Some(member) = members.iter().find(|m| m.name == part) else {
        return Ok(None);
    };
    String::from_utf8(member.data.clone())
        .map(Some)
        .map_err(|err| LocaleError::DocumentFormat {
            document: document.to_string(),
            reason: format!("{part} is not UTF-8: {err}"),
        })
}

/// Header and footer parts referenced by the main document, with the section
/// variant each is used for.
fn header_footer_parts(
    document: &str,
    members: &[ArchiveMember],
    main_xml: &str,
) -> Result<Vec<(String, StoryKind)>> {
    let Some(rels_xml) = part_text(document, members, DOCUMENT_RELS_PART)? else {
        return Ok(Vec::new());
    };

    // r:id -> variant, from the section properties of the main part.
    let mut variants: HashMap<String, SectionVariant> = HashMap::new();
    for tag in xml::scan_tags(main_xml) {
        if tag.name != "w:headerReference" && tag.name != "w:footerReference" {
            continue;
        }
        if let Some(id) = tag.attr("r:id") {
            let variant = SectionVariant::from_ooxml(tag.attr("w:type").as_deref().unwrap_or(""));
            variants.entry(id).or_insert(variant);
        }
    }

    let mut parts: Vec<(String, StoryKind)> = Vec::new();
    for tag in xml::scan_tags(&rels_xml) {
        if tag.name != "Relationship" {
            continue;
        }
        let (Some(id), Some(rel_type), Some(target)) =
            (tag.attr("Id"), tag.attr("Type"), tag.attr("Target"))
        else {
            continue;
        };
        let variant = variants.get(&id).copied().unwrap_or(SectionVariant::Default);
        let kind = if rel_type.ends_with(HEADER_REL_SUFFIX) {
            StoryKind::Header(variant)
        } else if rel_type.ends_with(FOOTER_REL_SUFFIX) {
            StoryKind::Footer(variant)
        } else {
            continue;
        };
        let part = resolve_target(&target);
        if !parts.iter().any(|(existing, _)| *existing == part) {
            parts.push((part, kind));
        }
    }
    Ok(parts)
}

/// Resolve a relationship target relative to `word/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target.trim_start_matches("./")),
    }
}

/// Locate every paragraph of a story part and the run content contributing
/// to its text.
///
/// Only text that is a direct child of a run counts; tab stops in paragraph
/// properties and deleted text (`w:delText`) are ignored. A paragraph nested
/// inside another (text boxes) is its own paragraph.
fn locate_paragraphs(source: &str) -> Vec<ParagraphSpan> {
    struct Frame<'a> {
        name: &'a str,
        paragraph: Option<usize>,
        text_start: Option<(usize, usize)>,
    }

    let mut spans: Vec<ParagraphSpan> = Vec::new();
    let mut open_spans: Vec<bool> = Vec::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    let owning_paragraph = |stack: &[Frame<'_>]| stack.iter().rev().find_map(|f| f.paragraph);
    let parent_is_run = |stack: &[Frame<'_>]| stack.last().is_some_and(|f| f.name == "w:r");

    for tag in xml::scan_tags(source) {
        let Tag {
            start,
            end,
            name,
            kind,
            ..
        } = tag;
        match kind {
            TagKind::Open => {
                let mut frame = Frame {
                    name,
                    paragraph: None,
                    text_start: None,
                };
                if name == "w:p" {
                    let in_table = stack.iter().any(|f| f.name == "w:tc");
                    spans.push(ParagraphSpan {
                        in_table,
                        close_start: 0,
                        pieces: Vec::new(),
                    });
                    open_spans.push(true);
                    frame.paragraph = Some(spans.len() - 1);
                } else if name == "w:t" && parent_is_run(&stack) {
                    frame.text_start = Some((start, end));
                }
                stack.push(frame);
            }
            TagKind::Empty => {
                if !parent_is_run(&stack) {
                    continue;
                }
                let Some(owner) = owning_paragraph(&stack) else {
                    continue;
                };
                let piece_kind = match name {
                    "w:t" => PieceKind::Text {
                        content_start: end,
                        content_end: end,
                    },
                    "w:tab" => PieceKind::Tab,
                    "w:br" | "w:cr" => PieceKind::Break,
                    _ => continue,
                };
                spans[owner].pieces.push(Piece {
                    start,
                    end,
                    kind: piece_kind,
                });
            }
            TagKind::Close => {
                let Some(position) = stack.iter().rposition(|f| f.name == name) else {
                    continue;
                };
                let frame = stack.remove(position);
                stack.truncate(position);
                if let Some(index) = frame.paragraph {
                    spans[index].close_start = start;
                    open_spans[index] = false;
                } else if let (Some((text_open_start, text_open_end)), Some(owner)) =
                    (frame.text_start, owning_paragraph(&stack))
                {
                    spans[owner].pieces.push(Piece {
                        start: text_open_start,
                        end,
                        kind: PieceKind::Text {
                            content_start: text_open_end,
                            content_end: start,
                        },
                    });
                }
            }
        }
    }

    // Unterminated paragraphs cannot be rewritten safely.
    spans
        .into_iter()
        .zip(open_spans)
        .filter_map(|(span, open)| (!open).then_some(span))
        .collect()
}

/// A new run holding `text`; tabs and line breaks become their run elements.
fn run_xml(text: &str) -> String {
    let mut out = String::from("<w:r>");
    let mut segment = String::new();
    let flush = |segment: &mut String, out: &mut String| {
        if !segment.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&xml::escape_text(segment));
            out.push_str("</w:t>");
            segment.clear();
        }
    };
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(&mut segment, &mut out);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush(&mut segment, &mut out);
                out.push_str("<w:br/>");
            }
            other => segment.push(other),
        }
    }
    flush(&mut segment, &mut out);
    out.push_str("</w:r>");
    out
}

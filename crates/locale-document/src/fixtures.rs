// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic templates and logos for tests and benchmarks.
//
// Enabled for this crate's own tests and, through the `fixtures` feature, for
// downstream crates. Builders panic on failure; they never run in production.

use image::{DynamicImage, Rgb, RgbImage};

use crate::docx::SectionVariant;
use crate::docx::archive::write_members;
use crate::docx::xml::escape_text;
use crate::image::ImageProcessor;

const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#
);

const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Builds a minimal but well-formed .docx.
#[derive(Debug, Default)]
pub struct DocxBuilder {
    body: Vec<String>,
    headers: Vec<(SectionVariant, String)>,
    footers: Vec<(SectionVariant, String)>,
    media: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body paragraph with a single run.
    pub fn paragraph(self, text: &str) -> Self {
        self.paragraph_runs(&[text])
    }

    /// Body paragraph split across runs, alternating bold so the runs carry
    /// distinct formatting.
    pub fn paragraph_runs(mut self, runs: &[&str]) -> Self {
        self.body.push(paragraph_xml(runs));
        self
    }

    /// Table with one paragraph per cell.
    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        let mut xml = String::from("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr>");
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in *row {
                xml.push_str("<w:tc><w:tcPr><w:tcW w:w=\"2000\" w:type=\"dxa\"/></w:tcPr>");
                xml.push_str(&paragraph_xml(&[*cell]));
                xml.push_str("</w:tc>");
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        self.body.push(xml);
        self
    }

    pub fn header(mut self, variant: SectionVariant, text: &str) -> Self {
        self.headers.push((variant, text.to_string()));
        self
    }

    pub fn footer(mut self, variant: SectionVariant, text: &str) -> Self {
        self.footers.push((variant, text.to_string()));
        self
    }

    /// Embed `data` as `word/media/<name>` and place it inline in a body
    /// paragraph of its own.
    pub fn image(mut self, name: &str, data: Vec<u8>) -> Self {
        let rel_id = format!("rIdImg{}", self.media.len() + 1);
        self.body.push(format!(
            concat!(
                "<w:p><w:r><w:drawing><wp:inline><wp:extent cx=\"914400\" cy=\"914400\"/>",
                "<wp:docPr id=\"{n}\" name=\"Picture {n}\"/><a:graphic><a:graphicData ",
                "uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\"><pic:pic>",
                "<pic:blipFill><a:blip r:embed=\"{rel}\"/></pic:blipFill></pic:pic>",
                "</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"
            ),
            n = self.media.len() + 1,
            rel = rel_id
        ));
        self.media.push((name.to_string(), data));
        self
    }

    /// Serialise to .docx bytes.
    pub fn build(self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        let mut overrides = String::new();
        let mut rels = String::new();
        let mut references = String::new();
        let mut rel_index = 0usize;

        let stories = self
            .headers
            .iter()
            .map(|(variant, text)| ("header", "hdr", REL_HEADER, *variant, text))
            .chain(
                self.footers
                    .iter()
                    .map(|(variant, text)| ("footer", "ftr", REL_FOOTER, *variant, text)),
            );
        let mut counts = (0usize, 0usize);
        for (kind, root, rel_type, variant, text) in stories {
            let number = if kind == "header" {
                counts.0 += 1;
                counts.0
            } else {
                counts.1 += 1;
                counts.1
            };
            rel_index += 1;
            let file = format!("{kind}{number}.xml");
            let rel_id = format!("rId{rel_index}");
            rels.push_str(&format!(
                r#"<Relationship Id="{rel_id}" Type="{rel_type}" Target="{file}"/>"#
            ));
            references.push_str(&format!(
                r#"<w:{kind}Reference w:type="{}" r:id="{rel_id}"/>"#,
                variant_attr(variant)
            ));
            overrides.push_str(&format!(
                r#"<Override PartName="/word/{file}" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.{kind}+xml"/>"#
            ));
            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:{root} {NAMESPACES}>{}</w:{root}>"#,
                paragraph_xml(&[text.as_str()])
            );
            parts.push((format!("word/{file}"), xml.into_bytes()));
        }

        for (index, (name, _)) in self.media.iter().enumerate() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdImg{}" Type="{REL_IMAGE}" Target="media/{name}"/>"#,
                index + 1
            ));
        }

        let title_page = self
            .headers
            .iter()
            .chain(self.footers.iter())
            .any(|(variant, _)| *variant == SectionVariant::FirstPage);
        let document = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "<w:document {ns}><w:body>{body}<w:sectPr>{refs}",
                "<w:pgSz w:w=\"11906\" w:h=\"16838\"/>{title}</w:sectPr></w:body></w:document>"
            ),
            ns = NAMESPACES,
            body = self.body.concat(),
            refs = references,
            title = if title_page { "<w:titlePg/>" } else { "" },
        );

        let content_types = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Default Extension="png" ContentType="image/png"/>"#,
                r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#,
                r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
                "{overrides}</Types>"
            ),
            overrides = overrides
        );
        let package_rels = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            "</Relationships>"
        );
        let document_rels = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                "{rels}</Relationships>"
            ),
            rels = rels
        );

        let mut members: Vec<(String, Vec<u8>)> = vec![
            ("[Content_Types].xml".into(), content_types.into_bytes()),
            ("_rels/.rels".into(), package_rels.as_bytes().to_vec()),
            ("word/document.xml".into(), document.into_bytes()),
            ("word/_rels/document.xml.rels".into(), document_rels.into_bytes()),
        ];
        members.extend(parts);
        members.extend(
            self.media
                .into_iter()
                .map(|(name, data)| (format!("word/media/{name}"), data)),
        );

        write_members(members.iter().map(|(name, data)| (name.as_str(), data.as_slice())))
            .expect("fixture archive must serialise")
    }
}

fn variant_attr(variant: SectionVariant) -> &'static str {
    match variant {
        SectionVariant::Default => "default",
        SectionVariant::FirstPage => "first",
        SectionVariant::EvenPage => "even",
    }
}

fn paragraph_xml(runs: &[&str]) -> String {
    let mut xml = String::from("<w:p><w:pPr><w:spacing w:after=\"120\"/></w:pPr>");
    for (index, text) in runs.iter().enumerate() {
        xml.push_str("<w:r>");
        if index % 2 == 1 {
            xml.push_str("<w:rPr><w:b/></w:rPr>");
        }
        xml.push_str("<w:t xml:space=\"preserve\">");
        xml.push_str(&escape_text(text));
        xml.push_str("</w:t></w:r>");
    }
    xml.push_str("</w:p>");
    xml
}

// -- Logos --------------------------------------------------------------------

const INK: Rgb<u8> = Rgb([18, 42, 110]);
const PAPER: Rgb<u8> = Rgb([250, 250, 250]);

fn split_logo(width: u32, height: u32, vertical: bool) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let inked = if vertical { x < width / 2 } else { y < height / 2 };
        if inked { INK } else { PAPER }
    }))
}

/// Placeholder-style logo: ink on the left half, paper on the right.
pub fn logo_png(width: u32, height: u32) -> Vec<u8> {
    ImageProcessor::from_dynamic(split_logo(width, height, true))
        .to_png_bytes()
        .expect("fixture PNG must encode")
}

/// The same picture as [`logo_png`], JPEG-encoded.
pub fn logo_jpeg(width: u32, height: u32) -> Vec<u8> {
    ImageProcessor::from_dynamic(split_logo(width, height, true))
        .to_jpeg_bytes(95)
        .expect("fixture JPEG must encode")
}

/// A visually different logo: ink on the top half.
pub fn other_logo_png(width: u32, height: u32) -> Vec<u8> {
    ImageProcessor::from_dynamic(split_logo(width, height, false))
        .to_png_bytes()
        .expect("fixture PNG must encode")
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the locale-document crate: logo fingerprinting and
// full-document substitution on synthetic templates.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use locale_document::fixtures::{DocxBuilder, logo_png};
use locale_document::{SectionVariant, SubstitutionEngine, Substitutions, TemplateDocument, fingerprint};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Average-hash a 512x512 PNG, roughly the size of a letterhead logo.
fn bench_fingerprint(c: &mut Criterion) {
    let logo = logo_png(512, 512);

    c.bench_function("fingerprint (512x512 png)", |b| {
        b.iter(|| black_box(fingerprint(black_box(&logo)).ok()));
    });
}

/// Substitute two tokens across 200 body paragraphs, a table and headers.
fn bench_substitution(c: &mut Criterion) {
    let mut builder = DocxBuilder::new()
        .header(SectionVariant::Default, "<<Site>> research office")
        .footer(SectionVariant::Default, "PI: <<PI name>>")
        .table(&[&["Site", "<<Site>>"], &["PI", "<<PI name>>"]]);
    for index in 0..200 {
        builder = builder.paragraph_runs(&["Paragraph ", &index.to_string(), " for <<Site>>, <<PI name>>."]);
    }
    let bytes = builder.build();
    let subs = Substitutions::from_pairs([("<<PI name>>", "Dr. Jane Doe"), ("<<Site>>", "Leeds")]);
    let engine = SubstitutionEngine::default();

    c.bench_function("substitute (200 paragraphs)", |b| {
        b.iter(|| {
            let Ok(mut doc) = TemplateDocument::open("bench.docx", black_box(&bytes)) else {
                return;
            };
            black_box(engine.apply(&mut doc, &subs));
        });
    });
}

criterion_group!(benches, bench_fingerprint, bench_substitution);
criterion_main!(benches);

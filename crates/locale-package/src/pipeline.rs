// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Localisation pipeline — one run over one coordination package.
//
// Each stage is its own type and every transition consumes the previous
// stage, so stages cannot be skipped or repeated:
//
//   Unpacked -> Validated -> Substituted -> LogoReplaced -> Assembled
//
// Structural problems (components, schema, name sets) fail before any
// template is opened. Per-document problems become diagnostics and the run
// carries on with the remaining documents.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use locale_core::config::LocaleConfig;
use locale_core::error::Result;
use locale_core::types::{
    Diagnostic, DocumentReport, LogoOutcome, ManifestRow, OperationId, PipelineStage, RunReport,
};
use locale_document::{LogoReplacer, SubstitutionEngine, TemplateDocument};
use tracing::{debug, info, instrument, warn};

use crate::assemble::{assemble_output, output_name, verify_output_package};
use crate::integrity::hash_bytes;
use crate::intake::{CoordinationPackage, PlaceholderLogo, unpack_package};
use crate::manifest::Manifest;
use crate::store::DocumentStore;
use crate::validate::{ExpectedTokens, ManifestValidator};

/// Marker for pipeline state types.
pub trait Stage {
    const STAGE: PipelineStage;
}

/// A run in progress, currently in stage `S`.
#[derive(Debug)]
pub struct Pipeline<S> {
    operation: OperationId,
    started_at: DateTime<Utc>,
    config: LocaleConfig,
    diagnostics: Vec<Diagnostic>,
    state: S,
}

impl<S: Stage> Pipeline<S> {
    pub fn stage(&self) -> PipelineStage {
        S::STAGE
    }

    pub fn operation_id(&self) -> OperationId {
        self.operation
    }

    pub fn config(&self) -> &LocaleConfig {
        &self.config
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn advance<T: Stage>(self, next: impl FnOnce(S) -> T) -> Pipeline<T> {
        let pipeline = Pipeline {
            operation: self.operation,
            started_at: self.started_at,
            config: self.config,
            diagnostics: self.diagnostics,
            state: next(self.state),
        };
        info!(operation = %pipeline.operation, stage = ?T::STAGE, "stage complete");
        pipeline
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(operation = %self.operation, %diagnostic, "document diagnostic");
        self.diagnostics.push(diagnostic);
    }
}

// -- Unpacked -----------------------------------------------------------------

#[derive(Debug)]
pub struct Unpacked {
    package: CoordinationPackage,
}

impl Stage for Unpacked {
    const STAGE: PipelineStage = PipelineStage::Unpacked;
}

impl Pipeline<Unpacked> {
    /// Start a run from coordination package bytes.
    #[instrument(skip(bytes, config), fields(bytes_len = bytes.len()))]
    pub fn unpack(bytes: &[u8], config: LocaleConfig) -> Result<Self> {
        config.validate()?;
        let started_at = Utc::now();
        let package = unpack_package(bytes, &config)?;
        let operation = OperationId::new();
        info!(operation = %operation, templates = package.templates.len(), "run started");
        Ok(Self {
            operation,
            started_at,
            config,
            diagnostics: Vec::new(),
            state: Unpacked { package },
        })
    }

    pub fn package(&self) -> &CoordinationPackage {
        &self.state.package
    }

    pub fn placeholder_logo(&self) -> &PlaceholderLogo {
        &self.state.package.logo
    }

    /// Parse the package manifest, match it against the templates, then open
    /// the templates. Templates that fail to open are skipped with an
    /// `ExtractionSkipped` diagnostic.
    #[instrument(skip(self), fields(operation = %self.operation))]
    pub fn validate(mut self) -> Result<Pipeline<Validated>> {
        let package = &self.state.package;
        let manifest = Manifest::from_csv(&package.manifest.bytes, &self.config.manifest_file_name)?;
        let template_names = package.template_names();
        let expected = ManifestValidator::new(self.config.duplicate_policy)
            .validate(&manifest, &template_names)?;

        let mut store = DocumentStore::new();
        let mut skipped = Vec::new();
        for template in &package.templates {
            match TemplateDocument::open(&template.name, &template.bytes) {
                Ok(document) => store.insert(document, &template.bytes),
                Err(err) => skipped.push(Diagnostic::ExtractionSkipped {
                    document: template.name.clone(),
                    reason: err.to_string(),
                }),
            }
        }
        for diagnostic in skipped {
            self.report(diagnostic);
        }

        Ok(self.advance(|unpacked| Validated {
            logo: unpacked.package.logo,
            manifest,
            expected,
            template_names,
            store,
        }))
    }
}

// -- Validated ----------------------------------------------------------------

#[derive(Debug)]
pub struct Validated {
    logo: PlaceholderLogo,
    manifest: Manifest,
    expected: ExpectedTokens,
    template_names: BTreeSet<String>,
    store: DocumentStore,
}

impl Stage for Validated {
    const STAGE: PipelineStage = PipelineStage::Validated;
}

impl Pipeline<Validated> {
    pub fn manifest(&self) -> &Manifest {
        &self.state.manifest
    }

    pub fn placeholder_logo(&self) -> &PlaceholderLogo {
        &self.state.logo
    }

    pub fn store(&self) -> &DocumentStore {
        &self.state.store
    }

    /// Review rows for the operator: one per paragraph occurrence, with
    /// `related_paragraph`.
    pub fn review_rows(&self) -> (Vec<ManifestRow>, Vec<Diagnostic>) {
        ManifestValidator::new(self.config.duplicate_policy).review_rows(
            &self.state.manifest,
            &self.state.expected,
            &self.state.store,
        )
    }

    /// Use an operator-edited manifest for substitution instead of the
    /// package's own. It must describe the same templates.
    #[instrument(skip_all, fields(operation = %self.operation, manifest = manifest.file_name()))]
    pub fn with_manifest(mut self, manifest: Manifest) -> Result<Self> {
        let expected = ManifestValidator::new(self.config.duplicate_policy)
            .validate(&manifest, &self.state.template_names)?;
        self.state.expected = expected;
        self.state.manifest = manifest;
        Ok(self)
    }

    /// Rewrite every document's tokens with its manifest values.
    #[instrument(skip(self), fields(operation = %self.operation))]
    pub fn substitute(mut self) -> Result<Pipeline<Substituted>> {
        let plan = ManifestValidator::new(self.config.duplicate_policy)
            .substitution_plan(&self.state.manifest)?;
        self.diagnostics.extend(plan.diagnostics.iter().cloned());

        let engine = SubstitutionEngine::new(self.config.precedence);
        for (name, stored) in self.state.store.iter_mut() {
            let Some(subs) = plan.for_document(name) else {
                continue;
            };
            stored.paragraphs_rewritten = engine.apply(&mut stored.document, subs);
            debug!(document = name, rewritten = stored.paragraphs_rewritten, "document substituted");
        }

        Ok(self.advance(|validated| Substituted {
            logo: validated.logo,
            manifest: validated.manifest,
            template_names: validated.template_names,
            store: validated.store,
        }))
    }
}

// -- Substituted --------------------------------------------------------------

#[derive(Debug)]
pub struct Substituted {
    logo: PlaceholderLogo,
    manifest: Manifest,
    template_names: BTreeSet<String>,
    store: DocumentStore,
}

impl Stage for Substituted {
    const STAGE: PipelineStage = PipelineStage::Substituted;
}

impl Pipeline<Substituted> {
    /// Swap the placeholder logo for `site_logo` in every document.
    ///
    /// Each document is serialised, patched in a scratch directory of its
    /// own, and re-opened from the patched bytes. A document that cannot be
    /// patched keeps its substituted text and gets a
    /// `LogoReplacementFailed` diagnostic.
    #[instrument(skip(self, site_logo), fields(operation = %self.operation, logo_len = site_logo.len()))]
    pub fn replace_logo(mut self, site_logo: Vec<u8>) -> Result<Pipeline<LogoReplaced>> {
        let mut replacer = LogoReplacer::new(self.state.logo.fingerprint, site_logo);
        if let Some(root) = &self.config.scratch_dir {
            replacer = replacer.with_scratch_root(root);
        }

        let mut reported = Vec::new();
        for (name, stored) in self.state.store.iter_mut() {
            let attempt = stored
                .document
                .to_bytes()
                .and_then(|bytes| replacer.replace(name, &bytes));
            let replacement = match attempt {
                Ok(replacement) => replacement,
                Err(err) => {
                    let reason = err.to_string();
                    reported.push(Diagnostic::LogoReplacementFailed {
                        document: name.to_string(),
                        reason: reason.clone(),
                    });
                    stored.logo = Some(LogoOutcome::Failed { reason });
                    continue;
                }
            };
            match &replacement.outcome {
                LogoOutcome::Replaced { .. } => {
                    match TemplateDocument::open(name, &replacement.bytes) {
                        Ok(document) => stored.document = document,
                        Err(err) => {
                            let reason = err.to_string();
                            reported.push(Diagnostic::LogoReplacementFailed {
                                document: name.to_string(),
                                reason: reason.clone(),
                            });
                            stored.logo = Some(LogoOutcome::Failed { reason });
                            continue;
                        }
                    }
                }
                LogoOutcome::NotFound => reported.push(Diagnostic::LogoNotFound {
                    document: name.to_string(),
                }),
                LogoOutcome::Skipped { reason } | LogoOutcome::Failed { reason } => {
                    reported.push(Diagnostic::InvalidReplacementImage {
                        document: name.to_string(),
                        reason: reason.clone(),
                    })
                }
            }
            stored.logo = Some(replacement.outcome);
        }
        for diagnostic in reported {
            self.report(diagnostic);
        }

        Ok(self.advance(|substituted| LogoReplaced {
            manifest: substituted.manifest,
            template_names: substituted.template_names,
            store: substituted.store,
        }))
    }
}

// -- LogoReplaced -------------------------------------------------------------

#[derive(Debug)]
pub struct LogoReplaced {
    manifest: Manifest,
    template_names: BTreeSet<String>,
    store: DocumentStore,
}

impl Stage for LogoReplaced {
    const STAGE: PipelineStage = PipelineStage::LogoReplaced;
}

impl Pipeline<LogoReplaced> {
    /// Write the output package and verify its member set.
    #[instrument(skip(self), fields(operation = %self.operation))]
    pub fn assemble(self) -> Result<Pipeline<Assembled>> {
        let config = &self.config;
        let mut documents = Vec::with_capacity(self.state.store.len());
        let mut reports = Vec::with_capacity(self.state.store.len());
        for (name, stored) in self.state.store.iter() {
            let bytes = stored.document.to_bytes()?;
            let output = output_name(&config.output_prefix, name);
            reports.push(DocumentReport {
                document_name: name.to_string(),
                output_name: output.clone(),
                input_hash: stored.input_hash.clone(),
                output_hash: hash_bytes(&bytes),
                paragraphs_rewritten: stored.paragraphs_rewritten,
                logo: stored.logo.clone().unwrap_or(LogoOutcome::NotFound),
            });
            documents.push((output, bytes));
        }

        let manifest_csv = self.state.manifest.to_csv(config.include_related_paragraph)?;
        let output = assemble_output(&documents, &config.manifest_file_name, &manifest_csv)?;
        let processed: BTreeSet<String> = self.state.store.names().map(str::to_string).collect();
        verify_output_package(
            &output,
            &processed,
            &config.output_prefix,
            &config.manifest_file_name,
        )?;
        if processed.len() < self.state.template_names.len() {
            warn!(
                processed = processed.len(),
                templates = self.state.template_names.len(),
                "some templates were skipped"
            );
        }

        let report = RunReport {
            operation_id: self.operation,
            started_at: self.started_at,
            finished_at: Utc::now(),
            documents: reports,
            diagnostics: self.diagnostics.clone(),
        };
        Ok(self.advance(|_| Assembled { output, report }))
    }
}

// -- Assembled ----------------------------------------------------------------

#[derive(Debug)]
pub struct Assembled {
    output: Vec<u8>,
    report: RunReport,
}

impl Stage for Assembled {
    const STAGE: PipelineStage = PipelineStage::Assembled;
}

impl Pipeline<Assembled> {
    /// The site package bytes.
    pub fn output(&self) -> &[u8] {
        &self.state.output
    }

    pub fn run_report(&self) -> &RunReport {
        &self.state.report
    }

    pub fn into_parts(self) -> (Vec<u8>, RunReport) {
        (self.state.output, self.state.report)
    }
}

/// Run every stage in order. `manifest` replaces the package manifest when
/// given.
pub fn localise(
    package_bytes: &[u8],
    site_logo: Vec<u8>,
    manifest: Option<Manifest>,
    config: LocaleConfig,
) -> Result<Pipeline<Assembled>> {
    let mut validated = Pipeline::unpack(package_bytes, config)?.validate()?;
    if let Some(manifest) = manifest {
        validated = validated.with_manifest(manifest)?;
    }
    validated.substitute()?.replace_logo(site_logo)?.assemble()
}

#[cfg(test)]
mod tests {
    use locale_core::error::LocaleError;
    use locale_core::types::{Delimiters, PackageComponent};
    use locale_document::docx::SectionVariant;
    use locale_document::docx::archive::{ArchiveMember, read_members, write_members};
    use locale_document::extract_variables;
    use locale_document::fixtures::{DocxBuilder, logo_png, other_logo_png};

    use super::*;

    const MANIFEST: &str = "\
document_type,document_name,variable,localisation
GP letter,letter.docx,<<PI name>>,Dr. Jane Doe
GP letter,letter.docx,<<Site>>,Leeds
Poster,poster.docx,<<Site>>,Leeds
";

    fn letter() -> Vec<u8> {
        DocxBuilder::new()
            .paragraph_runs(&["Dear <<PI", " name>>, regards <<Site>>."])
            .header(SectionVariant::Default, "<<Site>> research office")
            .image("image1.png", logo_png(60, 60))
            .build()
    }

    fn poster() -> Vec<u8> {
        DocxBuilder::new()
            .table(&[&["Site", "<<Site>>"]])
            .footer(SectionVariant::EvenPage, "Contact <<Site>>")
            .build()
    }

    fn package(manifest: &str) -> Vec<u8> {
        let letter = letter();
        let poster = poster();
        let placeholder = logo_png(200, 100);
        write_members([
            ("pkg/letter.docx", letter.as_slice()),
            ("pkg/poster.docx", poster.as_slice()),
            ("pkg/placeholder.png", placeholder.as_slice()),
            ("pkg/localisation.csv", manifest.as_bytes()),
        ])
        .unwrap()
    }

    fn output_documents(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        read_members(bytes)
            .unwrap()
            .into_iter()
            .map(|m| (m.name, m.data))
            .collect()
    }

    #[test]
    fn full_run_localises_text_and_logo() {
        let scratch = tempfile::tempdir().unwrap();
        let config = LocaleConfig {
            scratch_dir: Some(scratch.path().to_path_buf()),
            ..LocaleConfig::default()
        };
        let site_logo = other_logo_png(300, 150);

        let unpacked = Pipeline::unpack(&package(MANIFEST), config).unwrap();
        assert_eq!(unpacked.stage(), PipelineStage::Unpacked);
        assert_eq!(
            (unpacked.placeholder_logo().width, unpacked.placeholder_logo().height),
            (200, 100)
        );
        let validated = unpacked.validate().unwrap();
        assert_eq!(validated.stage(), PipelineStage::Validated);
        let substituted = validated.substitute().unwrap();
        assert_eq!(substituted.stage(), PipelineStage::Substituted);
        let replaced = substituted.replace_logo(site_logo.clone()).unwrap();
        assert_eq!(replaced.stage(), PipelineStage::LogoReplaced);
        let assembled = replaced.assemble().unwrap();
        assert_eq!(assembled.stage(), PipelineStage::Assembled);

        let members = output_documents(assembled.output());
        let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["localised_letter.docx", "localised_poster.docx", "localisation.csv"]
        );

        for (name, bytes) in &members[..2] {
            let doc = TemplateDocument::open(name, bytes).unwrap();
            assert!(extract_variables(&doc, &Delimiters::default()).unwrap().is_empty());
        }
        let letter_doc = TemplateDocument::open("localised_letter.docx", &members[0].1).unwrap();
        let texts: Vec<String> = letter_doc.paragraphs().into_iter().map(|p| p.text).collect();
        assert!(texts.contains(&"Dear Dr. Jane Doe, regards Leeds.".to_string()));
        let media: Vec<&[u8]> = letter_doc.media().map(|(_, data)| data).collect();
        assert_eq!(media, vec![site_logo.as_slice()]);

        let report = assembled.run_report();
        assert_eq!(report.documents.len(), 2);
        assert_eq!(
            report.documents[0].logo,
            LogoOutcome::Replaced {
                member: "word/media/image1.png".into()
            }
        );
        assert_eq!(report.documents[0].input_hash, hash_bytes(&letter()));
        assert_eq!(report.documents[0].output_hash, hash_bytes(&members[0].1));
        assert_eq!(report.documents[1].paragraphs_rewritten, 2);
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::LogoNotFound {
                document: "poster.docx".into()
            }]
        );
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn output_manifest_carries_values() {
        let assembled = localise(
            &package(MANIFEST),
            other_logo_png(30, 30),
            None,
            LocaleConfig::default(),
        )
        .unwrap();
        let (output, _) = assembled.into_parts();
        let members = output_documents(&output);
        let manifest = Manifest::from_csv(&members[2].1, "localisation.csv").unwrap();
        assert_eq!(manifest.rows().len(), 3);
        assert_eq!(manifest.rows()[0].localisation, "Dr. Jane Doe");
    }

    #[test]
    fn set_mismatch_aborts_before_documents_open() {
        let manifest = "document_type,document_name,variable\nT,letter.docx,<<Site>>\nT,other.docx,<<Site>>\n";
        let err = Pipeline::unpack(&package(manifest), LocaleConfig::default())
            .unwrap()
            .validate()
            .unwrap_err();
        match err {
            LocaleError::SetMismatch {
                manifest_only,
                templates_only,
            } => {
                assert_eq!(manifest_only, BTreeSet::from(["other.docx".to_string()]));
                assert_eq!(templates_only, BTreeSet::from(["poster.docx".to_string()]));
            }
            other => panic!("expected set mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_manifest_aborts_at_unpack() {
        let letter = letter();
        let logo = logo_png(10, 10);
        let bytes = write_members([
            ("letter.docx", letter.as_slice()),
            ("logo.png", logo.as_slice()),
        ])
        .unwrap();
        assert!(matches!(
            Pipeline::unpack(&bytes, LocaleConfig::default()),
            Err(LocaleError::MissingComponent { missing }) if missing == vec![PackageComponent::Manifest]
        ));
    }

    #[test]
    fn reviewed_manifest_drives_substitution() {
        let manifest = "document_type,document_name,variable\nGP letter,letter.docx,<<Site>>\nPoster,poster.docx,<<Site>>\n";
        let validated = Pipeline::unpack(&package(manifest), LocaleConfig::default())
            .unwrap()
            .validate()
            .unwrap();
        let (mut rows, diagnostics) = validated.review_rows();
        assert!(diagnostics.is_empty());
        // letter: body + header, poster: table cell + footer
        assert_eq!(rows.len(), 4);
        for row in &mut rows {
            row.localisation = "York".into();
        }

        let assembled = validated
            .with_manifest(Manifest::from_rows("localisation.csv", rows))
            .unwrap()
            .substitute()
            .unwrap()
            .replace_logo(other_logo_png(20, 20))
            .unwrap()
            .assemble()
            .unwrap();

        let members = output_documents(assembled.output());
        let poster = TemplateDocument::open("p", &members[1].1).unwrap();
        let texts: Vec<String> = poster.paragraphs().into_iter().map(|p| p.text).collect();
        assert!(texts.contains(&"York".to_string()));
        assert!(texts.contains(&"Contact York".to_string()));

        let csv = String::from_utf8(members[2].1.clone()).unwrap();
        assert!(csv.starts_with("document_type,document_name,related_paragraph,variable,localisation\n"));
    }

    #[test]
    fn edited_manifest_for_other_templates_is_rejected() {
        let validated = Pipeline::unpack(&package(MANIFEST), LocaleConfig::default())
            .unwrap()
            .validate()
            .unwrap();
        let wrong = Manifest::from_rows("edited.csv", vec![ManifestRow::blank("letter.docx", "<<Site>>")]);
        assert!(matches!(
            validated.with_manifest(wrong),
            Err(LocaleError::SetMismatch { .. })
        ));
    }

    #[test]
    fn unusable_site_logo_is_skipped_per_document() {
        let assembled = localise(&package(MANIFEST), Vec::new(), None, LocaleConfig::default()).unwrap();
        let report = assembled.run_report();
        assert!(matches!(report.documents[0].logo, LogoOutcome::Skipped { .. }));
        assert!(report.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::InvalidReplacementImage { document, .. } if document == "letter.docx"
        )));
    }

    #[test]
    fn unpatchable_document_does_not_block_the_rest() {
        let mut bad_members = read_members(&letter()).unwrap();
        bad_members.push(ArchiveMember::new(
            "../escape.txt",
            b"outside".to_vec(),
        ));
        let bad = write_members(bad_members.iter().map(|m| (m.name.as_str(), m.data.as_slice()))).unwrap();
        let poster = poster();
        let placeholder = logo_png(200, 100);
        let manifest = "document_type,document_name,variable,localisation\n\
                        GP letter,bad.docx,<<Site>>,Leeds\n\
                        Poster,poster.docx,<<Site>>,Leeds\n";
        let bytes = write_members([
            ("bad.docx", bad.as_slice()),
            ("poster.docx", poster.as_slice()),
            ("placeholder.png", placeholder.as_slice()),
            ("localisation.csv", manifest.as_bytes()),
        ])
        .unwrap();

        let assembled = localise(&bytes, other_logo_png(40, 40), None, LocaleConfig::default()).unwrap();
        let report = assembled.run_report();
        assert!(matches!(report.documents[0].logo, LogoOutcome::Failed { .. }));
        assert!(report.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::LogoReplacementFailed { document, .. } if document == "bad.docx"
        )));

        let members = output_documents(assembled.output());
        let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["localised_bad.docx", "localised_poster.docx", "localisation.csv"]
        );
        let bad = TemplateDocument::open("b", &members[0].1).unwrap();
        let texts: Vec<String> = bad.paragraphs().into_iter().map(|p| p.text).collect();
        assert!(texts.contains(&"Leeds research office".to_string()));
        let poster = TemplateDocument::open("p", &members[1].1).unwrap();
        let texts: Vec<String> = poster.paragraphs().into_iter().map(|p| p.text).collect();
        assert!(texts.contains(&"Contact Leeds".to_string()));
    }

    #[test]
    fn report_serialises_to_json() {
        let assembled = localise(&package(MANIFEST), logo_png(5, 5), None, LocaleConfig::default()).unwrap();
        let json = serde_json::to_string(assembled.run_report()).unwrap();
        assert!(json.contains("\"output_name\":\"localised_letter.docx\""));
    }
}

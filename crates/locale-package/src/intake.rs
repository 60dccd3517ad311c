// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Package intake — classify the members of an incoming zip.
//
// A coordination package holds .docx templates, one placeholder logo and the
// manifest. Members are classified by base name, so templates may sit in
// folders. Archive litter is ignored: `__MACOSX/` resource forks, Word lock
// files (`~$...`) and hidden files.

use std::collections::BTreeSet;

use locale_core::config::LocaleConfig;
use locale_core::error::{LocaleError, Result};
use locale_core::types::{Fingerprint, PackageComponent};
use locale_document::ImageProcessor;
use locale_document::docx::archive::{self, ArchiveMember};
use tracing::{debug, info, instrument};

const TEMPLATE_EXTENSION: &str = ".docx";
const LOGO_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];
const RESOURCE_FORK_DIR: &str = "__MACOSX";
const LOCK_FILE_PREFIX: &str = "~$";

/// A template as received, before it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Base name, unique within the package.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The reference logo shipped alongside the templates.
#[derive(Debug, Clone)]
pub struct PlaceholderLogo {
    /// Member path inside the package.
    pub name: String,
    pub bytes: Vec<u8>,
    pub fingerprint: Fingerprint,
    pub width: u32,
    pub height: u32,
}

impl PlaceholderLogo {
    fn decode(name: String, bytes: Vec<u8>) -> Result<Self> {
        let processor = ImageProcessor::from_bytes(&bytes).map_err(|err| LocaleError::PlaceholderLogo {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        let (width, height) = (processor.width(), processor.height());
        Ok(Self {
            fingerprint: processor.average_hash(),
            width,
            height,
            name,
            bytes,
        })
    }
}

/// The manifest file as received, parsed later by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A coordination package with all three components present.
#[derive(Debug, Clone)]
pub struct CoordinationPackage {
    /// Templates in archive order.
    pub templates: Vec<TemplateFile>,
    pub logo: PlaceholderLogo,
    pub manifest: ManifestFile,
}

impl CoordinationPackage {
    pub fn template_names(&self) -> BTreeSet<String> {
        self.templates.iter().map(|t| t.name.clone()).collect()
    }
}

#[derive(Debug, Default)]
struct Classified {
    templates: Vec<TemplateFile>,
    logo: Option<ArchiveMember>,
    manifest: Option<ArchiveMember>,
}

/// Unpack a coordination package.
///
/// Every missing component is reported in one `MissingComponent` error,
/// before any template is opened.
#[instrument(skip(bytes, config), fields(bytes_len = bytes.len()))]
pub fn unpack_package(bytes: &[u8], config: &LocaleConfig) -> Result<CoordinationPackage> {
    let classified = classify(bytes, &config.manifest_file_name)?;

    let mut missing = Vec::new();
    if classified.templates.is_empty() {
        missing.push(PackageComponent::Templates);
    }
    if classified.logo.is_none() {
        missing.push(PackageComponent::PlaceholderLogo);
    }
    if classified.manifest.is_none() {
        missing.push(PackageComponent::Manifest);
    }
    let (Some(logo), Some(manifest)) = (classified.logo, classified.manifest) else {
        return Err(LocaleError::MissingComponent { missing });
    };
    if !missing.is_empty() {
        return Err(LocaleError::MissingComponent { missing });
    }

    let logo = PlaceholderLogo::decode(logo.name, logo.data)?;
    info!(
        templates = classified.templates.len(),
        logo = %logo.name,
        fingerprint = %logo.fingerprint,
        "package unpacked"
    );
    Ok(CoordinationPackage {
        templates: classified.templates,
        logo,
        manifest: ManifestFile {
            name: manifest.name,
            bytes: manifest.data,
        },
    })
}

/// Unpack a zip of templates only, as used for coordination-side extraction.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn unpack_templates(bytes: &[u8]) -> Result<Vec<TemplateFile>> {
    // No member can be named "" so the manifest slot stays empty.
    let classified = classify(bytes, "")?;
    if classified.templates.is_empty() {
        return Err(LocaleError::MissingComponent {
            missing: vec![PackageComponent::Templates],
        });
    }
    Ok(classified.templates)
}

fn classify(bytes: &[u8], manifest_file_name: &str) -> Result<Classified> {
    let members = archive::read_members(bytes)
        .map_err(|err| LocaleError::PackageFormat(err.to_string()))?;

    let mut classified = Classified::default();
    let mut seen = BTreeSet::new();
    for member in members {
        if is_litter(&member.name) {
            debug!(member = %member.name, "ignored");
            continue;
        }
        let base = base_name(&member.name).to_string();
        let lower = base.to_lowercase();

        if lower.ends_with(TEMPLATE_EXTENSION) {
            if !seen.insert(base.clone()) {
                return Err(LocaleError::DuplicateTemplate(base));
            }
            classified.templates.push(TemplateFile {
                name: base,
                bytes: member.data,
            });
        } else if base == manifest_file_name {
            if classified.manifest.is_none() {
                classified.manifest = Some(member);
            }
        } else if LOGO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            if classified.logo.is_none() {
                classified.logo = Some(member);
            }
        } else {
            debug!(member = %member.name, "unrecognised member ignored");
        }
    }
    Ok(classified)
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn is_litter(path: &str) -> bool {
    let base = base_name(path);
    path.split(['/', '\\']).any(|part| part == RESOURCE_FORK_DIR)
        || base.starts_with(LOCK_FILE_PREFIX)
        || base.starts_with('.')
        || base.is_empty()
}

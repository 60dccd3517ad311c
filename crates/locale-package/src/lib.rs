// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// locale-package — Coordination and site packages for the LOCALE engine.
//
// Covers package intake, manifest parsing and validation, carry-over of
// values from a previous localisation, coordination-side extraction, and the
// staged localisation pipeline that produces the site package.

pub mod assemble;
pub mod carry_over;
pub mod coordination;
pub mod intake;
pub mod integrity;
pub mod manifest;
pub mod pipeline;
pub mod store;
pub mod validate;

pub use assemble::{assemble_output, output_name, verify_output_package};
pub use carry_over::carry_over;
pub use coordination::{Extraction, extract_package};
pub use intake::{CoordinationPackage, PlaceholderLogo, TemplateFile, unpack_package, unpack_templates};
pub use manifest::Manifest;
pub use pipeline::{Assembled, LogoReplaced, Pipeline, Substituted, Unpacked, Validated, localise};
pub use store::DocumentStore;
pub use validate::{ExpectedTokens, ManifestValidator, SubstitutionPlan};

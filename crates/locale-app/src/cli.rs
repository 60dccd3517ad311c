// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LOCALE — localisation of clinical trial template files with site-specific
/// values and site logo.
#[derive(Parser, Debug)]
#[command(name = "locale", version, about, long_about = "\
LOCALE localises .docx template packages for participating sites.

WORKFLOW:
    Coordination team:
        locale extract templates.zip -o localisation.csv
        (fill in document_type, zip templates + placeholder logo + localisation.csv)

    Site:
        locale inspect package.zip -o review.csv [--previous old/localisation.csv]
        (fill in the localisation column of review.csv)
        locale localise package.zip --logo site_logo.png --manifest review.csv

CONFIGURATION:
    Settings are read from --config, else from $XDG_CONFIG_HOME/locale/config.json
    (or ~/.config/locale/config.json) when present, else defaults are used.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (JSON)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a draft localisation.csv from a zip of templates
    Extract {
        /// Zip of .docx templates
        #[arg(value_name = "TEMPLATES_ZIP")]
        templates: PathBuf,

        /// Where to write the manifest
        #[arg(short, long, default_value = "localisation.csv")]
        output: PathBuf,

        /// Variable prefix (default from config, normally "<<")
        #[arg(long)]
        prefix: Option<String>,

        /// Variable suffix (default from config, normally ">>")
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Validate a coordination package and write the review manifest
    Inspect {
        /// Coordination package zip
        #[arg(value_name = "PACKAGE_ZIP")]
        package: PathBuf,

        /// localisation.csv from an earlier localisation, to reuse its values
        #[arg(long, value_name = "CSV")]
        previous: Option<PathBuf>,

        /// Where to write the review manifest
        #[arg(short, long, default_value = "review.csv")]
        output: PathBuf,
    },

    /// Substitute values and the site logo, and write the site package
    Localise {
        /// Coordination package zip
        #[arg(value_name = "PACKAGE_ZIP")]
        package: PathBuf,

        /// Site logo (PNG or JPEG)
        #[arg(long, value_name = "IMAGE")]
        logo: PathBuf,

        /// Filled-in manifest to use instead of the package's own
        #[arg(long, value_name = "CSV")]
        manifest: Option<PathBuf>,

        /// Where to write the site package
        #[arg(short, long, default_value = "localised_documents.zip")]
        output: PathBuf,

        /// Also write a JSON run report
        #[arg(long, value_name = "JSON")]
        report: Option<PathBuf>,
    },
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// LOCALE — localisation of clinical trial template packages
//
// Entry point. Initialises logging, resolves configuration, and dispatches
// the subcommand.

mod cli;
mod commands;
mod services;

use std::process::ExitCode;

use clap::Parser;
use locale_core::error::Result;
use locale_core::human_errors::humanize_error;
use locale_core::types::Diagnostic;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use services::config_dir::load_config;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("LOCALE starting");

    match run(cli) {
        Ok(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("warning: {diagnostic}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(error = %err, "run failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Vec<Diagnostic>> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Extract {
            templates,
            output,
            prefix,
            suffix,
        } => {
            if let Some(prefix) = prefix {
                config.delimiters.prefix = prefix;
            }
            if let Some(suffix) = suffix {
                config.delimiters.suffix = suffix;
            }
            commands::extract(&config, &templates, &output)
        }
        Command::Inspect {
            package,
            previous,
            output,
        } => commands::inspect(config, &package, previous.as_deref(), &output),
        Command::Localise {
            package,
            logo,
            manifest,
            output,
            report,
        } => commands::localise(
            config,
            &package,
            &logo,
            manifest.as_deref(),
            &output,
            report.as_deref(),
        ),
    }
}

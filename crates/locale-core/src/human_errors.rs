// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing error messages.
//
// Coordination and site staff are not developers. Every technical error is
// mapped to a plain sentence that names the document, column or value at
// fault, plus what to change before trying again.

use crate::error::LocaleError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The package itself must be fixed and re-sent (coordination side).
    PackageFix,
    /// The operator can fix it locally (edit the CSV, pick another file).
    ActionRequired,
    /// Nothing the operator can change; report it.
    Internal,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `LocaleError` into a `HumanError`.
pub fn humanize_error(err: &LocaleError) -> HumanError {
    match err {
        LocaleError::PackageFormat(detail) => HumanError {
            message: "The zip package could not be opened.".into(),
            suggestion: format!(
                "Check that you selected the zip file sent by the coordination team and that it downloaded completely. ({detail})"
            ),
            severity: Severity::PackageFix,
        },

        LocaleError::MissingComponent { missing } => HumanError {
            message: "One or more required files are missing from the zip package.".into(),
            suggestion: format!(
                "The package must contain: {}. Ask the coordination team for a complete package.",
                missing
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            severity: Severity::PackageFix,
        },

        LocaleError::DuplicateTemplate(name) => HumanError {
            message: format!("Two templates in the package are both called '{name}'."),
            suggestion: "Rename one of them so that every template name is unique.".into(),
            severity: Severity::PackageFix,
        },

        LocaleError::Schema { file, missing } => HumanError {
            message: format!("'{file}' is missing columns: {}.", missing.join(", ")),
            suggestion: "The first row must contain document_type, document_name and variable (localisation is optional).".into(),
            severity: Severity::ActionRequired,
        },

        LocaleError::InvalidRow { file, line, reason } => HumanError {
            message: format!("'{file}' has a problem on line {line}."),
            suggestion: format!("Correct that row and try again. ({reason})"),
            severity: Severity::ActionRequired,
        },

        LocaleError::SetMismatch {
            manifest_only,
            templates_only,
        } => {
            let mut parts = Vec::new();
            if !manifest_only.is_empty() {
                parts.push(format!(
                    "Documents in the CSV but not in the zip: {}.",
                    manifest_only.iter().cloned().collect::<Vec<_>>().join(", ")
                ));
            }
            if !templates_only.is_empty() {
                parts.push(format!(
                    "Documents in the zip but not in the CSV: {}.",
                    templates_only.iter().cloned().collect::<Vec<_>>().join(", ")
                ));
            }
            HumanError {
                message: "The document lists do not match.".into(),
                suggestion: format!(
                    "{} Every document_name in the CSV must match a template file name exactly.",
                    parts.join(" ")
                ),
                severity: Severity::PackageFix,
            }
        }

        LocaleError::ConflictingLocalisation {
            document,
            variable,
            values,
        } => HumanError {
            message: format!("{variable} in '{document}' has more than one value."),
            suggestion: format!(
                "Keep one of these values and remove the others: {}.",
                values.join(" / ")
            ),
            severity: Severity::ActionRequired,
        },

        LocaleError::InvalidDelimiters(detail) => HumanError {
            message: "The variable prefix or suffix is not usable.".into(),
            suggestion: format!("Enter the characters that surround variables, such as << and >>. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LocaleError::Config(detail) => HumanError {
            message: "The settings file has a value LOCALE cannot use.".into(),
            suggestion: format!("Correct the setting in the config file, or delete the file to use the defaults. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LocaleError::DocumentFormat { document, reason } => HumanError {
            message: format!("'{document}' could not be read as a Word document."),
            suggestion: format!("Open it in Word, save it again as .docx, and rebuild the package. ({reason})"),
            severity: Severity::PackageFix,
        },

        LocaleError::PlaceholderLogo { name, reason } => HumanError {
            message: format!("The placeholder logo '{name}' could not be read."),
            suggestion: format!("The package needs a PNG or JPEG copy of the placeholder logo. ({reason})"),
            severity: Severity::PackageFix,
        },

        LocaleError::InvalidImage(detail) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: format!("Try saving the logo as a PNG or JPEG first. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LocaleError::OutputMismatch { .. } => HumanError {
            message: "The localised package came out incomplete.".into(),
            suggestion: format!("Please report this. ({err})"),
            severity: Severity::Internal,
        },

        LocaleError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "LOCALE doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file to a different folder first.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: format!("Try again. If this keeps happening, your disk may be full. ({io_err})"),
                    severity: Severity::ActionRequired,
                }
            }
        }

        LocaleError::Csv(csv_err) => HumanError {
            message: "The CSV file could not be read.".into(),
            suggestion: format!("Save it again as comma-separated UTF-8 from your spreadsheet program. ({csv_err})"),
            severity: Severity::ActionRequired,
        },

        LocaleError::Serialization(_) => HumanError {
            message: "A settings or report file is not valid JSON.".into(),
            suggestion: "Check the config file, or delete it to use the defaults.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

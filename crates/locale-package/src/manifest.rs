// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Localisation manifest — `localisation.csv` parsing and serialisation.
//
// Column order on write: document_type, document_name, [related_paragraph],
// variable, localisation. On read, columns are located by header name and
// unknown columns are ignored.

use std::collections::BTreeSet;

use locale_core::error::{LocaleError, Result};
use locale_core::types::ManifestRow;
use tracing::{debug, instrument};

pub const COL_DOCUMENT_TYPE: &str = "document_type";
pub const COL_DOCUMENT_NAME: &str = "document_name";
pub const COL_RELATED_PARAGRAPH: &str = "related_paragraph";
pub const COL_VARIABLE: &str = "variable";
pub const COL_LOCALISATION: &str = "localisation";

/// Columns every manifest must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_DOCUMENT_TYPE, COL_DOCUMENT_NAME, COL_VARIABLE];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    file_name: String,
    rows: Vec<ManifestRow>,
    has_localisation_column: bool,
    has_related_paragraph: bool,
}

impl Manifest {
    /// Build from rows, e.g. after extraction or review.
    pub fn from_rows(file_name: impl Into<String>, rows: Vec<ManifestRow>) -> Self {
        let has_related_paragraph = rows.iter().any(|row| row.related_paragraph.is_some());
        Self {
            file_name: file_name.into(),
            rows,
            has_localisation_column: true,
            has_related_paragraph,
        }
    }

    /// Parse CSV bytes. `file_name` is used in error messages.
    ///
    /// A missing `localisation` column is treated as present and empty.
    /// Rows with every field blank are skipped; a row with a blank
    /// `document_name` or `variable` is an error.
    #[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
    pub fn from_csv(bytes: &[u8], file_name: &str) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let position = |column: &str| headers.iter().position(|h| h == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| position(column).is_none())
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LocaleError::Schema {
                file: file_name.to_string(),
                missing,
            });
        }

        let required = |column: &str| {
            position(column).ok_or_else(|| LocaleError::Schema {
                file: file_name.to_string(),
                missing: vec![column.to_string()],
            })
        };
        let type_at = required(COL_DOCUMENT_TYPE)?;
        let name_at = required(COL_DOCUMENT_NAME)?;
        let variable_at = required(COL_VARIABLE)?;
        let localisation_at = position(COL_LOCALISATION);
        let related_at = position(COL_RELATED_PARAGRAPH);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line());
            let field = |index: Option<usize>| {
                index
                    .and_then(|i| record.get(i))
                    .unwrap_or("")
                    .to_string()
            };

            let row = ManifestRow {
                document_type: field(Some(type_at)).trim().to_string(),
                document_name: field(Some(name_at)).trim().to_string(),
                related_paragraph: related_at.map(|i| field(Some(i))),
                variable: field(Some(variable_at)).trim().to_string(),
                localisation: field(localisation_at),
            };
            for (column, value) in [
                (COL_DOCUMENT_NAME, &row.document_name),
                (COL_VARIABLE, &row.variable),
            ] {
                if value.is_empty() {
                    return Err(LocaleError::InvalidRow {
                        file: file_name.to_string(),
                        line,
                        reason: format!("{column} is empty"),
                    });
                }
            }
            rows.push(row);
        }

        debug!(file = file_name, rows = rows.len(), "manifest parsed");
        Ok(Self {
            file_name: file_name.to_string(),
            rows,
            has_localisation_column: localisation_at.is_some(),
            has_related_paragraph: related_at.is_some(),
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    /// Whether the source file had a `localisation` column.
    pub fn has_localisation_column(&self) -> bool {
        self.has_localisation_column
    }

    pub fn has_related_paragraph(&self) -> bool {
        self.has_related_paragraph
    }

    /// Distinct document names referenced by the rows.
    pub fn document_names(&self) -> BTreeSet<String> {
        self.rows.iter().map(|row| row.document_name.clone()).collect()
    }

    /// `document_type` of a document: the first non-empty value among its
    /// rows.
    pub fn document_type(&self, document_name: &str) -> Option<&str> {
        self.rows
            .iter()
            .filter(|row| row.document_name == document_name)
            .map(|row| row.document_type.as_str())
            .find(|t| !t.is_empty())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise as CSV. `related_paragraph` is written only when requested
    /// and the rows carry it.
    pub fn to_csv(&self, include_related_paragraph: bool) -> Result<Vec<u8>> {
        let with_related = include_related_paragraph && self.has_related_paragraph;
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![COL_DOCUMENT_TYPE, COL_DOCUMENT_NAME];
        if with_related {
            header.push(COL_RELATED_PARAGRAPH);
        }
        header.extend([COL_VARIABLE, COL_LOCALISATION]);
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.document_type.as_str(), row.document_name.as_str()];
            if with_related {
                record.push(row.related_paragraph.as_deref().unwrap_or(""));
            }
            record.extend([row.variable.as_str(), row.localisation.as_str()]);
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|err| LocaleError::Io(err.into_error()))
    }
}

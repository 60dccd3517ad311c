// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cross-amendment carry-over — reuse values from an earlier localisation.
//
// Document names change between protocol amendments but document types and
// variables stay put, so rows are matched on (document_type, variable).

use locale_core::error::{LocaleError, Result};
use locale_core::types::ManifestRow;
use tracing::{info, instrument};

use crate::manifest::{COL_LOCALISATION, Manifest};

/// Fill empty `localisation` values in `rows` from `previous`.
///
/// The first previous row with the same (document_type, variable) and a
/// non-empty value supplies the value. Rows that already have a value are
/// left alone. Returns the number of rows filled.
#[instrument(skip_all, fields(previous = previous.file_name(), rows = rows.len()))]
pub fn carry_over(rows: &mut [ManifestRow], previous: &Manifest) -> Result<usize> {
    if !previous.has_localisation_column() {
        return Err(LocaleError::Schema {
            file: previous.file_name().to_string(),
            missing: vec![COL_LOCALISATION.to_string()],
        });
    }

    let mut filled = 0usize;
    for row in rows.iter_mut().filter(|row| row.localisation.is_empty()) {
        let value = previous
            .rows()
            .iter()
            .find(|old| {
                old.document_type == row.document_type
                    && old.variable == row.variable
                    && !old.localisation.is_empty()
            })
            .map(|old| old.localisation.as_str());
        if let Some(value) = value {
            row.localisation = value.to_string();
            filled += 1;
        }
    }
    info!(filled, "previous localisation values imported");
    Ok(filled)
}

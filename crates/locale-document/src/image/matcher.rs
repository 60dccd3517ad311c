// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Placeholder matching by image content. Names never take part: a logo is
// recognised only by its fingerprint.

use locale_core::error::Result;
use locale_core::types::Fingerprint;
use tracing::debug;

use super::processor::ImageProcessor;

/// Fingerprint of encoded image bytes.
pub fn fingerprint(image_bytes: &[u8]) -> Result<Fingerprint> {
    Ok(ImageProcessor::from_bytes(image_bytes)?.average_hash())
}

/// First candidate whose fingerprint equals `reference` exactly.
///
/// Candidates that do not decode (vector formats, corrupt data) are passed
/// over.
pub fn find_match<'a, I>(candidates: I, reference: &Fingerprint) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    for (name, bytes) in candidates {
        match fingerprint(bytes) {
            Ok(candidate) if candidate.matches(reference) => return Some(name),
            Ok(candidate) => {
                debug!(member = name, fingerprint = %candidate, "no match");
            }
            Err(err) => {
                debug!(member = name, error = %err, "candidate not decodable");
            }
        }
    }
    None
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding, average-hash fingerprints, and placeholder
// matching over embedded media.

pub mod matcher;
pub mod processor;

pub use matcher::{find_match, fingerprint};
pub use processor::ImageProcessor;

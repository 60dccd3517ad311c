// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LocaleError, Result};
use crate::types::{Delimiters, DuplicatePolicy, Precedence};

/// Name of the manifest file inside every package.
pub const DEFAULT_MANIFEST_FILE: &str = "localisation.csv";

/// Prefix added to each template name in the output package.
pub const DEFAULT_OUTPUT_PREFIX: &str = "localised_";

/// Settings for extraction, validation and localisation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Variable delimiters used when extracting tokens from templates.
    pub delimiters: Delimiters,
    /// File name of the manifest inside input and output packages.
    pub manifest_file_name: String,
    /// Prefix for localised document names in the output package.
    pub output_prefix: String,
    /// Policy for conflicting duplicate manifest rows.
    pub duplicate_policy: DuplicatePolicy,
    /// Order in which a paragraph's substitutions are applied.
    pub precedence: Precedence,
    /// Write the `related_paragraph` audit column into output manifests.
    pub include_related_paragraph: bool,
    /// Root for per-operation scratch directories (system temp dir if unset).
    pub scratch_dir: Option<PathBuf>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            manifest_file_name: DEFAULT_MANIFEST_FILE.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            duplicate_policy: DuplicatePolicy::Reject,
            precedence: Precedence::Sequential,
            include_related_paragraph: true,
            scratch_dir: None,
        }
    }
}

impl LocaleConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.delimiters.validate()?;
        if self.output_prefix.is_empty() {
            return Err(LocaleError::Config("output_prefix must not be empty".into()));
        }
        if self.manifest_file_name.is_empty() {
            return Err(LocaleError::Config("manifest_file_name must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LocaleConfig =
            serde_json::from_str(r#"{"delimiters": {"prefix": "{{", "suffix": "}}"}}"#).unwrap();
        assert_eq!(config.delimiters, Delimiters::new("{{", "}}"));
        assert_eq!(config.manifest_file_name, DEFAULT_MANIFEST_FILE);
        assert_eq!(config.output_prefix, DEFAULT_OUTPUT_PREFIX);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn policies_use_snake_case() {
        let config: LocaleConfig =
            serde_json::from_str(r#"{"duplicate_policy": "last_wins", "precedence": "first_match"}"#)
                .unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::LastWins);
        assert_eq!(config.precedence, Precedence::FirstMatch);
    }

    #[test]
    fn empty_prefix_is_invalid() {
        let config = LocaleConfig {
            output_prefix: String::new(),
            ..LocaleConfig::default()
        };
        assert!(matches!(config.validate(), Err(LocaleError::Config(_))));
    }

    #[test]
    fn empty_manifest_name_is_a_config_error() {
        let config = LocaleConfig {
            manifest_file_name: String::new(),
            ..LocaleConfig::default()
        };
        assert!(matches!(config.validate(), Err(LocaleError::Config(_))));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = LocaleConfig {
            include_related_paragraph: false,
            ..LocaleConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(LocaleConfig::load(&path).unwrap(), config);
    }
}

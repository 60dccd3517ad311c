// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config directory resolution and config loading.

use std::path::{Path, PathBuf};

use locale_core::LocaleConfig;
use locale_core::error::Result;
use tracing::debug;

const CONFIG_FILE: &str = "config.json";

/// Return the application config directory. Not created here; a missing
/// directory just means defaults.
pub fn config_dir() -> PathBuf {
    dirs_fallback().join("locale")
}

/// Resolve the effective configuration.
///
/// An explicit path must exist and parse. Otherwise the per-user config file
/// is used when present, and defaults when not.
pub fn load_config(explicit: Option<&Path>) -> Result<LocaleConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return LocaleConfig::load(path);
    }
    let default_path = config_dir().join(CONFIG_FILE);
    if default_path.is_file() {
        debug!(path = %default_path.display(), "loading config");
        return LocaleConfig::load(&default_path);
    }
    debug!("no config file, using defaults");
    Ok(LocaleConfig::default())
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    std::env::temp_dir()
}

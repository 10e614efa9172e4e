//! Application directory paths for Folio.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/folio/` | `~/.local/share/folio/` |
//! | Config | `~/Library/Application Support/folio/` | `~/.config/folio/` |
//!
//! Overrides for tests and custom deployments:
//! - `FOLIO_DATA_DIR` overrides [`data_dir`]
//! - `FOLIO_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root. Holds the reading progress file.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("FOLIO_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("folio"))
        .unwrap_or_else(|| PathBuf::from("/tmp/folio-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("FOLIO_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("folio"))
        .unwrap_or_else(|| PathBuf::from("/tmp/folio-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Reading progress file path (`data_dir()/progress.json`).
#[must_use]
pub fn progress_file() -> PathBuf {
    data_dir().join("progress.json")
}

//! Application configuration, persisted as TOML.
//!
//! ```toml
//! [matching]
//! max_results = 20
//! chapter_epsilon = 0.1
//!
//! [matching.progress]
//! completion_threshold = 0.9
//!
//! [store]
//! progress_file = "/home/me/.local/share/folio/progress.json"
//! ```
//!
//! Missing sections and fields fall back to defaults.

use std::path::{Path, PathBuf};

use folio_match::MatchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// Search ranking, resolution, chapter matching and progress cadence.
    pub matching: MatchConfig,
    pub store: StoreConfig,
}

/// Where reading progress is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Progress file. Defaults to [`crate::folio_dirs::progress_file`].
    pub progress_file: Option<PathBuf>,
}

impl StoreConfig {
    /// The configured progress file or the platform default.
    pub fn progress_path(&self) -> PathBuf {
        self.progress_file
            .clone()
            .unwrap_or_else(crate::folio_dirs::progress_file)
    }
}

impl FolioConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| FolioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// A file that exists but is unreadable or invalid is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::from_file(path) {
            Err(FolioError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FolioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.matching.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(FolioConfig::default().validate().is_ok());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = FolioConfig::default();
        config.matching.max_results = 7;
        config.matching.progress.completion_threshold = 0.95;
        config.store.progress_file = Some(dir.path().join("p.json"));

        config.save_to_file(&path).expect("save");
        let loaded = FolioConfig::from_file(&path).expect("load");
        assert_eq!(loaded.matching.max_results, 7);
        assert!((loaded.matching.progress.completion_threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(loaded.store.progress_path(), dir.path().join("p.json"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[matching]\nmin_relevance_score = 40\n").expect("write");

        let loaded = FolioConfig::from_file(&path).expect("load");
        assert_eq!(loaded.matching.min_relevance_score, 40);
        assert_eq!(loaded.matching.max_results, 20);
        assert!(loaded.store.progress_file.is_none());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded =
            FolioConfig::load_or_default(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(loaded.matching.max_results, 20);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");

        assert!(FolioConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[matching]\nmax_results = 0\n").expect("write");

        let err = FolioConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }
}

//! Error types for the folio application layer.

use folio_match::MatchError;

/// Top-level error type for reading sessions, configuration and storage.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    /// Matching, resolution or provider failure from the core.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Configuration could not be parsed, serialized or validated.
    #[error("config error: {0}")]
    Config(String),

    /// Progress file could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// Host bridge protocol failure.
    #[error("bridge error: {0}")]
    Bridge(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FolioError {
    /// Returns `true` when a newer load replaced the one that failed.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Match(MatchError::Superseded(_)))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_errors_display_unchanged() {
        let err = FolioError::from(MatchError::MatchNotFound("Monster".into()));
        assert_eq!(err.to_string(), "no provider matched: Monster");
    }

    #[test]
    fn superseded_is_detected() {
        assert!(FolioError::from(MatchError::Superseded(4)).is_superseded());
        assert!(!FolioError::Config("bad".into()).is_superseded());
    }

    #[test]
    fn io_errors_convert() {
        let err: FolioError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.to_string().contains("gone"));
    }
}

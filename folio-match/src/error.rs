//! Error types for the folio-match crate.
//!
//! Messages are stable strings suitable for display and for matching in
//! tests. Provider failures carry the provider name so callers can report
//! which source was skipped.

/// Errors produced while matching works, chapters and progress.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A content provider failed (network, parse, or upstream refusal).
    ///
    /// Non-fatal during fan-out: the provider is skipped and others continue.
    #[error("provider error: {0}")]
    Provider(String),

    /// A provider call exceeded its configured timeout.
    #[error("provider timed out: {0}")]
    Timeout(String),

    /// Every provider queried during a search fan-out failed.
    #[error("all providers failed: {0}")]
    AllProvidersFailed(String),

    /// A chapter list was empty, so no chapter can be chosen.
    #[error("chapter not found: {0}")]
    NotFound(String),

    /// No provider produced a source instance for a work.
    #[error("no provider matched: {0}")]
    MatchNotFound(String),

    /// The progress store rejected a read or write.
    #[error("progress store error: {0}")]
    Store(String),

    /// A load finished after a newer load had already started.
    #[error("load {0} superseded by a newer request")]
    Superseded(u64),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl MatchError {
    /// Returns `true` for failures that only affect a single provider.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Timeout(_))
    }
}

/// Convenience type alias for folio-match results.
pub type Result<T> = std::result::Result<T, MatchError>;

//! Matching configuration with sensible defaults.
//!
//! [`MatchConfig`] controls ranking thresholds, provider timeouts, chapter
//! matching tolerances and progress tracking cadence. The chapter tolerances
//! are empirically chosen and kept here rather than inlined.

use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Configuration for search ranking, source resolution and chapter matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Maximum number of ranked search results returned.
    pub max_results: usize,
    /// Results scoring below this are dropped by the relevance scorer.
    pub min_relevance_score: u32,
    /// Titles shorter than this many characters get a small bonus.
    pub short_title_bonus_len: usize,
    /// Query tokens shorter than this are ignored.
    pub min_token_len: usize,
    /// How many alternate titles the resolver tries per provider.
    pub max_alternate_titles: usize,
    /// Per-provider call timeout in seconds.
    pub provider_timeout_seconds: u64,
    /// Search cache TTL in seconds. Set to 0 to disable caching.
    pub cache_ttl_seconds: u64,
    /// Tolerance for approximate chapter number matches.
    pub chapter_epsilon: f64,
    /// Maximum chapter distance accepted when matching imported records.
    pub import_chapter_window: f64,
    /// Consecutive failures before a provider's circuit opens.
    pub failure_threshold: u32,
    /// Seconds an open circuit waits before allowing a probe.
    pub cooldown_secs: u64,
    /// Progress tracking settings.
    pub progress: ProgressConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_results: 20,
            min_relevance_score: 25,
            short_title_bonus_len: 50,
            min_token_len: 3,
            max_alternate_titles: 3,
            provider_timeout_seconds: 8,
            cache_ttl_seconds: 300,
            chapter_epsilon: 0.1,
            import_chapter_window: 5.0,
            failure_threshold: 3,
            cooldown_secs: 60,
            progress: ProgressConfig::default(),
        }
    }
}

/// Progress tracking cadence and completion threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Scroll fraction on the last page that counts as finished.
    pub completion_threshold: f64,
    /// Minimum interval between viewport-driven recomputations.
    pub viewport_throttle_ms: u64,
    /// Quiet period after pointer/keyboard activity before flushing.
    pub activity_debounce_ms: u64,
    /// Interval of the periodic background flush.
    pub periodic_flush_secs: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            completion_threshold: 0.9,
            viewport_throttle_ms: 200,
            activity_debounce_ms: 1000,
            periodic_flush_secs: 30,
        }
    }
}

impl MatchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.max_results == 0 {
            return Err(MatchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.provider_timeout_seconds == 0 {
            return Err(MatchError::Config(
                "provider_timeout_seconds must be greater than 0".into(),
            ));
        }
        if !(self.chapter_epsilon.is_finite() && self.chapter_epsilon >= 0.0) {
            return Err(MatchError::Config(
                "chapter_epsilon must be a non-negative number".into(),
            ));
        }
        if !(self.import_chapter_window.is_finite() && self.import_chapter_window >= 0.0) {
            return Err(MatchError::Config(
                "import_chapter_window must be a non-negative number".into(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(MatchError::Config(
                "failure_threshold must be greater than 0".into(),
            ));
        }
        self.progress.validate()
    }
}

impl ProgressConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.completion_threshold) {
            return Err(MatchError::Config(
                "completion_threshold must be within [0, 1]".into(),
            ));
        }
        if self.periodic_flush_secs == 0 {
            return Err(MatchError::Config(
                "periodic_flush_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

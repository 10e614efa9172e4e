//! # folio-match
//!
//! Cross-provider matching for Folio: find a title across content
//! providers, pick the right chapter on each of them, and track how far
//! the reader got.
//!
//! ## Design
//!
//! - Providers implement [`ContentProvider`] and are registered once in a
//!   [`ProviderRegistry`]; registration order is the merge order
//! - Search results are ranked by the relevance scorer and collapsed by the
//!   deduplicator
//! - The source resolver tries a canonical reference, the primary title and
//!   a few alternate titles on every provider concurrently
//! - The chapter matcher always returns a chapter for a non-empty list,
//!   degrading from exact to nearest
//! - The progress tracker derives position from page geometry and fires
//!   completion once per chapter load
//! - A [`LoadSequencer`] discards loads that finish after a newer one began
//!
//! ## Failure model
//!
//! A failing provider is skipped and logged; only when every provider fails
//! does a search error. Progress store failures never interrupt reading.
//! Queries are logged at trace level only.

pub mod cache;
pub mod chapters;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod hub;
pub mod orchestrator;
pub mod progress;
pub mod provider;
pub mod sequence;
pub mod types;

pub use chapters::{
    adjacent, match_chapter, match_imported_chapter, sort_chapters, ChapterMatch, Direction,
    MatchStrategy,
};
pub use config::{MatchConfig, ProgressConfig};
pub use error::{MatchError, Result};
pub use hub::ProviderHub;
pub use orchestrator::dedup::deduplicate;
pub use orchestrator::normalize::normalize_title;
pub use orchestrator::resolve::ResolvedSources;
pub use orchestrator::scoring::{rank_results, relevance_score};
pub use progress::{
    compute_position, FlushScheduler, Layout, MemoryProgressStore, PagePosition, ProgressEvent,
    ProgressStore, ProgressTracker, ProgressUpdate, Span, TrackerSignal,
};
pub use provider::{ContentProvider, ProviderRegistry};
pub use sequence::{LoadSequencer, LoadTicket};
pub use types::{Chapter, Page, ReadingProgress, SearchResult, SourceInstance, Work};

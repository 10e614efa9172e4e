//! Single-writer owner of the active chapter's reading progress.
//!
//! The tracker derives position from layout snapshots, fires the
//! completion event at most once per chapter load, and persists through a
//! [`ProgressStore`]. Store failures are logged; the in-memory state still
//! advances.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::ProgressConfig;
use crate::types::ReadingProgress;

use super::geometry::{compute_position, Layout, PagePosition};
use super::store::ProgressStore;

/// Events emitted by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The reader reached the end of a chapter.
    ChapterCompleted {
        work_id: String,
        provider_name: String,
        chapter_number: f64,
    },
}

/// Result of one recomputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub position: Option<PagePosition>,
    /// `true` only on the update that first satisfied completion.
    pub completed_now: bool,
}

pub struct ProgressTracker {
    progress: ReadingProgress,
    config: ProgressConfig,
    store: Arc<dyn ProgressStore>,
    events: Option<mpsc::UnboundedSender<ProgressEvent>>,
    completion_fired: bool,
    last_persisted: Option<ReadingProgress>,
    last_layout: Option<Layout>,
}

impl ProgressTracker {
    /// Start tracking `progress`.
    ///
    /// A record that is already complete does not fire completion again.
    pub fn new(
        store: Arc<dyn ProgressStore>,
        progress: ReadingProgress,
        config: ProgressConfig,
    ) -> Self {
        Self {
            completion_fired: progress.completed,
            progress,
            config,
            store,
            events: None,
            last_persisted: None,
            last_layout: None,
        }
    }

    /// Send completion events on `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn progress(&self) -> &ReadingProgress {
        &self.progress
    }

    pub fn last_layout(&self) -> Option<&Layout> {
        self.last_layout.as_ref()
    }

    /// Start a new chapter-load session on the same work and provider.
    pub fn begin_chapter(&mut self, chapter_number: f64, total_pages: u32) {
        self.progress = ReadingProgress::start(
            self.progress.work_id.clone(),
            self.progress.provider_name.clone(),
            chapter_number,
            total_pages,
        );
        self.completion_fired = false;
        self.last_layout = None;
    }

    /// Recompute from a new layout snapshot.
    pub fn update(&mut self, layout: Layout) -> ProgressUpdate {
        let position = compute_position(&layout);
        self.last_layout = Some(layout);
        let completed_now = match position {
            Some(position) => self.apply_position(position),
            None => false,
        };
        ProgressUpdate {
            position,
            completed_now,
        }
    }

    /// Recompute from the most recent layout, if any.
    pub fn refresh(&mut self) -> ProgressUpdate {
        match self.last_layout.clone() {
            Some(layout) => self.update(layout),
            None => ProgressUpdate {
                position: None,
                completed_now: false,
            },
        }
    }

    /// Apply an already-derived position. Returns `true` if this completed
    /// the chapter.
    pub fn apply_position(&mut self, position: PagePosition) -> bool {
        self.progress.total_pages = position.total_pages.max(1);
        self.progress
            .set_position(position.page_number, position.scroll_fraction);
        self.check_completion()
    }

    /// Edge-triggered completion check.
    ///
    /// Fires once when the reader is on the last page past the completion
    /// threshold; later calls return `false` until the next chapter load.
    pub fn check_completion(&mut self) -> bool {
        let reached = self.progress.page_number >= self.progress.total_pages
            && self.progress.scroll_fraction >= self.config.completion_threshold;
        if !reached || self.completion_fired {
            return false;
        }

        self.completion_fired = true;
        self.progress.completed = true;
        tracing::info!(
            work = %self.progress.work_id,
            provider = %self.progress.provider_name,
            chapter = self.progress.chapter_number,
            "chapter completed"
        );
        if let Some(tx) = &self.events {
            let event = ProgressEvent::ChapterCompleted {
                work_id: self.progress.work_id.clone(),
                provider_name: self.progress.provider_name.clone(),
                chapter_number: self.progress.chapter_number,
            };
            if tx.send(event).is_err() {
                tracing::debug!("completion listener dropped");
            }
        }
        true
    }

    /// Whether in-memory progress differs from what was last persisted.
    pub fn is_dirty(&self) -> bool {
        self.last_persisted.as_ref() != Some(&self.progress)
    }

    /// Persist the current progress if it changed. Returns `true` if a write
    /// happened.
    pub async fn flush(&mut self) -> bool {
        if !self.is_dirty() {
            return false;
        }
        let snapshot = self.progress.clone();
        match self
            .store
            .put(&snapshot.work_id, &snapshot.provider_name, &snapshot)
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    page = snapshot.page_number,
                    fraction = snapshot.scroll_fraction,
                    "progress persisted"
                );
                self.last_persisted = Some(snapshot);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot persist reading progress");
                false
            }
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("progress", &self.progress)
            .field("completion_fired", &self.completion_fired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MatchError, Result};
    use crate::progress::geometry::Span;
    use crate::progress::store::MemoryProgressStore;
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl ProgressStore for FailingStore {
        async fn get(&self, _w: &str, _p: &str) -> Result<Option<ReadingProgress>> {
            Err(MatchError::Store("offline".into()))
        }

        async fn put(&self, _w: &str, _p: &str, _progress: &ReadingProgress) -> Result<()> {
            Err(MatchError::Store("offline".into()))
        }
    }

    fn pages(count: usize) -> Vec<Span> {
        (0..count).map(|i| Span::new(i as f64 * 1000.0, 1000.0)).collect()
    }

    fn at(viewport_top: f64, count: usize) -> Layout {
        Layout {
            viewport: Span::new(viewport_top, 800.0),
            pages: pages(count),
        }
    }

    fn tracker(store: Arc<dyn ProgressStore>) -> ProgressTracker {
        ProgressTracker::new(
            store,
            ReadingProgress::start("w", "p", 7.0, 3),
            ProgressConfig::default(),
        )
    }

    #[test]
    fn completion_fires_exactly_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut t = tracker(Arc::new(MemoryProgressStore::new())).with_events(tx);

        assert!(t.apply_position(PagePosition {
            page_number: 3,
            scroll_fraction: 1.0,
            total_pages: 3,
        }));
        assert!(!t.apply_position(PagePosition {
            page_number: 3,
            scroll_fraction: 1.0,
            total_pages: 3,
        }));
        assert!(t.progress().completed);

        let Ok(ProgressEvent::ChapterCompleted { chapter_number, .. }) = rx.try_recv() else {
            panic!("expected a completion event");
        };
        assert!((chapter_number - 7.0).abs() < f64::EPSILON);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn below_threshold_does_not_complete() {
        let mut t = tracker(Arc::new(MemoryProgressStore::new()));
        assert!(!t.apply_position(PagePosition {
            page_number: 3,
            scroll_fraction: 0.85,
            total_pages: 3,
        }));
        assert!(!t.apply_position(PagePosition {
            page_number: 2,
            scroll_fraction: 1.0,
            total_pages: 3,
        }));
        assert!(!t.progress().completed);
    }

    #[test]
    fn scrolling_back_does_not_refire() {
        let mut t = tracker(Arc::new(MemoryProgressStore::new()));
        assert!(t.update(at(2600.0, 3)).completed_now);
        assert!(!t.update(at(0.0, 3)).completed_now);
        assert!(!t.update(at(2600.0, 3)).completed_now);
        assert!(t.progress().completed);
    }

    #[test]
    fn begin_chapter_rearms_completion() {
        let mut t = tracker(Arc::new(MemoryProgressStore::new()));
        assert!(t.update(at(2600.0, 3)).completed_now);
        t.begin_chapter(8.0, 2);
        assert!(!t.progress().completed);
        assert_eq!(t.progress().page_number, 1);
        assert!(t.update(at(1600.0, 2)).completed_now);
    }

    #[test]
    fn already_completed_record_does_not_refire() {
        let mut progress = ReadingProgress::start("w", "p", 7.0, 3);
        progress.completed = true;
        let mut t = ProgressTracker::new(
            Arc::new(MemoryProgressStore::new()),
            progress,
            ProgressConfig::default(),
        );
        assert!(!t.update(at(2600.0, 3)).completed_now);
    }

    #[test]
    fn update_records_page_and_fraction() {
        let mut t = tracker(Arc::new(MemoryProgressStore::new()));
        let update = t.update(at(1000.0, 3));
        let position = update.position.expect("position");
        assert_eq!(position.page_number, 2);
        assert_eq!(t.progress().page_number, 2);
        assert!((t.progress().scroll_fraction - 0.4).abs() < 1e-9);
    }

    #[test]
    fn refresh_without_layout_is_noop() {
        let mut t = tracker(Arc::new(MemoryProgressStore::new()));
        let update = t.refresh();
        assert!(update.position.is_none());
        assert!(!update.completed_now);
    }

    #[tokio::test]
    async fn identical_updates_write_once() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut t = tracker(store.clone());

        t.update(at(1000.0, 3));
        assert!(t.flush().await);
        t.update(at(1000.0, 3));
        assert!(!t.flush().await);

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn store_failure_is_not_fatal() {
        let mut t = tracker(Arc::new(FailingStore));
        t.update(at(1000.0, 3));
        assert!(!t.flush().await);
        assert_eq!(t.progress().page_number, 2);
        assert!(t.is_dirty());
    }
}

//! Reading sessions.
//!
//! A [`ReadingSession`] is a plain value describing what is open: the work,
//! the provider instance, the sorted chapter list, the chosen chapter, its
//! pages and the progress record. [`SessionLoader`] operations take a
//! session (or a work) and return a new one; nothing is mutated in place.
//!
//! Every operation takes a ticket from a [`LoadSequencer`] before it
//! starts. A load that finishes after a newer one began fails with
//! [`MatchError::Superseded`] and its result is discarded.

use std::sync::Arc;

use folio_match::chapters::match_sorted;
use folio_match::{
    Chapter, ChapterMatch, Direction, LoadSequencer, LoadTicket, MatchError, MatchStrategy, Page,
    ProgressStore, ProgressTracker, ProviderHub, ReadingProgress, SourceInstance, Work, adjacent,
    match_imported_chapter,
};
use serde::Serialize;

use crate::error::Result;

/// Everything needed to render and track one open chapter.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingSession {
    pub work: Work,
    pub source: SourceInstance,
    /// Chapters on `source`, sorted ascending with ordinals assigned.
    pub chapters: Vec<Chapter>,
    pub chapter: Chapter,
    /// How `chapter` was chosen.
    pub strategy: MatchStrategy,
    pub pages: Vec<Page>,
    pub progress: ReadingProgress,
    #[serde(skip)]
    pub ticket: LoadTicket,
}

impl ReadingSession {
    pub fn has_previous(&self) -> bool {
        adjacent(&self.chapters, self.chapter.ordinal_index, Direction::Previous).is_some()
    }

    pub fn has_next(&self) -> bool {
        adjacent(&self.chapters, self.chapter.ordinal_index, Direction::Next).is_some()
    }
}

/// Opens works and moves between chapters.
pub struct SessionLoader {
    hub: Arc<ProviderHub>,
    store: Arc<dyn ProgressStore>,
    sequencer: LoadSequencer,
}

impl SessionLoader {
    pub fn new(hub: Arc<ProviderHub>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            hub,
            store,
            sequencer: LoadSequencer::new(),
        }
    }

    pub fn hub(&self) -> &ProviderHub {
        &self.hub
    }

    /// Open `work` where the reader left off.
    ///
    /// The first provider (in registry order) holding a progress record
    /// wins; otherwise the first resolved provider. A saved record resumes
    /// at its chapter, or the next one if it was completed. Without a
    /// record the first chapter opens.
    ///
    /// # Errors
    ///
    /// [`MatchError::MatchNotFound`] if no provider has the work,
    /// [`MatchError::NotFound`] for an empty chapter list,
    /// [`MatchError::Superseded`] if a newer load started meanwhile, and
    /// provider failures from the chapter or page fetch.
    pub async fn open(&self, work: &Work) -> Result<ReadingSession> {
        let ticket = self.sequencer.begin();
        tracing::info!(work = %work.title, ticket = ticket.sequence(), "opening work");

        let sources = self.hub.resolve(work).await?;
        self.ensure_current(ticket)?;

        let key = work.key();
        let mut chosen = None;
        for source in sources.iter() {
            if let Some(saved) = self.saved_progress(&key, &source.provider_name).await {
                chosen = Some((source.clone(), Some(saved)));
                break;
            }
        }
        let (source, saved) = match chosen {
            Some(found) => found,
            None => {
                let first = sources
                    .first()
                    .cloned()
                    .ok_or_else(|| MatchError::MatchNotFound(work.title.clone()))?;
                (first, None)
            }
        };

        let chapters = self.hub.chapters(&source).await?;
        self.ensure_current(ticket)?;

        let found = match &saved {
            Some(saved) => match_sorted(saved.resume_target(), &chapters, self.hub.config())?,
            None => first_chapter(&chapters)?,
        };
        self.finish(ticket, work.clone(), source, chapters, found, saved)
            .await
    }

    /// Open an imported record that names a chapter but no provider.
    ///
    /// Providers are tried in registry order; the first whose chapter list
    /// has a match within the import window wins.
    ///
    /// # Errors
    ///
    /// [`MatchError::MatchNotFound`] if no provider has a close enough
    /// chapter, plus the errors of [`open`](Self::open).
    pub async fn open_imported(&self, work: &Work, chapter_number: f64) -> Result<ReadingSession> {
        let ticket = self.sequencer.begin();
        tracing::info!(
            work = %work.title,
            chapter = chapter_number,
            ticket = ticket.sequence(),
            "opening imported work"
        );

        let sources = self.hub.resolve(work).await?;
        self.ensure_current(ticket)?;

        for source in sources {
            let chapters = match self.hub.chapters(&source).await {
                Ok(chapters) => chapters,
                Err(e) => {
                    tracing::warn!(
                        provider = %source.provider_name,
                        error = %e,
                        "skipping provider for import"
                    );
                    continue;
                }
            };
            self.ensure_current(ticket)?;

            if let Some(found) =
                match_imported_chapter(chapter_number, chapters.clone(), self.hub.config())
            {
                let saved = self.saved_progress(&work.key(), &source.provider_name).await;
                return self
                    .finish(ticket, work.clone(), source, chapters, found, saved)
                    .await;
            }
            tracing::debug!(provider = %source.provider_name, "no chapter within import window");
        }

        Err(MatchError::MatchNotFound(format!("{} chapter {chapter_number}", work.title)).into())
    }

    /// Load the chapter matching `target` on the session's provider.
    pub async fn load_chapter(
        &self,
        session: &ReadingSession,
        target: f64,
    ) -> Result<ReadingSession> {
        let found = match_sorted(target, &session.chapters, self.hub.config())?;
        let ticket = self.sequencer.begin();
        let saved = self
            .saved_progress(&session.work.key(), &session.source.provider_name)
            .await;
        self.finish(
            ticket,
            session.work.clone(),
            session.source.clone(),
            session.chapters.clone(),
            found,
            saved,
        )
        .await
    }

    /// Move to the previous or next chapter.
    ///
    /// # Errors
    ///
    /// [`MatchError::NotFound`] at either end of the list.
    pub async fn navigate(
        &self,
        session: &ReadingSession,
        direction: Direction,
    ) -> Result<ReadingSession> {
        let Some(chapter) = adjacent(&session.chapters, session.chapter.ordinal_index, direction)
        else {
            let side = match direction {
                Direction::Previous => "previous",
                Direction::Next => "next",
            };
            return Err(MatchError::NotFound(format!(
                "no {side} chapter from {}",
                session.chapter.number
            ))
            .into());
        };
        let ticket = self.sequencer.begin();
        let found = ChapterMatch {
            chapter: chapter.clone(),
            strategy: MatchStrategy::Exact,
        };
        let saved = self
            .saved_progress(&session.work.key(), &session.source.provider_name)
            .await;
        self.finish(
            ticket,
            session.work.clone(),
            session.source.clone(),
            session.chapters.clone(),
            found,
            saved,
        )
        .await
    }

    /// A tracker for the session's progress, persisting to this loader's store.
    pub fn tracker(&self, session: &ReadingSession) -> ProgressTracker {
        ProgressTracker::new(
            self.store.clone(),
            session.progress.clone(),
            self.hub.config().progress.clone(),
        )
    }

    /// Fetch pages, build progress and commit the session under `ticket`.
    async fn finish(
        &self,
        ticket: LoadTicket,
        work: Work,
        source: SourceInstance,
        chapters: Vec<Chapter>,
        found: ChapterMatch,
        saved: Option<ReadingProgress>,
    ) -> Result<ReadingSession> {
        let pages = self.hub.pages(&source.provider_name, &found.chapter).await?;
        let total_pages = u32::try_from(pages.len()).unwrap_or(u32::MAX);

        let progress = match saved {
            Some(mut saved) if saved.chapter_number == found.chapter.number && !saved.completed => {
                saved.total_pages = total_pages.max(1);
                saved.set_position(saved.page_number, saved.scroll_fraction);
                saved
            }
            _ => ReadingProgress::start(
                work.key(),
                source.provider_name.clone(),
                found.chapter.number,
                total_pages,
            ),
        };

        tracing::info!(
            provider = %source.provider_name,
            chapter = found.chapter.number,
            page = progress.page_number,
            strategy = ?found.strategy,
            "chapter loaded"
        );

        let session = ReadingSession {
            work,
            source,
            chapters,
            chapter: found.chapter,
            strategy: found.strategy,
            pages,
            progress,
            ticket,
        };
        Ok(self.sequencer.commit(ticket, session)?)
    }

    fn ensure_current(&self, ticket: LoadTicket) -> Result<()> {
        Ok(self.sequencer.commit(ticket, ())?)
    }

    /// Stored progress, treating store failures as absent.
    async fn saved_progress(&self, work_id: &str, provider_name: &str) -> Option<ReadingProgress> {
        match self.store.get(work_id, provider_name).await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(
                    provider = provider_name,
                    error = %e,
                    "cannot read reading progress"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLoader")
            .field("hub", &self.hub)
            .field("latest_load", &self.sequencer.latest())
            .finish()
    }
}

fn first_chapter(chapters: &[Chapter]) -> std::result::Result<ChapterMatch, MatchError> {
    chapters
        .first()
        .map(|chapter| ChapterMatch {
            chapter: chapter.clone(),
            strategy: MatchStrategy::Exact,
        })
        .ok_or_else(|| MatchError::NotFound("no chapters available".into()))
}

//! Core data model: works, provider results, chapters and reading progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical identity of a title, independent of any single provider.
///
/// Immutable for the duration of a reading session apart from lazy
/// enrichment of alternate titles and cover art.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Work {
    /// Primary display title.
    pub title: String,
    /// Alternate titles (translations, romanisations), in preference order.
    #[serde(default)]
    pub alternate_titles: Vec<String>,
    /// Canonical identifier, if the work came from a catalogue record.
    #[serde(default)]
    pub id: Option<String>,
    /// Canonical URL. Providers claim it when its host is one of theirs.
    #[serde(default)]
    pub url: Option<String>,
    /// Cover image URL.
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Known provider-specific references, keyed by provider name.
    #[serde(default)]
    pub source_refs: BTreeMap<String, String>,
}

impl Work {
    /// Create a work with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper adding alternate titles.
    pub fn with_alternate_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_titles
            .extend(titles.into_iter().map(Into::into));
        self
    }

    /// Builder-style helper recording a provider reference.
    pub fn with_source_ref(
        mut self,
        provider: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.source_refs.insert(provider.into(), reference.into());
        self
    }

    /// Stable key used for progress records.
    ///
    /// Prefers the canonical id, then the canonical URL, then the title.
    pub fn key(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| self.title.trim().to_lowercase())
    }

    /// Canonical reference this work carries for a provider, if any.
    ///
    /// An explicit entry in [`Work::source_refs`] wins; otherwise the
    /// canonical URL is returned when its host is one of `hosts`.
    pub fn source_ref_for(&self, provider: &str, hosts: &[&str]) -> Option<String> {
        if let Some(reference) = self.source_refs.get(provider) {
            return Some(reference.clone());
        }
        let raw = self.url.as_deref()?;
        let parsed = url::Url::parse(raw).ok()?;
        let host = parsed.host_str()?;
        let host = host.strip_prefix("www.").unwrap_or(host);
        hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(host))
            .then(|| raw.to_string())
    }
}

/// A provider-sourced search candidate. Discarded after ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub follow_count: Option<u64>,
    /// Name of the provider that returned this result.
    pub provider_name: String,
    /// Provider-specific identifier or URL for the title.
    pub provider_id: String,
}

/// A work's representation on one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInstance {
    pub provider_name: String,
    /// Provider-specific id or URL, passed back to `get_chapters`.
    pub provider_ref: String,
    /// Title as the provider spells it, when known.
    #[serde(default)]
    pub title: Option<String>,
}

impl SourceInstance {
    pub fn new(provider_name: impl Into<String>, provider_ref: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            provider_ref: provider_ref.into(),
            title: None,
        }
    }
}

impl From<SearchResult> for SourceInstance {
    fn from(result: SearchResult) -> Self {
        Self {
            provider_name: result.provider_name,
            provider_ref: result.provider_id,
            title: Some(result.title),
        }
    }
}

/// One chapter of a work on a specific provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter number; fractional values such as `10.5` are valid.
    pub number: f64,
    #[serde(default)]
    pub title: String,
    /// Provider reference passed back to `get_pages`.
    #[serde(default)]
    pub url: String,
    /// Position after the ascending sort. Only meaningful within the list
    /// it was assigned in.
    #[serde(default)]
    pub ordinal_index: usize,
}

impl Chapter {
    pub fn new(number: f64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            url: url.into(),
            ordinal_index: 0,
        }
    }
}

/// A single page image within a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub url: String,
}

/// Persisted reading position for one chapter of a work on one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub work_id: String,
    pub provider_name: String,
    pub chapter_number: f64,
    /// 1-based.
    pub page_number: u32,
    /// Position within the current page, always within `[0, 1]`.
    pub scroll_fraction: f64,
    /// At least 1.
    pub total_pages: u32,
    pub completed: bool,
}

impl ReadingProgress {
    /// Fresh progress at the top of the first page of a chapter.
    pub fn start(
        work_id: impl Into<String>,
        provider_name: impl Into<String>,
        chapter_number: f64,
        total_pages: u32,
    ) -> Self {
        Self {
            work_id: work_id.into(),
            provider_name: provider_name.into(),
            chapter_number,
            page_number: 1,
            scroll_fraction: 0.0,
            total_pages: total_pages.max(1),
            completed: false,
        }
    }

    /// Chapter number to open when resuming.
    ///
    /// A completed chapter resumes at the next whole chapter.
    pub fn resume_target(&self) -> f64 {
        if self.completed {
            self.chapter_number.floor() + 1.0
        } else {
            self.chapter_number
        }
    }

    /// Set the position, clamping into the valid ranges.
    pub fn set_position(&mut self, page_number: u32, scroll_fraction: f64) {
        self.page_number = page_number.clamp(1, self.total_pages.max(1));
        self.scroll_fraction = clamp_fraction(scroll_fraction);
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

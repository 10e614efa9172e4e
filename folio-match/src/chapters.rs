//! Chapter resolution across inconsistently numbered providers.
//!
//! Given a target chapter number and a provider's chapter list, the
//! matcher tries, in order:
//!
//! 1. an exact number match,
//! 2. a title mentioning the number (`Chapter 12`, `Ch. 12`, `Ch 12`, `12`),
//! 3. an approximate number match within the configured epsilon,
//! 4. the nearest chapter by number, lowest ordinal on ties.
//!
//! A non-empty list therefore always yields a chapter. Only an empty list
//! is an error.

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::error::{MatchError, Result};
use crate::types::Chapter;

/// Which step of the fallback chain produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    TitlePattern,
    Approximate,
    Nearest,
}

/// A chosen chapter and how it was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterMatch {
    /// The chapter, with `ordinal_index` set within the sorted list.
    pub chapter: Chapter,
    pub strategy: MatchStrategy,
}

/// Navigation direction within a sorted chapter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Previous,
    Next,
}

/// Sort ascending by number and assign ordinal indices.
///
/// The sort is stable, so chapters sharing a number keep provider order.
pub fn sort_chapters(mut chapters: Vec<Chapter>) -> Vec<Chapter> {
    chapters.sort_by(|a, b| a.number.total_cmp(&b.number));
    for (index, chapter) in chapters.iter_mut().enumerate() {
        chapter.ordinal_index = index;
    }
    chapters
}

/// Resolve `target` against an unsorted chapter list.
///
/// # Errors
///
/// Returns [`MatchError::NotFound`] only when `chapters` is empty.
pub fn match_chapter(
    target: f64,
    chapters: Vec<Chapter>,
    config: &MatchConfig,
) -> Result<ChapterMatch> {
    let sorted = sort_chapters(chapters);
    match_sorted(target, &sorted, config)
}

/// Resolve `target` against a list already passed through [`sort_chapters`].
///
/// # Errors
///
/// Returns [`MatchError::NotFound`] only when `sorted` is empty.
pub fn match_sorted(target: f64, sorted: &[Chapter], config: &MatchConfig) -> Result<ChapterMatch> {
    if sorted.is_empty() {
        return Err(MatchError::NotFound(format!(
            "no chapters available for chapter {target}"
        )));
    }

    let found = |chapter: &Chapter, strategy| ChapterMatch {
        chapter: chapter.clone(),
        strategy,
    };

    if let Some(chapter) = sorted.iter().find(|c| c.number == target) {
        return Ok(found(chapter, MatchStrategy::Exact));
    }

    if let Some(chapter) = sorted.iter().find(|c| title_mentions(&c.title, target)) {
        return Ok(found(chapter, MatchStrategy::TitlePattern));
    }

    let nearest = nearest_chapter(sorted, target);
    let Some(chapter) = nearest else {
        return Err(MatchError::NotFound(format!(
            "no chapters available for chapter {target}"
        )));
    };

    let strategy = if (chapter.number - target).abs() < config.chapter_epsilon {
        MatchStrategy::Approximate
    } else {
        MatchStrategy::Nearest
    };
    tracing::debug!(
        requested = target,
        chosen = chapter.number,
        ?strategy,
        "chapter resolved without exact match"
    );
    Ok(found(chapter, strategy))
}

/// Resolve a chapter from an imported record that has no linked provider.
///
/// Same fallback chain as [`match_chapter`], but a numeric match further
/// than `config.import_chapter_window` away is rejected, since a distant
/// chapter on an unrelated provider is more likely a different work.
pub fn match_imported_chapter(
    target: f64,
    chapters: Vec<Chapter>,
    config: &MatchConfig,
) -> Option<ChapterMatch> {
    let found = match_chapter(target, chapters, config).ok()?;
    let within_window = (found.chapter.number - target).abs() <= config.import_chapter_window;
    (found.strategy == MatchStrategy::TitlePattern || within_window).then_some(found)
}

/// The chapter before or after `ordinal_index` in a sorted list.
pub fn adjacent(
    sorted: &[Chapter],
    ordinal_index: usize,
    direction: Direction,
) -> Option<&Chapter> {
    match direction {
        Direction::Previous => ordinal_index.checked_sub(1).and_then(|i| sorted.get(i)),
        Direction::Next => ordinal_index.checked_add(1).and_then(|i| sorted.get(i)),
    }
}

/// Chapter minimising `|number - target|`; the first (lowest ordinal) wins ties.
fn nearest_chapter(sorted: &[Chapter], target: f64) -> Option<&Chapter> {
    sorted
        .iter()
        .min_by(|a, b| (a.number - target).abs().total_cmp(&(b.number - target).abs()))
}

/// Whether a chapter title refers to chapter `number`.
fn title_mentions(title: &str, number: f64) -> bool {
    if title.is_empty() || !number.is_finite() {
        return false;
    }
    let title = title.to_lowercase();
    let n = format!("{number}");

    ["chapter ", "ch. ", "ch "]
        .iter()
        .any(|prefix| contains_number(&title, &format!("{prefix}{n}"), false))
        || contains_number(&title, &n, true)
}

/// Substring search that refuses to match inside a longer number, so that
/// `1` is not found in `10` or `1.5`. A `.` before the number only counts
/// as part of a number when a digit precedes it, so `Ch.12` still matches.
fn contains_number(haystack: &str, needle: &str, check_left: bool) -> bool {
    haystack.match_indices(needle).any(|(start, matched)| {
        let mut before = haystack[..start].chars().rev();
        let prev = before.next();
        let prev_prev = before.next();
        let mut after = haystack[start + matched.len()..].chars();
        let next = after.next();
        let next_next = after.next();

        let left_ok = !check_left
            || match prev {
                Some(c) if c.is_ascii_digit() => false,
                Some('.') => !prev_prev.is_some_and(|c| c.is_ascii_digit()),
                _ => true,
            };
        let right_ok = match next {
            Some(c) if c.is_ascii_digit() => false,
            Some('.') => !next_next.is_some_and(|c| c.is_ascii_digit()),
            _ => true,
        };
        left_ok && right_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(numbers: &[f64]) -> Vec<Chapter> {
        numbers
            .iter()
            .map(|&n| Chapter::new(n, "", format!("/c/{n}")))
            .collect()
    }

    fn config() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn sort_assigns_ordinals_and_is_stable() {
        let chapters = vec![
            Chapter::new(3.0, "three", "a"),
            Chapter::new(1.0, "one", "b"),
            Chapter::new(3.0, "three again", "c"),
            Chapter::new(2.5, "two and a half", "d"),
        ];
        let sorted = sort_chapters(chapters);
        let urls: Vec<&str> = sorted.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "d", "a", "c"]);
        let ordinals: Vec<usize> = sorted.iter().map(|c| c.ordinal_index).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_list_is_not_found() {
        let err = match_chapter(1.0, vec![], &config()).unwrap_err();
        assert!(matches!(err, MatchError::NotFound(_)));
    }

    #[test]
    fn exact_match_preferred_over_approximate() {
        let found = match_chapter(2.0, numbered(&[2.05, 2.0]), &config()).expect("match");
        assert_eq!(found.strategy, MatchStrategy::Exact);
        assert!((found.chapter.number - 2.0).abs() < f64::EPSILON);
        assert_eq!(found.chapter.ordinal_index, 0);
    }

    #[test]
    fn nearest_fallback_picks_closest() {
        let found = match_chapter(3.0, numbered(&[1.0, 2.0, 5.0]), &config()).expect("match");
        assert_eq!(found.strategy, MatchStrategy::Nearest);
        assert!((found.chapter.number - 2.0).abs() < f64::EPSILON);
        assert_eq!(found.chapter.ordinal_index, 1);
    }

    #[test]
    fn nearest_ties_resolve_to_lowest_ordinal() {
        let found = match_chapter(3.0, numbered(&[4.0, 2.0]), &config()).expect("match");
        assert!((found.chapter.number - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn approximate_within_epsilon() {
        let found = match_chapter(7.0, numbered(&[6.0, 7.04, 8.0]), &config()).expect("match");
        assert_eq!(found.strategy, MatchStrategy::Approximate);
        assert!((found.chapter.number - 7.04).abs() < f64::EPSILON);
    }

    #[test]
    fn title_pattern_beats_numeric_fallbacks() {
        let chapters = vec![
            Chapter::new(11.0, "Vol. 2 Chapter 12: The Return", "x"),
            Chapter::new(12.04, "", "y"),
        ];
        let found = match_chapter(12.0, chapters, &config()).expect("match");
        assert_eq!(found.strategy, MatchStrategy::TitlePattern);
        assert_eq!(found.chapter.url, "x");
    }

    #[test]
    fn title_patterns_are_case_insensitive() {
        assert!(title_mentions("CH. 4", 4.0));
        assert!(title_mentions("ch 4 - start", 4.0));
        assert!(title_mentions("Chapter 10.5", 10.5));
        assert!(title_mentions("Episode 4", 4.0));
    }

    #[test]
    fn title_numbers_respect_boundaries() {
        assert!(!title_mentions("Chapter 10", 1.0));
        assert!(!title_mentions("Chapter 1.5", 1.0));
        assert!(!title_mentions("Chapter 21", 1.0));
        assert!(title_mentions("Chapter 1.", 1.0));
        assert!(!title_mentions("", 1.0));
    }

    #[test]
    fn compact_titles_match_by_pattern() {
        assert!(title_mentions("Ch.12", 12.0));
        assert!(title_mentions("Vol.2 Ch.12", 12.0));
        assert!(!title_mentions("Vol.2 Ch.12", 1.0));

        let chapters = vec![
            Chapter::new(11.0, "Vol.2 Ch.12", "x"),
            Chapter::new(12.04, "", "y"),
        ];
        let found = match_chapter(12.0, chapters, &config()).expect("match");
        assert_eq!(found.strategy, MatchStrategy::TitlePattern);
        assert_eq!(found.chapter.url, "x");
    }

    #[test]
    fn fractional_targets_match_exactly() {
        let found = match_chapter(10.5, numbered(&[10.0, 10.5, 11.0]), &config()).expect("match");
        assert_eq!(found.strategy, MatchStrategy::Exact);
        assert_eq!(found.chapter.ordinal_index, 1);
    }

    #[test]
    fn epsilon_is_configurable() {
        let wide = MatchConfig {
            chapter_epsilon: 0.5,
            ..config()
        };
        let found = match_chapter(7.0, numbered(&[7.3]), &wide).expect("match");
        assert_eq!(found.strategy, MatchStrategy::Approximate);

        let found = match_chapter(7.0, numbered(&[7.3]), &config()).expect("match");
        assert_eq!(found.strategy, MatchStrategy::Nearest);
    }

    #[test]
    fn imported_match_respects_window() {
        assert!(match_imported_chapter(40.0, numbered(&[1.0, 2.0, 3.0]), &config()).is_none());
        let found = match_imported_chapter(40.0, numbered(&[30.0, 36.0]), &config())
            .expect("within window");
        assert!((found.chapter.number - 36.0).abs() < f64::EPSILON);
    }

    #[test]
    fn imported_match_accepts_title_pattern() {
        let chapters = vec![Chapter::new(3.0, "Chapter 40", "x")];
        let found = match_imported_chapter(40.0, chapters, &config()).expect("title match");
        assert_eq!(found.strategy, MatchStrategy::TitlePattern);
    }

    #[test]
    fn imported_match_on_empty_list_is_none() {
        assert!(match_imported_chapter(1.0, vec![], &config()).is_none());
    }

    #[test]
    fn adjacent_navigation() {
        let sorted = sort_chapters(numbered(&[1.0, 2.0, 3.0]));
        assert!(adjacent(&sorted, 0, Direction::Previous).is_none());
        assert_eq!(adjacent(&sorted, 0, Direction::Next).map(|c| c.ordinal_index), Some(1));
        assert_eq!(adjacent(&sorted, 2, Direction::Previous).map(|c| c.ordinal_index), Some(1));
        assert!(adjacent(&sorted, 2, Direction::Next).is_none());
    }
}

//! Title normalisation for duplicate detection.
//!
//! Canonicalises titles so that entries differing only in case,
//! punctuation, spacing or leading articles compare as equal.

/// Whole-word articles removed during normalisation.
const ARTICLES: &[&str] = &["the", "a", "an"];

/// Normalise a title for duplicate comparison.
///
/// 1. Lowercase and trim.
/// 2. Drop apostrophes; every other non-alphanumeric character becomes a
///    word break, so `Spider-Man` and `spider man` agree.
/// 3. Collapse whitespace.
/// 4. Remove standalone articles (`the`, `a`, `an`).
///
/// # Examples
///
/// ```
/// use folio_match::orchestrator::normalize::normalize_title;
///
/// assert_eq!(
///     normalize_title("The Amazing Spider-Man!"),
///     normalize_title("amazing spider man"),
/// );
/// ```
pub fn normalize_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();

    let spaced: String = lowered
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '`'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .filter(|word| !ARTICLES.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

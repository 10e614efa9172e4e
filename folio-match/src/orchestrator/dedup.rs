//! Result deduplication by normalised title.
//!
//! Providers frequently list the same title under slightly different
//! spellings. Entries whose normalised titles are equal are merged into a
//! single entry: the most complete one, kept in the position where the
//! title was first seen.

use std::collections::HashMap;

use crate::types::SearchResult;

use super::normalize::normalize_title;

/// Description length above which a description counts as informative.
const INFORMATIVE_DESCRIPTION_LEN: usize = 50;

/// Heuristic for how much useful metadata a result carries.
///
/// `+2` cover, `+2` description longer than 50 characters, `+1` rating,
/// `+1` follow count.
pub fn completeness_score(result: &SearchResult) -> u32 {
    let mut score = 0;
    if result.cover_url.as_deref().is_some_and(|c| !c.trim().is_empty()) {
        score += 2;
    }
    if result.description.chars().count() > INFORMATIVE_DESCRIPTION_LEN {
        score += 2;
    }
    if result.rating.is_some() {
        score += 1;
    }
    if result.follow_count.is_some() {
        score += 1;
    }
    score
}

/// Collapse near-duplicate results into one entry per normalised title.
///
/// On a collision the more complete result replaces the kept one in place;
/// ties keep the entry seen first. Titles that normalise to an empty string
/// carry no identity and are never merged.
pub fn deduplicate(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut kept: Vec<SearchResult> = Vec::with_capacity(results.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for result in results {
        let key = normalize_title(&result.title);
        if key.is_empty() {
            kept.push(result);
            continue;
        }

        match positions.get(&key) {
            Some(&index) => {
                if completeness_score(&result) > completeness_score(&kept[index]) {
                    tracing::trace!(
                        title = %result.title,
                        provider = %result.provider_name,
                        "duplicate replaces less complete entry"
                    );
                    kept[index] = result;
                }
            }
            None => {
                positions.insert(key, kept.len());
                kept.push(result);
            }
        }
    }

    kept
}

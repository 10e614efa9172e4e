//! Relevance scoring of search results against a query.
//!
//! Each result receives the score of the first rule it satisfies, plus a
//! small bonus for short titles:
//!
//! | Condition                                   | Score |
//! |---------------------------------------------|-------|
//! | title equals query (case-insensitive)       | 100   |
//! | title starts with query                     | 80    |
//! | title contains every query token            | 60    |
//! | title contains some query token             | 40    |
//! | description contains query                  | 20    |
//! | description contains some query token       | 10    |
//! | title shorter than the bonus length         | +5    |
//!
//! Results below the configured minimum are dropped, the rest sorted
//! descending (stable on ties) and truncated.

use crate::config::MatchConfig;
use crate::types::SearchResult;

const EXACT_TITLE: u32 = 100;
const TITLE_PREFIX: u32 = 80;
const TITLE_ALL_TOKENS: u32 = 60;
const TITLE_SOME_TOKENS: u32 = 40;
const DESCRIPTION_QUERY: u32 = 20;
const DESCRIPTION_SOME_TOKENS: u32 = 10;
const SHORT_TITLE_BONUS: u32 = 5;

/// Split a query on whitespace, lowercase it, and drop short tokens.
pub fn tokenize(query: &str, min_len: usize) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|t| t.chars().count() >= min_len)
        .map(str::to_lowercase)
        .collect()
}

/// Score a single result. Higher is more relevant.
pub fn relevance_score(result: &SearchResult, query: &str, config: &MatchConfig) -> u32 {
    let query = query.trim().to_lowercase();
    let tokens = tokenize(&query, config.min_token_len);
    score_prepared(result, &query, &tokens, config)
}

fn score_prepared(
    result: &SearchResult,
    query: &str,
    tokens: &[String],
    config: &MatchConfig,
) -> u32 {
    let title = result.title.trim().to_lowercase();
    let description = result.description.to_lowercase();

    let any_in = |haystack: &str| tokens.iter().any(|t| haystack.contains(t.as_str()));
    let all_in = |haystack: &str| {
        !tokens.is_empty() && tokens.iter().all(|t| haystack.contains(t.as_str()))
    };

    let base = if title == query {
        EXACT_TITLE
    } else if title.starts_with(query) {
        TITLE_PREFIX
    } else if all_in(&title) {
        TITLE_ALL_TOKENS
    } else if any_in(&title) {
        TITLE_SOME_TOKENS
    } else if description.contains(query) {
        DESCRIPTION_QUERY
    } else if any_in(&description) {
        DESCRIPTION_SOME_TOKENS
    } else {
        0
    };

    let bonus = if result.title.chars().count() < config.short_title_bonus_len {
        SHORT_TITLE_BONUS
    } else {
        0
    };

    base + bonus
}

/// Rank results against a query.
///
/// Returns at most `config.max_results` entries, most relevant first. A
/// blank query or no qualifying result yields an empty vector.
pub fn rank_results(
    results: Vec<SearchResult>,
    query: &str,
    config: &MatchConfig,
) -> Vec<SearchResult> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let tokens = tokenize(&query, config.min_token_len);

    let mut scored: Vec<(u32, SearchResult)> = results
        .into_iter()
        .map(|r| (score_prepared(&r, &query, &tokens, config), r))
        .filter(|(score, _)| *score >= config.min_relevance_score)
        .collect();

    // `sort_by` is stable, so equal scores keep provider order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(config.max_results);

    tracing::trace!(query = %query, kept = scored.len(), "ranked search results");
    scored.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(title: &str, description: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            description: description.to_string(),
            provider_name: "test".into(),
            provider_id: title.to_lowercase(),
            ..Default::default()
        }
    }

    fn score(title: &str, description: &str, query: &str) -> u32 {
        relevance_score(&make_result(title, description), query, &MatchConfig::default())
    }

    #[test]
    fn exact_title_scores_105() {
        assert_eq!(score("Naruto", "", "naruto"), 105);
    }

    #[test]
    fn prefix_scores_85() {
        assert_eq!(score("Naruto: Shippuden", "", "naruto"), 85);
    }

    #[test]
    fn all_tokens_scores_65() {
        assert_eq!(score("Boruto: Naruto Next Generations", "", "naruto"), 65);
        assert_eq!(score("Piece of the One", "", "one piece"), 65);
    }

    #[test]
    fn some_tokens_scores_45() {
        assert_eq!(score("Piece Together", "", "one piece"), 45);
    }

    #[test]
    fn description_match_scores() {
        assert_eq!(score("Unrelated", "a story like one piece", "one piece"), 25);
        assert_eq!(score("Unrelated", "pirates and a piece of gold", "one piece"), 15);
    }

    #[test]
    fn long_titles_get_no_bonus() {
        let long = format!("naruto {}", "x".repeat(60));
        assert_eq!(score(&long, "", "naruto"), 80);
    }

    #[test]
    fn short_tokens_ignored() {
        // "of" and "a" are dropped, leaving only "tale".
        assert_eq!(score("Tale Spin", "", "of a tale"), 65);
        assert_eq!(score("Of Mice", "", "of a"), 5);
    }

    #[test]
    fn ordering_holds_with_constant_description() {
        let description = "shared description";
        let exact = score("Monster Hunter", description, "monster hunter");
        let prefix = score("Monster Hunter Stories", description, "monster hunter");
        let some = score("Little Monster Tales", description, "monster hunter");
        assert!(exact > prefix);
        assert!(prefix > some);
    }

    #[test]
    fn rank_orders_naruto_example() {
        let results = vec![
            make_result("Boruto: Naruto Next Generations", ""),
            make_result("Naruto: Shippuden", ""),
            make_result("Naruto", ""),
        ];
        let ranked = rank_results(results, "naruto", &MatchConfig::default());
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Naruto", "Naruto: Shippuden", "Boruto: Naruto Next Generations"]
        );
    }

    #[test]
    fn low_scores_dropped() {
        let results = vec![make_result("Bleach", "soul reapers"), make_result("Naruto", "")];
        let ranked = rank_results(results, "naruto", &MatchConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "Naruto");
    }

    #[test]
    fn ties_keep_input_order() {
        let mut first = make_result("Naruto", "");
        first.provider_name = "first".into();
        let mut second = make_result("Naruto", "");
        second.provider_name = "second".into();
        let ranked = rank_results(vec![first, second], "naruto", &MatchConfig::default());
        assert_eq!(ranked[0].provider_name, "first");
        assert_eq!(ranked[1].provider_name, "second");
    }

    #[test]
    fn truncates_to_max_results() {
        let results: Vec<SearchResult> = (0..30)
            .map(|i| make_result(&format!("Naruto vol {i}"), ""))
            .collect();
        let ranked = rank_results(results, "naruto", &MatchConfig::default());
        assert_eq!(ranked.len(), 20);
    }

    #[test]
    fn blank_query_yields_nothing() {
        let ranked = rank_results(vec![make_result("Naruto", "")], "   ", &MatchConfig::default());
        assert!(ranked.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(rank_results(vec![], "naruto", &MatchConfig::default()).is_empty());
    }

    #[test]
    fn tokenize_drops_short_words() {
        assert_eq!(tokenize("The Rise of an Empire", 3), vec!["the", "rise", "empire"]);
    }
}

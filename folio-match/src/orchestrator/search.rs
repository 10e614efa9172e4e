//! Concurrent search fan-out: query every provider, rank, deduplicate.
//!
//! Providers are queried concurrently but merged in registry order, so the
//! same inputs always produce the same ranking.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::MatchConfig;
use crate::error::{MatchError, Result};
use crate::provider::{ContentProvider, ProviderRegistry};
use crate::types::SearchResult;

use super::dedup::deduplicate;
use super::scoring::rank_results;

/// Run one provider call under the per-provider timeout.
pub(crate) async fn call_provider<T, F>(name: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(MatchError::Timeout(format!(
            "{name} after {}s",
            timeout.as_secs()
        ))),
    }
}

pub(crate) fn lock_breaker(breaker: &Mutex<CircuitBreaker>) -> MutexGuard<'_, CircuitBreaker> {
    breaker.lock().unwrap_or_else(|e| e.into_inner())
}

/// Providers whose circuit allows a request, in registry order.
pub(crate) fn available_providers(
    registry: &ProviderRegistry,
    breaker: &Mutex<CircuitBreaker>,
) -> Vec<std::sync::Arc<dyn ContentProvider>> {
    registry
        .iter()
        .filter(|provider| {
            let allowed = lock_breaker(breaker).should_attempt(provider.name());
            if !allowed {
                tracing::debug!(provider = provider.name(), "circuit open, skipping provider");
            }
            allowed
        })
        .cloned()
        .collect()
}

/// Search every available provider concurrently.
///
/// # Pipeline
///
/// 1. Skip providers whose circuit is open
/// 2. Fan out with [`futures::future::join_all`], each call under the
///    configured timeout
/// 3. Log per-provider errors at warn level and record them with the
///    circuit breaker
/// 4. Merge successful results in registry order
/// 5. Rank with [`rank_results`], then [`deduplicate`]
///
/// # Errors
///
/// Returns [`MatchError::AllProvidersFailed`] only if every attempted
/// provider failed. A provider answering with no results is a success.
pub async fn orchestrate_search(
    query: &str,
    registry: &ProviderRegistry,
    config: &MatchConfig,
    breaker: &Mutex<CircuitBreaker>,
) -> Result<Vec<SearchResult>> {
    let query = query.trim();
    if query.is_empty() || registry.is_empty() {
        return Ok(Vec::new());
    }

    let providers = available_providers(registry, breaker);
    if providers.is_empty() {
        return Err(MatchError::AllProvidersFailed(
            "every provider circuit is open".into(),
        ));
    }

    let timeout = Duration::from_secs(config.provider_timeout_seconds);
    let futures: Vec<_> = providers
        .iter()
        .map(|provider| async move {
            let outcome = call_provider(provider.name(), timeout, provider.search(query)).await;
            (provider.name().to_string(), outcome)
        })
        .collect();

    let outcomes = futures::future::join_all(futures).await;

    let mut merged: Vec<SearchResult> = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    let mut successes = 0usize;

    for (name, outcome) in outcomes {
        match outcome {
            Ok(results) => {
                lock_breaker(breaker).record_success(&name);
                tracing::debug!(
                    provider = %name,
                    count = results.len(),
                    "provider returned results"
                );
                successes += 1;
                merged.extend(results);
            }
            Err(err) => {
                lock_breaker(breaker).record_failure(&name);
                tracing::warn!(provider = %name, error = %err, "provider search failed");
                errors.push(format!("{name}: {err}"));
            }
        }
    }

    if successes == 0 {
        return Err(MatchError::AllProvidersFailed(errors.join("; ")));
    }

    let ranked = rank_results(merged, query, config);
    Ok(deduplicate(ranked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chapter, Page};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedProvider {
        name: &'static str,
        titles: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl ContentProvider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            if self.fail {
                return Err(MatchError::Provider(format!("{}: upstream 503", self.name)));
            }
            Ok(self
                .titles
                .iter()
                .map(|t| SearchResult {
                    title: (*t).to_string(),
                    provider_name: self.name.to_string(),
                    provider_id: format!("{}/{t}", self.name),
                    ..Default::default()
                })
                .collect())
        }

        async fn get_chapters(&self, _source_ref: &str) -> Result<Vec<Chapter>> {
            Ok(vec![])
        }

        async fn get_pages(&self, _chapter_ref: &str) -> Result<Vec<Page>> {
            Ok(vec![])
        }
    }

    fn provider(
        name: &'static str,
        titles: Vec<&'static str>,
        fail: bool,
    ) -> Arc<dyn ContentProvider> {
        Arc::new(FixedProvider { name, titles, fail })
    }

    #[tokio::test]
    async fn partial_failure_still_returns_results() {
        let registry = ProviderRegistry::new()
            .with(provider("down", vec![], true))
            .and_then(|r| r.with(provider("up", vec!["Berserk"], false)))
            .expect("register");
        let breaker = Mutex::new(CircuitBreaker::default());

        let results = orchestrate_search("berserk", &registry, &MatchConfig::default(), &breaker)
            .await
            .expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider_name, "up");
    }

    #[tokio::test]
    async fn all_failures_are_reported() {
        let registry = ProviderRegistry::new()
            .with(provider("a", vec![], true))
            .and_then(|r| r.with(provider("b", vec![], true)))
            .expect("register");
        let breaker = Mutex::new(CircuitBreaker::default());

        let err = orchestrate_search("berserk", &registry, &MatchConfig::default(), &breaker)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::AllProvidersFailed(_)));
        assert!(err.to_string().contains("a:"));
        assert!(err.to_string().contains("b:"));
    }

    #[tokio::test]
    async fn empty_answers_are_not_failures() {
        let registry = ProviderRegistry::new()
            .with(provider("a", vec![], false))
            .expect("register");
        let breaker = Mutex::new(CircuitBreaker::default());

        let results = orchestrate_search("berserk", &registry, &MatchConfig::default(), &breaker)
            .await
            .expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn blank_query_skips_providers() {
        let registry = ProviderRegistry::new()
            .with(provider("a", vec![], true))
            .expect("register");
        let breaker = Mutex::new(CircuitBreaker::default());

        let results = orchestrate_search("   ", &registry, &MatchConfig::default(), &breaker)
            .await
            .expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn open_circuit_skips_provider() {
        let registry = ProviderRegistry::new()
            .with(provider("flaky", vec!["Berserk"], false))
            .and_then(|r| r.with(provider("steady", vec!["Berserk of Gluttony"], false)))
            .expect("register");
        let breaker = Mutex::new(CircuitBreaker::default());
        for _ in 0..3 {
            lock_breaker(&breaker).record_failure("flaky");
        }

        let results = orchestrate_search("berserk", &registry, &MatchConfig::default(), &breaker)
            .await
            .expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider_name, "steady");
    }

    #[tokio::test]
    async fn duplicates_across_providers_collapse() {
        let registry = ProviderRegistry::new()
            .with(provider("a", vec!["Vinland Saga"], false))
            .and_then(|r| r.with(provider("b", vec!["vinland saga"], false)))
            .expect("register");
        let breaker = Mutex::new(CircuitBreaker::default());

        let results =
            orchestrate_search("vinland saga", &registry, &MatchConfig::default(), &breaker)
                .await
                .expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].provider_name, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, MatchError>(1)
        };
        let err = call_provider("slow", Duration::from_secs(8), slow)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::Timeout(_)));
        assert!(err.is_provider_failure());
    }
}

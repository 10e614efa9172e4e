//! Provider hub: the single entry point over a [`ProviderRegistry`].
//!
//! Owns the circuit breaker and the search cache so that search, source
//! resolution and chapter access share provider health.

use std::sync::Mutex;
use std::time::Duration;

use crate::cache::{CacheKey, SearchCache};
use crate::chapters::{match_sorted, sort_chapters, ChapterMatch};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::config::MatchConfig;
use crate::error::{MatchError, Result};
use crate::orchestrator::resolve::{resolve_sources, ResolvedSources};
use crate::orchestrator::search::{call_provider, lock_breaker, orchestrate_search};
use crate::provider::{ContentProvider, ProviderRegistry};
use crate::types::{Chapter, Page, SearchResult, SourceInstance, Work};

pub struct ProviderHub {
    registry: ProviderRegistry,
    config: MatchConfig,
    breaker: Mutex<CircuitBreaker>,
    cache: SearchCache,
}

impl ProviderHub {
    /// Build a hub over `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Config`] if `config` fails validation.
    pub fn new(registry: ProviderRegistry, config: MatchConfig) -> Result<Self> {
        config.validate()?;
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.failure_threshold,
            cooldown_secs: config.cooldown_secs,
        });
        Ok(Self {
            cache: SearchCache::new(config.cache_ttl_seconds),
            breaker: Mutex::new(breaker),
            registry,
            config,
        })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Search all providers, ranked and deduplicated.
    ///
    /// Successful answers are cached per normalised query and provider set.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::AllProvidersFailed`] if every provider failed.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let key = CacheKey::new(query, &self.registry.names());
        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!(query, "search cache hit");
            return Ok(hit);
        }

        let results = orchestrate_search(query, &self.registry, &self.config, &self.breaker).await?;
        self.cache.insert(key, results.clone()).await;
        Ok(results)
    }

    /// Find `work` on every provider.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::MatchNotFound`] when no provider has it.
    pub async fn resolve(&self, work: &Work) -> Result<ResolvedSources> {
        resolve_sources(work, &self.registry, &self.config, &self.breaker).await
    }

    /// Fetch and sort the chapter list of `instance`.
    ///
    /// # Errors
    ///
    /// Propagates provider failures and timeouts; an unknown provider name
    /// is a [`MatchError::Config`].
    pub async fn chapters(&self, instance: &SourceInstance) -> Result<Vec<Chapter>> {
        let provider = self.provider(&instance.provider_name)?;
        let chapters = self
            .guarded(provider.name(), provider.get_chapters(&instance.provider_ref))
            .await?;
        tracing::debug!(
            provider = provider.name(),
            count = chapters.len(),
            "chapter list fetched"
        );
        Ok(sort_chapters(chapters))
    }

    /// Fetch chapters and resolve `target` among them.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::NotFound`] for an empty chapter list, otherwise
    /// the same errors as [`chapters`](Self::chapters).
    pub async fn open_chapter(
        &self,
        instance: &SourceInstance,
        target: f64,
    ) -> Result<ChapterMatch> {
        let sorted = self.chapters(instance).await?;
        match_sorted(target, &sorted, &self.config)
    }

    /// Fetch the pages of `chapter` from `provider_name`.
    pub async fn pages(&self, provider_name: &str, chapter: &Chapter) -> Result<Vec<Page>> {
        let provider = self.provider(provider_name)?;
        let mut pages = self
            .guarded(provider.name(), provider.get_pages(&chapter.url))
            .await?;
        pages.sort_by_key(|p| p.number);
        Ok(pages)
    }

    pub fn circuit_state(&self, provider_name: &str) -> CircuitState {
        lock_breaker(&self.breaker).state(provider_name)
    }

    /// Per-provider circuit state and consecutive failure count.
    pub fn health_report(&self) -> Vec<(String, CircuitState, u32)> {
        lock_breaker(&self.breaker).health_report()
    }

    /// Drop cached searches and close every circuit.
    pub fn reset(&self) {
        self.cache.invalidate_all();
        lock_breaker(&self.breaker).reset();
    }

    fn provider(&self, name: &str) -> Result<&std::sync::Arc<dyn ContentProvider>> {
        self.registry
            .get(name)
            .ok_or_else(|| MatchError::Config(format!("unknown provider {name}")))
    }

    /// Run a provider call under the timeout, recording the outcome.
    async fn guarded<T, F>(&self, name: &str, call: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        let timeout = Duration::from_secs(self.config.provider_timeout_seconds);
        let outcome = call_provider(name, timeout, call).await;
        match &outcome {
            Ok(_) => lock_breaker(&self.breaker).record_success(name),
            Err(err) => {
                lock_breaker(&self.breaker).record_failure(name);
                tracing::warn!(provider = name, error = %err, "provider call failed");
            }
        }
        outcome
    }
}

impl std::fmt::Debug for ProviderHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHub")
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .finish()
    }
}

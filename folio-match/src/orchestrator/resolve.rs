//! Source resolution: find a work's instance on every provider.
//!
//! Per provider the resolver tries a canonical reference first, then the
//! primary title, then a bounded number of alternate titles, stopping at
//! the first non-empty answer. Providers are queried concurrently and the
//! outcome is assembled in registry order.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::MatchConfig;
use crate::error::{MatchError, Result};
use crate::provider::{ContentProvider, ProviderRegistry};
use crate::types::{SourceInstance, Work};

use super::search::{available_providers, call_provider, lock_breaker};

/// Provider instances found for one work, in registry order.
///
/// Providers that found nothing are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedSources {
    instances: Vec<SourceInstance>,
}

impl ResolvedSources {
    pub fn get(&self, provider_name: &str) -> Option<&SourceInstance> {
        self.instances
            .iter()
            .find(|i| i.provider_name == provider_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceInstance> {
        self.instances.iter()
    }

    /// The instance on the earliest registered provider.
    pub fn first(&self) -> Option<&SourceInstance> {
        self.instances.first()
    }

    pub fn names(&self) -> Vec<&str> {
        self.instances
            .iter()
            .map(|i| i.provider_name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl IntoIterator for ResolvedSources {
    type Item = SourceInstance;
    type IntoIter = std::vec::IntoIter<SourceInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.into_iter()
    }
}

/// Resolve `work` against every available provider.
///
/// Provider failures are logged and the provider skipped.
///
/// # Errors
///
/// Returns [`MatchError::MatchNotFound`] when no provider produced an
/// instance.
pub async fn resolve_sources(
    work: &Work,
    registry: &ProviderRegistry,
    config: &MatchConfig,
    breaker: &Mutex<CircuitBreaker>,
) -> Result<ResolvedSources> {
    let providers = available_providers(registry, breaker);
    let timeout = Duration::from_secs(config.provider_timeout_seconds);
    let titles = candidate_titles(work, config.max_alternate_titles);

    let futures: Vec<_> = providers
        .iter()
        .map(|provider| {
            let titles = &titles;
            async move {
                let outcome = resolve_on(provider.as_ref(), work, titles, timeout).await;
                (provider.name().to_string(), outcome)
            }
        })
        .collect();

    let outcomes = futures::future::join_all(futures).await;

    let mut instances = Vec::new();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(Some(instance)) => {
                lock_breaker(breaker).record_success(&name);
                tracing::debug!(
                    provider = %name,
                    reference = %instance.provider_ref,
                    "source resolved"
                );
                instances.push(instance);
            }
            Ok(None) => {
                lock_breaker(breaker).record_success(&name);
                tracing::debug!(provider = %name, "no source on provider");
            }
            Err(err) => {
                lock_breaker(breaker).record_failure(&name);
                tracing::warn!(
                    provider = %name,
                    error = %err,
                    "source resolution failed, skipping provider"
                );
            }
        }
    }

    if instances.is_empty() {
        return Err(MatchError::MatchNotFound(work.title.clone()));
    }
    Ok(ResolvedSources { instances })
}

/// Primary title followed by up to `max_alternates` alternates, skipping
/// blanks and case-insensitive repeats.
fn candidate_titles(work: &Work, max_alternates: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut titles = Vec::new();

    let primary = work.title.trim();
    if !primary.is_empty() {
        seen.insert(primary.to_lowercase());
        titles.push(primary.to_string());
    }
    titles.extend(
        work.alternate_titles
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
            .take(max_alternates)
            .map(str::to_string),
    );
    titles
}

/// Fallback chain for a single provider.
async fn resolve_on(
    provider: &dyn ContentProvider,
    work: &Work,
    titles: &[String],
    timeout: Duration,
) -> Result<Option<SourceInstance>> {
    let name = provider.name();

    if let Some(reference) = work.source_ref_for(name, provider.hosts()) {
        let found = call_provider(name, timeout, provider.lookup(&reference)).await?;
        if let Some(mut instance) = found {
            instance.provider_name = name.to_string();
            return Ok(Some(instance));
        }
    }

    for title in titles {
        let results = call_provider(name, timeout, provider.search(title)).await?;
        if let Some(first) = results.into_iter().next() {
            let mut instance = SourceInstance::from(first);
            instance.provider_name = name.to_string();
            return Ok(Some(instance));
        }
    }

    Ok(None)
}

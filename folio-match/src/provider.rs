//! Content provider capability and the registry that holds them.
//!
//! Each external source (a scraper, an API client, a local library)
//! implements [`ContentProvider`]. Providers are registered once at startup
//! in a [`ProviderRegistry`]; registration order is the order in which
//! fan-out results are merged, so repeated runs are reproducible.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{MatchError, Result};
use crate::types::{Chapter, Page, SearchResult, SourceInstance};

/// A pluggable content source.
///
/// Absence of results is an empty list, never an error. Errors are reserved
/// for network, parse or upstream failures and are returned as
/// [`MatchError::Provider`].
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Stable provider name, unique within a registry.
    fn name(&self) -> &str;

    /// Hosts whose URLs identify titles on this provider.
    fn hosts(&self) -> &[&str] {
        &[]
    }

    /// Search the provider's catalogue by title.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Fetch the chapter list for a provider reference, in provider order.
    async fn get_chapters(&self, source_ref: &str) -> Result<Vec<Chapter>>;

    /// Fetch the pages of a chapter.
    async fn get_pages(&self, chapter_ref: &str) -> Result<Vec<Page>>;

    /// Resolve a canonical reference directly.
    ///
    /// The default trusts the reference as-is; providers that can cheaply
    /// verify it should override and return `Ok(None)` for unknown refs.
    async fn lookup(&self, source_ref: &str) -> Result<Option<SourceInstance>> {
        Ok(Some(SourceInstance::new(self.name(), source_ref)))
    }
}

/// Ordered mapping from provider name to implementation.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ContentProvider>>,
    index: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Config`] if a provider with the same name is
    /// already registered.
    pub fn register(&mut self, provider: Arc<dyn ContentProvider>) -> Result<()> {
        let name = provider.name().to_string();
        if self.index.contains_key(&name) {
            return Err(MatchError::Config(format!(
                "provider {name} registered twice"
            )));
        }
        self.index.insert(name, self.providers.len());
        self.providers.push(provider);
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, provider: Arc<dyn ContentProvider>) -> Result<Self> {
        self.register(provider)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ContentProvider>> {
        self.index.get(name).map(|&i| &self.providers[i])
    }

    /// Providers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ContentProvider>> {
        self.providers.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

//! Progress persistence capability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::types::ReadingProgress;

/// Persists one [`ReadingProgress`] record per (work, provider) pair.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get(&self, work_id: &str, provider_name: &str) -> Result<Option<ReadingProgress>>;

    /// Insert or replace the record for (work, provider).
    async fn put(
        &self,
        work_id: &str,
        provider_name: &str,
        progress: &ReadingProgress,
    ) -> Result<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<HashMap<(String, String), ReadingProgress>>,
    writes: AtomicUsize,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn get(&self, work_id: &str, provider_name: &str) -> Result<Option<ReadingProgress>> {
        let records = self.records.lock().await;
        Ok(records
            .get(&(work_id.to_string(), provider_name.to_string()))
            .cloned())
    }

    async fn put(
        &self,
        work_id: &str,
        provider_name: &str,
        progress: &ReadingProgress,
    ) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(
            (work_id.to_string(), provider_name.to_string()),
            progress.clone(),
        );
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

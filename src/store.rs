//! JSON-file progress store.
//!
//! One document holds every (work, provider) record. Records are kept in
//! memory and the whole document is rewritten on each `put`, via a sibling
//! temp file and rename, so a crash mid-write leaves the previous version.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_match::{MatchError, ProgressStore, ReadingProgress};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{FolioError, Result};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    work_id: String,
    provider_name: String,
    progress: ReadingProgress,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default = "default_state_version")]
    version: u32,
    #[serde(default)]
    records: Vec<StoredRecord>,
}

fn default_state_version() -> u32 {
    STATE_VERSION
}

type RecordKey = (String, String);

#[derive(Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
    records: Mutex<BTreeMap<RecordKey, StoredRecord>>,
}

impl JsonProgressStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::Store`] if the file exists but cannot be read
    /// or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = load_document(&path)?;
        let records = document
            .records
            .into_iter()
            .map(|record| ((record.work_id.clone(), record.provider_name.clone()), record))
            .collect::<BTreeMap<_, _>>();
        tracing::debug!(path = %path.display(), count = records.len(), "progress store opened");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Every record, most recently updated first.
    pub async fn recent(&self) -> Vec<ReadingProgress> {
        let records = self.records.lock().await;
        let mut all: Vec<&StoredRecord> = records.values().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        all.into_iter().map(|r| r.progress.clone()).collect()
    }
}

#[async_trait]
impl ProgressStore for JsonProgressStore {
    async fn get(
        &self,
        work_id: &str,
        provider_name: &str,
    ) -> folio_match::Result<Option<ReadingProgress>> {
        let records = self.records.lock().await;
        Ok(records
            .get(&(work_id.to_string(), provider_name.to_string()))
            .map(|r| r.progress.clone()))
    }

    async fn put(
        &self,
        work_id: &str,
        provider_name: &str,
        progress: &ReadingProgress,
    ) -> folio_match::Result<()> {
        let mut records = self.records.lock().await;
        let key = (work_id.to_string(), provider_name.to_string());
        let previous = records.insert(
            key.clone(),
            StoredRecord {
                work_id: work_id.to_string(),
                provider_name: provider_name.to_string(),
                progress: progress.clone(),
                updated_at: Utc::now(),
            },
        );

        let document = StoreDocument {
            version: STATE_VERSION,
            records: records.values().cloned().collect(),
        };
        if let Err(e) = save_document(&self.path, &document).await {
            // Keep memory and disk in step.
            match previous {
                Some(previous) => records.insert(key, previous),
                None => records.remove(&key),
            };
            return Err(MatchError::Store(e.to_string()));
        }
        Ok(())
    }
}

fn load_document(path: &Path) -> Result<StoreDocument> {
    let bytes = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(StoreDocument::default());
        }
        Err(e) => {
            return Err(FolioError::Store(format!("cannot read progress: {e}")));
        }
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| FolioError::Store(format!("cannot parse progress: {e}")))
}

async fn save_document(path: &Path, document: &StoreDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FolioError::Store(format!("cannot create progress dir: {e}")))?;
    }

    let json = serde_json::to_vec_pretty(document)
        .map_err(|e| FolioError::Store(format!("cannot serialize progress: {e}")))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| FolioError::Store(format!("cannot write progress: {e}")))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| FolioError::Store(format!("cannot replace progress: {e}")))?;
    Ok(())
}

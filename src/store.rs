//! Metadata store collaborators.
//!
//! The pipeline depends only on [`MetadataStore::update_status`]. The two
//! implementations here cover embedding ([`MemoryStore`]) and the CLI
//! ([`JsonFileStore`], one pretty-printed JSON file under the storage root).
//! A database-backed store implements the same single-row update.

use crate::types::{MediaClass, MediaId, MediaItem, ProcessingStatus};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no media record with id {0}")]
    NotFound(MediaId),
    #[error("media record {0} already exists")]
    Duplicate(MediaId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Status sink used by the workers.
///
/// `update_status` must be idempotent: writing the same status twice leaves
/// the record unchanged.
pub trait MetadataStore: Send + Sync {
    fn update_status(&self, id: MediaId, status: ProcessingStatus) -> Result<(), StoreError>;
}

/// In-process store keyed by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<MediaId, MediaItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item: MediaItem) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        if records.contains_key(&item.id) {
            return Err(StoreError::Duplicate(item.id));
        }
        records.insert(item.id, item);
        Ok(())
    }

    pub fn get(&self, id: MediaId) -> Result<MediaItem, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    pub fn status(&self, id: MediaId) -> Result<ProcessingStatus, StoreError> {
        self.get(id).map(|item| item.status)
    }

    pub fn list(&self) -> Result<Vec<MediaItem>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.values().cloned().collect())
    }
}

impl MetadataStore for MemoryStore {
    fn update_status(&self, id: MediaId, status: ProcessingStatus) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.status = status;
        Ok(())
    }
}

/// File name of the JSON store inside the storage root.
pub const STORE_FILE: &str = "media.json";

/// Records persisted as a JSON array, rewritten on every change.
///
/// The file is replaced through a temporary sibling and a rename, so a crash
/// leaves either the old or the new contents.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<MediaId, MediaItem>>,
}

impl JsonFileStore {
    /// Open the store at `<root>/media.json`, starting empty if it is absent.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let path = root.join(STORE_FILE);
        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let items: Vec<MediaItem> = serde_json::from_str(&content)?;
            items.into_iter().map(|item| (item.id, item)).collect()
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocate and persist a new `pending` record.
    ///
    /// Nothing is recorded in memory unless the file write succeeds.
    pub fn create(&self, class: MediaClass) -> Result<MediaItem, StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let next = records.keys().next_back().map_or(1, |id| id.0 + 1);
        let item = MediaItem::new_pending(MediaId(next), class);
        records.insert(item.id, item.clone());
        if let Err(err) = persist(&self.path, &records) {
            records.remove(&item.id);
            return Err(err);
        }
        Ok(item)
    }

    pub fn get(&self, id: MediaId) -> Result<MediaItem, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    pub fn list(&self) -> Result<Vec<MediaItem>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.values().cloned().collect())
    }
}

impl MetadataStore for JsonFileStore {
    fn update_status(&self, id: MediaId, status: ProcessingStatus) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.status == status {
            return Ok(());
        }
        let previous = std::mem::replace(&mut record.status, status);
        let result = persist(&self.path, &records);
        if result.is_err() {
            // Keep memory in step with the file so a retry writes again.
            if let Some(record) = records.get_mut(&id) {
                record.status = previous;
            }
        }
        result
    }
}

fn persist(path: &Path, records: &BTreeMap<MediaId, MediaItem>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let items: Vec<&MediaItem> = records.values().collect();
    let json = serde_json::to_string_pretty(&items)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

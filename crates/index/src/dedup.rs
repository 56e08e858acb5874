// ┏━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┓
// ┃ Module: dedup                                                       ┃
// ┃ Purpose: O(1) has-this-file-changed decisions                       ┃
// ┃ Author: EricA1019                                                   ┃
// ┃ Last Updated: 2025-09-04                                           ┃
// ┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

use crate::store::IndexStore;

/// In-memory map of `path -> (mtime, size)` for committed documents.
/// Fails open: unknown paths always need reindexing.
#[derive(Default)]
pub struct DedupCache {
    map: Mutex<HashMap<String, (i64, u64)>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct from the index's stored fields at startup.
    pub fn rebuild_from(store: &IndexStore) -> Result<Self> {
        let cache = Self::new();
        store.for_each_meta(|path, mtime, size| cache.record(path, mtime, size))?;
        info!(entries = cache.len(), "dedup cache rebuilt from index");
        Ok(cache)
    }

    /// True unless this exact `(mtime, size)` was already committed for
    /// the path.
    pub fn needs_reindex(&self, path: &str, mtime: i64, size: u64) -> bool {
        match self.map.lock().unwrap_or_else(|e| e.into_inner()).get(path) {
            Some(&(m, s)) => m != mtime || s != size,
            None => true,
        }
    }

    /// Remember a committed ingestion. Call only after the write is visible.
    pub fn record(&self, path: &str, mtime: i64, size: u64) {
        self.map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string(), (mtime, size));
    }

    pub fn forget_all(&self) {
        self.map.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}


//EOF

//! Shared cache of fully processed tables.
//!
//! Loading and transforming a source file is the expensive part of serving
//! a chart, so processed tables are kept behind [`Arc`]s and handed out to
//! every consumer. The cache is explicit: entries only change through
//! [`TableCache::insert`] and the invalidation calls, never behind the
//! caller's back.

use crate::catalog::Dataset;
use crate::types::Table;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe map from dataset to its processed table.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: Mutex<HashMap<Dataset, Arc<Table>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached table, if present.
    pub fn get(&self, dataset: Dataset) -> Option<Arc<Table>> {
        self.entries.lock().get(&dataset).cloned()
    }

    /// Store a processed table, replacing any previous entry.
    pub fn insert(&self, dataset: Dataset, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        self.entries.lock().insert(dataset, Arc::clone(&table));
        debug!("Cached processed table for dataset '{}'", dataset);
        table
    }

    /// Drop a single dataset so the next access reloads from disk.
    pub fn invalidate(&self, dataset: Dataset) {
        if self.entries.lock().remove(&dataset).is_some() {
            debug!("Invalidated cached table for dataset '{}'", dataset);
        }
    }

    /// Drop every cached table.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        if count > 0 {
            debug!("Invalidated {} cached tables", count);
        }
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

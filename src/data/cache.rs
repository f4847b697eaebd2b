//! Session Cache Module
//! Holds the last fetched dataset until the user asks for a reload.

use crate::data::loader::LoadedDataset;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info};

/// Session-scoped cache of the raw dataset.
///
/// The snapshot is immutable once stored and shared through an `Arc`.
#[derive(Default)]
pub struct SessionCache {
    entry: Option<CacheEntry>,
}

struct CacheEntry {
    dataset: Arc<LoadedDataset>,
    fetched_at: DateTime<Local>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly fetched dataset and stamp the fetch time.
    pub fn store(&mut self, dataset: Arc<LoadedDataset>) {
        debug!(rows = dataset.df.height(), "dataset cached");
        self.entry = Some(CacheEntry {
            dataset,
            fetched_at: Local::now(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Drop the cached dataset so the next access fetches again.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            info!("dataset cache invalidated");
        }
    }

    pub fn get(&self) -> Option<Arc<LoadedDataset>> {
        self.entry.as_ref().map(|e| Arc::clone(&e.dataset))
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.entry.as_ref().map(|e| e.fetched_at)
    }
}

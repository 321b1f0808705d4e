//! Windowed cursor store
//!
//! Holds every loaded dataset in memory together with its read cursor and
//! its pending inactivity reset. Datasets are handed out in windows:
//! each [`CursorStore::fetch`] returns the next `count` records and moves the
//! cursor, wrapping back to the first record once a window reaches the end.
//!
//! ```text
//!   load(name, records) ──► cursor = 0, timer rearmed
//!   fetch(name, k)      ──► records[cursor..min(cursor + k, N)]
//!                           cursor = 0 if the window reached N, else cursor + k
//!                           timer rearmed
//!   idle for reset_time ──► cursor = 0
//! ```
//!
//! Each dataset lives behind its own async mutex. Tokio's mutex is fair, so
//! fetches against one dataset are applied in the order they queued.

mod reset;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::records::Record;
use reset::ResetTimer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("dataset not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A named, fully loaded dataset and its read position.
#[derive(Debug)]
struct Dataset {
    records: Vec<Record>,
    cursor: usize,
    generation: u64,
    reset: Option<ResetTimer>,
}

impl Dataset {
    /// Take the next window and advance (or wrap) the cursor.
    fn advance(&mut self, count: usize) -> Vec<Record> {
        let total = self.records.len();
        let start = self.cursor;
        let end = start.saturating_add(count).min(total);
        let window = self.records[start..end].to_vec();
        self.cursor = if end >= total { 0 } else { end };
        window
    }
}

#[derive(Debug)]
pub(crate) struct StoreInner {
    datasets: RwLock<HashMap<String, Arc<Mutex<Dataset>>>>,
    reset_after: Duration,
}

/// Shared handle to the dataset registry. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct CursorStore {
    inner: Arc<StoreInner>,
}

impl CursorStore {
    /// Create an empty store whose cursors reset after `reset_after` of inactivity.
    pub fn new(reset_after: Duration) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                datasets: RwLock::new(HashMap::new()),
                reset_after,
            }),
        }
    }

    pub fn reset_after(&self) -> Duration {
        self.inner.reset_after
    }

    /// Register `name` with `records`, replacing any dataset of the same name.
    ///
    /// The cursor starts at zero and a fresh reset timer replaces any pending one.
    pub async fn load(&self, name: &str, records: Vec<Record>) {
        let count = records.len();
        let mut datasets = self.inner.datasets.write().await;

        match datasets.get(name) {
            Some(entry) => {
                let mut dataset = entry.lock().await;
                dataset.records = records;
                dataset.cursor = 0;
                self.rearm(name, &mut dataset);
            }
            None => {
                let mut dataset = Dataset {
                    records,
                    cursor: 0,
                    generation: 0,
                    reset: None,
                };
                self.rearm(name, &mut dataset);
                datasets.insert(name.to_string(), Arc::new(Mutex::new(dataset)));
            }
        }

        debug!(dataset = %name, records = count, "dataset loaded");
    }

    /// Return the next window of up to `count` records for `name`.
    ///
    /// An empty window is a valid result. Any successful fetch rearms the
    /// dataset's reset timer.
    pub async fn fetch(&self, name: &str, count: usize) -> StoreResult<Vec<Record>> {
        let entry = self.entry(name).await?;
        let mut dataset = entry.lock().await;

        let window = dataset.advance(count);
        self.rearm(name, &mut dataset);

        debug!(
            dataset = %name,
            requested = count,
            returned = window.len(),
            cursor = dataset.cursor,
            "window fetched"
        );
        Ok(window)
    }

    /// Move the cursor of `name` back to zero. Returns `false` if the dataset
    /// is unknown.
    pub async fn expire(&self, name: &str) -> bool {
        let Ok(entry) = self.entry(name).await else {
            return false;
        };
        entry.lock().await.cursor = 0;
        true
    }

    /// Reset path taken by a fired timer. Ignored when the timer was
    /// superseded after it started firing.
    pub(crate) async fn expire_armed(&self, name: &str, generation: u64) {
        let Ok(entry) = self.entry(name).await else {
            return;
        };
        let mut dataset = entry.lock().await;
        if dataset.generation != generation {
            return;
        }
        dataset.cursor = 0;
        info!(dataset = %name, "File {} index has been reset due to inactivity.", name);
    }

    /// Current cursor of `name`, if loaded.
    pub async fn cursor(&self, name: &str) -> Option<usize> {
        let entry = self.entry(name).await.ok()?;
        let cursor = entry.lock().await.cursor;
        Some(cursor)
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.inner.datasets.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.inner.datasets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Cancel every pending reset timer. Returns how many were cancelled.
    pub async fn shutdown(&self) -> usize {
        let datasets = self.inner.datasets.read().await;
        let mut cancelled = 0;
        for entry in datasets.values() {
            if let Some(timer) = entry.lock().await.reset.take() {
                timer.cancel();
                cancelled += 1;
            }
        }
        info!(cancelled, "reset timers cleared");
        cancelled
    }

    async fn entry(&self, name: &str) -> StoreResult<Arc<Mutex<Dataset>>> {
        self.inner
            .datasets
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn rearm(&self, name: &str, dataset: &mut Dataset) {
        dataset.generation = dataset.generation.wrapping_add(1);
        if let Some(old) = dataset.reset.take() {
            old.cancel();
        }
        dataset.reset = Some(ResetTimer::arm(
            Arc::downgrade(&self.inner),
            name.to_string(),
            dataset.generation,
            self.inner.reset_after,
        ));
    }
}

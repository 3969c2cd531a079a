//! Snapshot Manager
//!
//! Owns the persistence lifecycle of the frequency table.
//!
//! ## Responsibilities
//! - **Startup**: Restore the table from the stored snapshot, or run the backfill
//!   once when there is no usable snapshot.
//! - **Periodic save**: Every `interval`, serialize the table and overwrite the
//!   stored snapshot. A failed save is logged and retried at the next tick.

use super::store::SnapshotStore;
use crate::ingestion::backfill::BackfillIngestor;
use crate::ingestion::types::BackfillReport;
use crate::provider::SearchProvider;
use crate::words::table::FrequencyTable;
use crate::words::types::WordValues;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;

/// How the table got its initial contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupSource {
    Snapshot { words: usize },
    Backfill(BackfillReport),
}

pub struct SnapshotManager<S> {
    store: S,
    table: Arc<FrequencyTable>,
    interval: Duration,
    // Held across snapshot + write so overlapping saves land in order.
    save_lock: Mutex<()>,
}

impl<S: SnapshotStore> SnapshotManager<S> {
    pub fn new(store: S, table: Arc<FrequencyTable>, interval: Duration) -> Self {
        Self {
            store,
            table,
            interval,
            save_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the stored snapshot into the table. Returns the number of words restored,
    /// or `None` when there is no usable snapshot.
    pub async fn restore(&self) -> Option<usize> {
        let bytes = match self.store.load().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::info!("No snapshot found");
                return None;
            }
            Err(e) => {
                tracing::error!("Unable to read snapshot: {:#}", e);
                return None;
            }
        };

        match serde_json::from_slice::<WordValues>(&bytes) {
            Ok(values) => {
                let words = values.len();
                self.table.restore(values);
                tracing::info!("Restored {} words from snapshot", words);
                Some(words)
            }
            Err(e) => {
                tracing::error!("Unable to decode snapshot, ignoring it: {}", e);
                None
            }
        }
    }

    /// Restores from the snapshot, falling back to one synchronous backfill.
    pub async fn restore_or_backfill<P: SearchProvider>(
        &self,
        backfill: &BackfillIngestor<P>,
    ) -> StartupSource {
        match self.restore().await {
            Some(words) => StartupSource::Snapshot { words },
            None => StartupSource::Backfill(backfill.run().await),
        }
    }

    /// Serializes the table and writes it to the store. Returns the number of words saved.
    pub async fn save_now(&self) -> Result<usize> {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.table.snapshot();
        let bytes = serde_json::to_vec(&snapshot).context("serializing word values")?;
        self.store.save(&bytes).await?;
        Ok(snapshot.len())
    }

    /// Saves every `interval`, forever. The first save happens one interval after start.
    pub async fn run(&self) {
        tracing::info!("Saving snapshots every {:?}", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            self.save_logged().await;
        }
    }

    /// Saves once per message on `trigger`, until every sender is dropped.
    pub async fn run_with_trigger(&self, mut trigger: mpsc::Receiver<()>) {
        while trigger.recv().await.is_some() {
            self.save_logged().await;
        }
    }

    async fn save_logged(&self) {
        match self.save_now().await {
            Ok(words) => tracing::info!("Saved {} words to snapshot", words),
            Err(e) => tracing::error!("Unable to save word values to snapshot: {:#}", e),
        }
    }
}

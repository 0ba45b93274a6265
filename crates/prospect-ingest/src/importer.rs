//! Checkpoint to database import
//!
//! Every raw record is validated, keyed and upserted on its own. A record
//! that fails any of those steps is counted as skipped and the import moves
//! on; nothing at record level stops the run.

use crate::config::DEFAULT_IMPORT_BATCH_SIZE;
use crate::key::derive_key;
use crate::models::RawRecord;
use crate::store::{ProfileStore, UpsertOutcome};
use crate::validator::validate;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Counters for one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records written to the store, inserts and overwrites alike
    pub imported: usize,
    /// Records that failed validation or could not be written
    pub skipped: usize,
    /// Subset of `imported` that replaced an existing row
    pub updated: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.imported + self.skipped
    }
}

/// Imports checkpointed pages into a [`ProfileStore`]
pub struct Importer<S> {
    store: S,
    batch_size: usize,
}

impl<S: ProfileStore> Importer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            batch_size: DEFAULT_IMPORT_BATCH_SIZE,
        }
    }

    /// Records per batch; only affects log granularity. Zero is clamped to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Import every page, in page order
    pub async fn import_all(&self, pages: &BTreeMap<u32, Vec<RawRecord>>) -> ImportSummary {
        let total: usize = pages.values().map(Vec::len).sum();
        info!(pages = pages.len(), records = total, "Starting import");

        let mut summary = ImportSummary::default();
        for (page, records) in pages {
            for (batch_index, batch) in records.chunks(self.batch_size).enumerate() {
                let before = summary;
                for (offset, raw) in batch.iter().enumerate() {
                    let position = batch_index * self.batch_size + offset;
                    self.import_record(*page, position, raw, &mut summary).await;
                }
                info!(
                    page,
                    batch = batch_index + 1,
                    imported = summary.imported - before.imported,
                    skipped = summary.skipped - before.skipped,
                    "Batch processed"
                );
            }
        }

        info!(
            processed = summary.total(),
            imported = summary.imported,
            updated = summary.updated,
            skipped = summary.skipped,
            "Import finished"
        );
        summary
    }

    async fn import_record(
        &self,
        page: u32,
        position: usize,
        raw: &RawRecord,
        summary: &mut ImportSummary,
    ) {
        let person = match validate(raw) {
            Ok(person) => person,
            Err(e) => {
                warn!(page, position, name = ?raw.display_name(), error = %e, "Skipping invalid record");
                summary.skipped += 1;
                return;
            },
        };

        let key = derive_key(&person);
        match self.store.upsert(&key, &person).await {
            Ok(outcome) => {
                summary.imported += 1;
                if outcome == UpsertOutcome::Updated {
                    summary.updated += 1;
                }
            },
            Err(e) => {
                warn!(page, position, key = %key, error = %e, "Failed to store record");
                summary.skipped += 1;
            },
        }
    }
}

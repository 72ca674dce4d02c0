//! Idempotent batch loader.
//!
//! Rows are inserted one at a time with insert-or-ignore semantics, outside any
//! transaction. A failing row is logged and recorded, and the rest of the batch still
//! goes in, so a batch can end up partially applied. Re-running the same batch only
//! fills the gaps.

use crate::error::{LoadError, RowError};
use crate::models::Batch;
use crate::sync::destination::{Destination, RowWriter};
use crate::sync::stats::{LoadResult, RowFailure};

pub struct Synchronizer<D> {
    destination: D,
}

impl<D: Destination> Synchronizer<D> {
    pub fn new(destination: D) -> Self {
        Self { destination }
    }

    /// Apply `batch` to the destination.
    ///
    /// Returns `Err` only when the insert could not be prepared, in which case no row
    /// of the batch was attempted.
    pub async fn load(&self, batch: Batch) -> Result<LoadResult, LoadError> {
        if batch.is_empty() {
            return Ok(LoadResult::default());
        }

        let mut writer = self.destination.prepare().await?;
        let mut result = LoadResult {
            attempted: batch.len(),
            ..Default::default()
        };

        for record in batch {
            let outcome = match writer.insert_ignore(&record).await {
                Ok(affected @ (0 | 1)) => Ok(affected),
                Ok(affected) => Err(RowError::AffectedRows(affected)),
                Err(err) => Err(RowError::from(err)),
            };

            match outcome {
                Ok(affected) => result.accepted += affected as usize,
                Err(err) => {
                    log::warn!(
                        "failed to insert scan id {} for kiosk {}: {}",
                        record.id,
                        record.kiosk_id,
                        err
                    );
                    result.failures.push(RowFailure {
                        id: record.id,
                        kiosk_id: record.kiosk_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        if result.accepted < result.attempted {
            log::debug!(
                "load: tried to insert {} rows, {} inserted, {} already present, {} failed",
                result.attempted,
                result.accepted,
                result.duplicates(),
                result.failures.len()
            );
        }

        Ok(result)
    }
}

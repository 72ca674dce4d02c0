//! Per-source extraction worker.
//!
//! An [`Extractor`] visits exactly one source: fetch, stamp, hand the batch to the
//! orchestrator, finish. Its failures are logged with the source identity and returned
//! through the task handle; they never reach the result channel.

use crate::config::{DEFAULT_PAGE_SIZE, SourceConfig, SyncConfig};
use crate::error::ExtractError;
use crate::models::Batch;
use crate::sync::source::ScanSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Knobs shared by every extractor in a cycle.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub page_size: i64,
    /// Upper bound on connect + query + decode for one source.
    pub timeout: Option<Duration>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl From<&SyncConfig> for ExtractOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            page_size: config.page_size,
            timeout: config.source_timeout,
        }
    }
}

/// A batch on its way to the synchronizer, tagged with the position of its source in
/// the cycle's configuration list.
#[derive(Debug)]
pub struct ExtractedBatch {
    pub source_index: usize,
    pub batch: Batch,
}

pub struct Extractor<S> {
    source: Arc<S>,
    config: SourceConfig,
    options: ExtractOptions,
}

impl<S: ScanSource> Extractor<S> {
    pub fn new(source: Arc<S>, config: SourceConfig, options: ExtractOptions) -> Self {
        Self {
            source,
            config,
            options,
        }
    }

    /// Pull one batch and stamp every record with this source's kiosk id.
    ///
    /// Rows already decoded are discarded if the source fails part way through.
    pub async fn extract(&self) -> Result<Batch, ExtractError> {
        let fetch = self
            .source
            .fetch_latest(&self.config, self.options.page_size);

        let rows = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| ExtractError::Timeout(limit))??,
            None => fetch.await?,
        };

        let kiosk_id = self.config.kiosk_id.as_str();
        Ok(rows.into_iter().map(|row| row.stamp(kiosk_id)).collect())
    }

    /// Run to completion, posting the batch (if any) on `results`.
    ///
    /// Returns the number of records handed off. Dropping `results` on return is what
    /// tells the orchestrator this extractor is done.
    pub async fn run(
        self,
        source_index: usize,
        results: mpsc::Sender<ExtractedBatch>,
    ) -> Result<usize, ExtractError> {
        let source = self.config.describe();
        log::info!("reading scan data from {}", source);

        let batch = match self.extract().await {
            Ok(batch) => batch,
            Err(err) => {
                log::error!("extraction from {} failed: {}", source, err);
                return Err(err);
            }
        };

        let count = batch.len();
        log::info!("read {} scan rows from {}", count, source);

        if results
            .send(ExtractedBatch {
                source_index,
                batch,
            })
            .await
            .is_err()
        {
            log::error!("result channel closed, dropping {} rows from {}", count, source);
            return Err(ExtractError::Abandoned);
        }

        Ok(count)
    }
}

//! Multi-source scan synchronization.
//!
//! Pulls the most recent scan events from every configured kiosk database and merges
//! them into one destination table without ever duplicating a `(id, kiosk_id)` key.
//!
//! # Architecture Overview
//!
//! - **`source`**: the read interface for kiosk databases and its Postgres
//!   implementation. Connects, queries the newest rows, decodes.
//!
//! - **`extractor`**: one worker per source. Stamps the configured kiosk id on every
//!   row and posts the batch to the orchestrator, or logs its failure and posts nothing.
//!
//! - **`destination`**: the write interface. Prepares an insert-or-ignore statement per
//!   batch and executes it row by row.
//!
//! - **`synchronizer`**: loads a batch through a destination, counting accepted rows
//!   and recording per-row failures without stopping.
//!
//! - **`orchestrator`**: runs a cycle. Spawns the extractors, drains their batches into
//!   the synchronizer and waits for every extractor before reporting.
//!
//! - **`stats`**: per-batch and per-cycle outcomes.
//!
//! - **`database`**: destination schema migrations.
//!
//! ## Data Flow
//!
//! 1. **Fan-out**: one task per source, all running at once
//! 2. **Hand-off**: each successful extractor sends one batch on a bounded channel
//! 3. **Load**: the orchestrator loads batches sequentially as they arrive
//! 4. **Barrier**: the cycle completes once every extractor has finished, failed or not
//!
//! Re-running a cycle over unchanged sources inserts nothing: every key is already
//! present and is skipped by the destination.

pub mod database;
pub mod destination;
pub mod extractor;
pub mod orchestrator;
pub mod source;
pub mod stats;
pub mod synchronizer;

pub use database::run_migrations;
pub use destination::{Destination, PgDestination, RowWriter};
pub use extractor::{ExtractOptions, ExtractedBatch, Extractor};
pub use orchestrator::SyncOrchestrator;
pub use source::{PgScanSource, ScanSource};
pub use stats::{CycleReport, LoadResult, RowFailure, SourceReport, SourceStatus};
pub use synchronizer::Synchronizer;

//! Load outcomes and cycle reporting.
//!
//! Counts are accumulated by the orchestrator's draining loop, which is the only
//! owner of a [`CycleReport`] while a cycle runs.

use serde::Serialize;
use std::fmt;

/// A row the destination refused, identified by its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub id: i64,
    pub kiosk_id: String,
    pub error: String,
}

/// Outcome of loading one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    /// Rows sent to the destination.
    pub attempted: usize,
    /// Rows the destination reported as newly inserted.
    pub accepted: usize,
    pub failures: Vec<RowFailure>,
}

impl LoadResult {
    /// Rows skipped because their key was already present.
    pub fn duplicates(&self) -> usize {
        self.attempted
            .saturating_sub(self.accepted)
            .saturating_sub(self.failures.len())
    }

    /// Merge another LoadResult into this one by summing all counts.
    pub fn merge(&mut self, other: LoadResult) {
        self.attempted += other.attempted;
        self.accepted += other.accepted;
        self.failures.extend(other.failures);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum SourceStatus {
    /// The source's batch reached the synchronizer. Individual rows may still have failed.
    Loaded,
    ExtractFailed(String),
    LoadFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub kiosk_id: String,
    pub source: String,
    pub extracted: usize,
    pub load: LoadResult,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceReport {
    pub fn is_failed(&self) -> bool {
        !matches!(self.status, SourceStatus::Loaded)
    }
}

/// Per-source outcomes of one cycle, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub sources: Vec<SourceReport>,
}

impl CycleReport {
    pub fn extracted(&self) -> usize {
        self.sources.iter().map(|s| s.extracted).sum()
    }

    pub fn accepted(&self) -> usize {
        self.sources.iter().map(|s| s.load.accepted).sum()
    }

    pub fn row_failures(&self) -> usize {
        self.sources.iter().map(|s| s.load.failures.len()).sum()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.is_failed())
    }

    /// Sum of every source's load outcome.
    pub fn totals(&self) -> LoadResult {
        let mut totals = LoadResult::default();
        for source in &self.sources {
            totals.merge(source.load.clone());
        }
        totals
    }

    pub fn source(&self, kiosk_id: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.kiosk_id == kiosk_id)
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Synchronization cycle:")?;
        for source in &self.sources {
            match &source.status {
                SourceStatus::Loaded => writeln!(
                    f,
                    "  {}: {} read, {} inserted, {} already present, {} failed",
                    source.source,
                    source.extracted,
                    source.load.accepted,
                    source.load.duplicates(),
                    source.load.failures.len()
                )?,
                SourceStatus::ExtractFailed(err) => {
                    writeln!(f, "  {}: extraction failed: {}", source.source, err)?
                }
                SourceStatus::LoadFailed(err) => writeln!(
                    f,
                    "  {}: {} read, load failed: {}",
                    source.source, source.extracted, err
                )?,
            }
        }
        writeln!(
            f,
            "  total: {} sources, {} failed, {} rows read, {} inserted, {} row failures",
            self.sources.len(),
            self.failed_sources().count(),
            self.extracted(),
            self.accepted(),
            self.row_failures()
        )?;
        Ok(())
    }
}

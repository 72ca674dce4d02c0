use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while assembling runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingVar(&'static str),
    #[error("failed to read sources file {path}: {source}")]
    SourcesIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sources file {path}: {source}")]
    SourcesFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures that abort a single extractor. None of these reach sibling extractors.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("row decode failed: {0}")]
    Decode(#[source] sqlx::Error),
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),
    #[error("extractor task panicked: {0}")]
    Panicked(String),
    #[error("result channel closed before batch could be delivered")]
    Abandoned,
}

impl ExtractError {
    /// Classify a driver error raised after the connection was established.
    pub fn from_query(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_) => ExtractError::Decode(err),
            _ => ExtractError::Query(err),
        }
    }
}

/// Failures fatal to one synchronizer invocation: no row of the batch is attempted.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to acquire destination connection: {0}")]
    Acquire(#[source] sqlx::Error),
    #[error("failed to prepare insert statement: {0}")]
    Prepare(#[source] sqlx::Error),
}

/// Per-row failures. Logged and recorded; the rest of the batch continues.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("insert failed: {0}")]
    Insert(#[from] sqlx::Error),
    #[error("destination reported {0} affected rows for a single insert")]
    AffectedRows(u64),
}

//! Read side of the pipeline.
//!
//! A [`ScanSource`] knows how to reach one kind of kiosk database and pull its most
//! recent scan events. The extractor owns stamping and logging; implementations only
//! connect, query and decode.

use crate::config::SourceConfig;
use crate::error::ExtractError;
use crate::models::SourceScanRow;
use sqlx::{Connection, PgConnection};
use std::future::Future;

/// Newest `$1` events with `id > 1`, highest id first.
pub const LATEST_SCANS_SQL: &str = r#"SELECT
    id,
    program_code AS program_scan_code,
    scan_code,
    scan_time,
    encrypted_scan_code,
    placement_code,
    choice_selected,
    sample_dispensed,
    scan_type,
    location_id,
    position_id,
    scan_mode_id,
    optin_selected
FROM scan_data
WHERE id > 1
ORDER BY id DESC
LIMIT $1"#;

pub trait ScanSource: Send + Sync + 'static {
    /// Fetch at most `page_size` rows, newest first.
    ///
    /// The connection used must be released before the returned future completes,
    /// on success and on failure.
    fn fetch_latest(
        &self,
        config: &SourceConfig,
        page_size: i64,
    ) -> impl Future<Output = Result<Vec<SourceScanRow>, ExtractError>> + Send;
}

/// Kiosk databases reachable over the Postgres wire protocol.
///
/// Each call opens a dedicated connection instead of borrowing from a pool, since a
/// source is visited once per cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgScanSource;

impl ScanSource for PgScanSource {
    async fn fetch_latest(
        &self,
        config: &SourceConfig,
        page_size: i64,
    ) -> Result<Vec<SourceScanRow>, ExtractError> {
        let mut conn = PgConnection::connect_with(&config.connect_options())
            .await
            .map_err(ExtractError::Connect)?;

        // On error `conn` is dropped here, which closes the socket.
        let rows = sqlx::query_as::<_, SourceScanRow>(LATEST_SCANS_SQL)
            .bind(page_size)
            .fetch_all(&mut conn)
            .await
            .map_err(ExtractError::from_query)?;

        if let Err(err) = conn.close().await {
            log::debug!("closing connection to {} failed: {}", config.describe(), err);
        }

        Ok(rows)
    }
}

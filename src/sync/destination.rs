//! Write side of the pipeline.
//!
//! A [`Destination`] hands out one [`RowWriter`] per batch. Preparing the writer is the
//! only step allowed to fail for the whole batch; afterwards every row succeeds or fails
//! on its own.

use crate::error::LoadError;
use crate::models::ScanRecord;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgStatement};
use sqlx::{Executor, Postgres, Statement};
use std::future::Future;

/// Insert-or-ignore keyed on the destination primary key. A conflicting row is
/// neither an error nor an overwrite.
pub const INSERT_SCAN_SQL: &str = r#"INSERT INTO ods_scan_data (
    id, kiosk_id, program_scan_code, scan_code, scan_time, encrypted_scan_code,
    placement_code, choice_selected, sample_dispensed, scan_type,
    location_id, position_id, scan_mode_id, optin_selected
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
ON CONFLICT (id, kiosk_id) DO NOTHING"#;

pub trait Destination: Send + Sync {
    type Writer: RowWriter;

    /// Acquire whatever the batch needs and prepare the insert statement.
    fn prepare(&self) -> impl Future<Output = Result<Self::Writer, LoadError>> + Send;
}

pub trait RowWriter: Send {
    /// Insert one record, returning the number of rows the destination reports as
    /// newly written (0 when the key already exists).
    fn insert_ignore(
        &mut self,
        record: &ScanRecord,
    ) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

/// Postgres destination backed by the shared pool.
#[derive(Debug, Clone)]
pub struct PgDestination {
    pool: PgPool,
}

impl PgDestination {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Destination for PgDestination {
    type Writer = PgRowWriter;

    async fn prepare(&self) -> Result<PgRowWriter, LoadError> {
        let mut conn = self.pool.acquire().await.map_err(LoadError::Acquire)?;
        let statement = (&mut *conn)
            .prepare(INSERT_SCAN_SQL)
            .await
            .map_err(LoadError::Prepare)?;

        Ok(PgRowWriter { conn, statement })
    }
}

/// One pooled connection and the insert prepared on it, held for a single batch.
pub struct PgRowWriter {
    conn: PoolConnection<Postgres>,
    statement: PgStatement<'static>,
}

impl RowWriter for PgRowWriter {
    async fn insert_ignore(&mut self, record: &ScanRecord) -> Result<u64, sqlx::Error> {
        let payload = &record.payload;
        let result = self
            .statement
            .query()
            .bind(record.id)
            .bind(&record.kiosk_id)
            .bind(&payload.program_scan_code)
            .bind(&payload.scan_code)
            .bind(payload.scan_time)
            .bind(&payload.encrypted_scan_code)
            .bind(&payload.placement_code)
            .bind(&payload.choice_selected)
            .bind(payload.sample_dispensed)
            .bind(&payload.scan_type)
            .bind(payload.location_id)
            .bind(payload.position_id)
            .bind(payload.scan_mode_id)
            .bind(payload.optin_selected)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}

//! Destination schema migrations.
//!
//! The destination must carry the `(id, kiosk_id)` primary key before any batch is
//! loaded, since insert-or-ignore depends on it. Migrations are applied at startup.

use sqlx::{PgPool, migrate::Migrator};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations.
///
/// This is idempotent - migrations that have already been applied will be skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    log::info!("checking destination migration state");

    // `run` ensures the migrations table exists, verifies checksums, and applies
    // any pending migrations before the first load.
    MIGRATOR.run(pool).await?;

    log::info!("destination migrations up to date");
    Ok(())
}

use crate::config::SyncConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Open the shared destination pool. Every load in a cycle goes through it.
pub async fn connect_destination(config: &SyncConfig) -> Result<PgPool, sqlx::Error> {
    log::info!(
        "connecting to destination database (max {} connections)",
        config.max_connections
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

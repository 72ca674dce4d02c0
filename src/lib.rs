pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;

use env_logger::Env;
use std::sync::Once;

static LOGGER: Once = Once::new();

/// Install the process logger. `RUST_LOG` overrides the default filter.
pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or("info,sqlx=warn")).init();
    });
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    pub use database::{SOURCE_SCHEMA_SQL, TestCluster, TestDatabaseError};

    pub mod database {
        use crate::config::SourceConfig;
        use crate::models::SourceScanRow;
        use crate::sync::database::MIGRATOR;
        use log::LevelFilter;
        use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use sqlx::{ConnectOptions, PgPool};
        use testcontainers::{ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner};
        use testcontainers_modules::postgres::Postgres;
        use thiserror::Error;
        use uuid::Uuid;

        const USER: &str = "postgres";
        const PASSWORD: &str = "postgres";

        /// Shape of a kiosk's own `scan_data` table.
        pub const SOURCE_SCHEMA_SQL: &str = r#"CREATE TABLE scan_data (
            id BIGINT PRIMARY KEY,
            program_code TEXT,
            scan_code TEXT,
            scan_time TIMESTAMPTZ,
            encrypted_scan_code TEXT,
            placement_code TEXT,
            choice_selected TEXT,
            sample_dispensed BOOLEAN,
            scan_type TEXT,
            location_id INTEGER,
            position_id INTEGER,
            scan_mode_id INTEGER,
            optin_selected BOOLEAN
        )"#;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// A disposable Postgres server hosting any number of source and destination
        /// databases for integration tests.
        pub struct TestCluster {
            admin_pool: Option<PgPool>,
            base_options: PgConnectOptions,
            host: String,
            port: u16,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestCluster {
            /// Launch the container and connect to its maintenance database.
            pub async fn start() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;

                let base_options = PgConnectOptions::new()
                    .host(&host)
                    .port(port)
                    .username(USER)
                    .password(PASSWORD)
                    .log_statements(LevelFilter::Off);

                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(base_options.clone().database("postgres"))
                    .await?;

                Ok(Self {
                    admin_pool: Some(admin_pool),
                    base_options,
                    host,
                    port,
                    container: Some(container),
                })
            }

            fn admin_pool(&self) -> &PgPool {
                self.admin_pool
                    .as_ref()
                    .expect("admin pool is available until close")
            }

            /// Create an empty database with a unique name derived from `prefix`.
            pub async fn create_database(&self, prefix: &str) -> Result<String, TestDatabaseError> {
                let name = format!("{}_{}", prefix, Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", name);
                sqlx::query(&create_sql).execute(self.admin_pool()).await?;
                Ok(name)
            }

            pub async fn connect(&self, database: &str) -> Result<PgPool, TestDatabaseError> {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(self.base_options.clone().database(database))
                    .await?;
                Ok(pool)
            }

            /// Fresh destination database with migrations applied.
            pub async fn destination(&self) -> Result<PgPool, TestDatabaseError> {
                let name = self.create_database("destination").await?;
                let pool = self.connect(&name).await?;
                MIGRATOR.run(&pool).await?;
                Ok(pool)
            }

            /// Fresh kiosk database holding `rows`, plus a config pointing at it.
            pub async fn source(
                &self,
                kiosk_id: &str,
                rows: &[SourceScanRow],
            ) -> Result<SourceConfig, TestDatabaseError> {
                let name = self.create_database("kiosk").await?;
                let pool = self.connect(&name).await?;

                sqlx::query(SOURCE_SCHEMA_SQL).execute(&pool).await?;
                for row in rows {
                    let payload = &row.payload;
                    sqlx::query(
                        r#"INSERT INTO scan_data (
                            id, program_code, scan_code, scan_time, encrypted_scan_code,
                            placement_code, choice_selected, sample_dispensed, scan_type,
                            location_id, position_id, scan_mode_id, optin_selected
                        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
                    )
                    .bind(row.id)
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
                    .execute(&pool)
                    .await?;
                }
                pool.close().await;

                Ok(self.source_config(&name, kiosk_id))
            }

            /// Config for a database on this server, which need not exist.
            pub fn source_config(&self, database: &str, kiosk_id: &str) -> SourceConfig {
                SourceConfig::new(&self.host, self.port, database, kiosk_id)
                    .with_auth(USER, PASSWORD)
            }

            /// Close the admin pool and stop the container.
            pub async fn close(mut self) {
                if let Some(pool) = self.admin_pool.take() {
                    pool.close().await;
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }
}

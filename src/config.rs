use crate::error::ConfigError;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Rows pulled from each source per cycle.
pub const DEFAULT_PAGE_SIZE: i64 = 1000;

fn env_u32(key: &str, default: u32) -> u32 {
    parse_u32(env::var(key).ok().as_deref(), default)
}

/// Values that are missing, malformed or out of `u32` range fall back to `default`.
fn parse_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn env_duration_millis(key: &str, default_millis: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default_millis))
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn default_port() -> u16 {
    5432
}

/// Connection parameters for one kiosk source.
///
/// `kiosk_id` is not stored in the source database; it is stamped onto every
/// row extracted from this source.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub kiosk_id: String,
}

impl SourceConfig {
    pub fn new(host: &str, port: u16, database: &str, kiosk_id: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            user: String::new(),
            password: String::new(),
            database: database.to_string(),
            kiosk_id: kiosk_id.to_string(),
        }
    }

    pub fn with_auth(mut self, user: &str, password: &str) -> Self {
        self.user = user.to_string();
        self.password = password.to_string();
        self
    }

    /// Human-readable identity used in every log line about this source.
    pub fn describe(&self) -> String {
        format!(
            "kiosk {} (database {} on server {}:{})",
            self.kiosk_id, self.database, self.host, self.port
        )
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("kiosk_id", &self.kiosk_id)
            .finish()
    }
}

/// Read the list of sources from a JSON array.
pub fn load_sources(path: &Path) -> Result<Vec<SourceConfig>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SourcesIo {
        path: path.to_path_buf(),
        source,
    })?;

    parse_sources(&raw).map_err(|source| ConfigError::SourcesFormat {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_sources(raw: &str) -> Result<Vec<SourceConfig>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Process-level settings for one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub sources_path: PathBuf,
    pub page_size: i64,
    /// `None` disables the per-source deadline.
    pub source_timeout: Option<Duration>,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        let max_connections = env_u32("DESTINATION_MAX_CONNECTIONS", 5).max(1);
        let sources_path = PathBuf::from(env_string("SYNC_SOURCES_PATH", "sources.json"));
        let page_size = env_i64("SYNC_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        let timeout = env_duration_millis("SYNC_SOURCE_TIMEOUT_MS", 30_000);

        Ok(Self {
            database_url,
            max_connections,
            sources_path,
            page_size,
            source_timeout: (!timeout.is_zero()).then_some(timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sources_with_default_port() {
        let raw = r#"[
            {"host": "10.0.0.5", "user": "sync", "password": "pw", "database": "freeosk", "kiosk_id": "K-100"},
            {"host": "10.0.0.6", "port": 15432, "user": "sync", "password": "pw", "database": "freeosk", "kiosk_id": "K-200"}
        ]"#;

        let sources = parse_sources(raw).expect("valid sources");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].port, 5432);
        assert_eq!(sources[1].port, 15432);
        assert_eq!(sources[1].kiosk_id, "K-200");
    }

    #[test]
    fn rejects_source_without_kiosk_id() {
        let raw = r#"[{"host": "h", "user": "u", "password": "p", "database": "d"}]"#;
        assert!(parse_sources(raw).is_err());
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = SourceConfig::new("db1", 5432, "freeosk", "A").with_auth("sync", "hunter2");
        let rendered = format!("{:?}", config);

        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn describe_names_kiosk_and_server() {
        let config = SourceConfig::new("db1", 6543, "freeosk", "A");
        assert_eq!(config.describe(), "kiosk A (database freeosk on server db1:6543)");
    }

    #[test]
    fn missing_sources_file_reports_path() {
        let err = load_sources(Path::new("/nonexistent/kiosk-sources.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kiosk-sources.json"));
    }

    #[test]
    fn connection_limit_outside_u32_falls_back_to_default() {
        assert_eq!(parse_u32(Some("12"), 5), 12);
        assert_eq!(parse_u32(Some("4294967296"), 5), 5);
        assert_eq!(parse_u32(Some("-3"), 5), 5);
        assert_eq!(parse_u32(None, 5), 5);
    }
}

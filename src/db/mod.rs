pub mod config;
pub mod operations;
pub mod schema;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode as SqlxJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::config::{DbConfig, DbConfigError, SqliteJournalMode};

#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: SqlitePool,
}

impl DatabaseProxy {
    pub async fn from_env() -> Result<Self, DbInitError> {
        let config = DbConfig::from_env()?;
        Self::connect(config).await
    }

    pub async fn connect(config: DbConfig) -> Result<Self, DbInitError> {
        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout)
            .foreign_keys(config.foreign_keys);

        if !config.is_in_memory() {
            if let Some(parent) = sqlite_file_path(&config.url).and_then(|p| {
                std::path::Path::new(p).parent().map(|d| d.to_path_buf())
            }) {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(&parent).map_err(DbInitError::Io)?;
                }
            }
            options = options.journal_mode(match config.journal_mode {
                SqliteJournalMode::Wal => SqlxJournalMode::Wal,
                SqliteJournalMode::Delete => SqlxJournalMode::Delete,
                SqliteJournalMode::Memory => SqlxJournalMode::Memory,
            });
        }

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options.connect_with(options).await?;
        let proxy = Self { config, pool };
        proxy.ensure_schema().await?;

        tracing::info!(url = %proxy.config.url, "database ready");
        Ok(proxy)
    }

    pub async fn in_memory() -> Result<Self, DbInitError> {
        Self::connect(DbConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for stmt in schema::split_sql_statements(schema::SCHEMA_SQL) {
            sqlx::query(&stmt).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn sqlite_file_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty()).then_some(path)
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("failed to create database directory: {0}")]
    Io(std::io::Error),
}

pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn format_iso(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_string_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

/// Strict decoding for membership columns. A value that is not a JSON
/// array of strings is an error, never an empty list. `NULL` reads as empty.
pub(crate) fn decode_id_list(
    raw: Option<String>,
    column: &str,
) -> Result<Vec<String>, sqlx::Error> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(&text).map_err(|err| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(err),
        }),
    }
}

pub(crate) fn encode_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_file_path_strips_scheme_and_query() {
        assert_eq!(sqlite_file_path("sqlite:./data/ielts.db"), Some("./data/ielts.db"));
        assert_eq!(sqlite_file_path("sqlite:///tmp/a.db?mode=rwc"), Some("/tmp/a.db"));
        assert_eq!(sqlite_file_path("sqlite:"), None);
    }

    #[test]
    fn malformed_list_column_decodes_to_empty() {
        assert!(decode_string_list(Some("not json".to_string())).is_empty());
        assert!(decode_string_list(None).is_empty());
        assert_eq!(
            decode_string_list(Some(r#"["a","b"]"#.to_string())),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn malformed_membership_column_is_an_error() {
        assert!(decode_id_list(Some(r#"["v1", 2]"#.to_string()), "itemIds").is_err());
        assert!(decode_id_list(Some("not json".to_string()), "itemIds").is_err());
        assert!(decode_id_list(None, "itemIds").unwrap().is_empty());
        assert_eq!(
            decode_id_list(Some(r#"["v1"]"#.to_string()), "itemIds").unwrap(),
            vec!["v1".to_string()]
        );
    }
}

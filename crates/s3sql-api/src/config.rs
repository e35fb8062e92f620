//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/s3sql` |
//! | `HOST` / `PORT` | `0.0.0.0` / `3000` |
//! | `METADATA_TABLE` | `file_metadata` |
//! | `SEARCH_ROW_LIMIT` | `1000` |
//! | `SEARCH_CACHE_TTL_SECS` | `300` (`0` = never expire) |
//! | `SEARCH_CACHE_CAPACITY` | `256` |
//! | `LINK_CACHE_TTL_SECS` | `600` (`0` = no link caching) |
//! | `LINK_CACHE_CAPACITY` | `4096` |
//! | `PRESIGN_EXPIRY_SECS` | `900` |
//! | `PRESIGN_BACKEND` | `sql` (`sql` or `http`) |
//! | `PRESIGN_HTTP_URL` | required when `PRESIGN_BACKEND=http` |
//! | `PRESIGN_HTTP_TIMEOUT_SECS` | `30` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `DB_STATEMENT_TIMEOUT_SECS` | unset (`0` = server default) |
//! | `RUN_MIGRATIONS` | `false` |

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use s3sql_core::defaults;
use s3sql_core::{Error, Result};
use s3sql_db::pool::DEFAULT_MAX_CONNECTIONS;
use s3sql_db::{validate_table_name, PoolConfig};

/// Which presign backend mints download URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresignBackendKind {
    /// `get_presigned_url` SQL function in the metadata database.
    Sql,
    /// External HTTP signer at the given base URL.
    Http { base_url: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub metadata_table: String,
    pub search_row_limit: i64,
    /// `None` keeps search results until invalidated.
    pub search_cache_ttl: Option<Duration>,
    pub search_cache_capacity: usize,
    pub link_cache_ttl: Duration,
    pub link_cache_capacity: usize,
    pub presign_expiry: Duration,
    pub presign_backend: PresignBackendKind,
    pub presign_http_timeout: Duration,
    pub db_max_connections: u32,
    pub db_statement_timeout: Option<Duration>,
    pub run_migrations: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            metadata_table: defaults::METADATA_TABLE.to_string(),
            search_row_limit: defaults::SEARCH_ROW_LIMIT,
            search_cache_ttl: Some(Duration::from_secs(defaults::SEARCH_CACHE_TTL_SECS)),
            search_cache_capacity: defaults::SEARCH_CACHE_CAPACITY,
            link_cache_ttl: Duration::from_secs(defaults::LINK_CACHE_TTL_SECS),
            link_cache_capacity: defaults::LINK_CACHE_CAPACITY,
            presign_expiry: Duration::from_secs(defaults::PRESIGN_EXPIRY_SECS),
            presign_backend: PresignBackendKind::Sql,
            presign_http_timeout: Duration::from_secs(defaults::PRESIGN_HTTP_TIMEOUT_SECS),
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            db_statement_timeout: None,
            run_migrations: false,
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}={:?} is invalid: {}", key, raw, e))),
        _ => Ok(default),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) if v == "true" || v == "1" || v == "yes" => Ok(true),
        Some(v) if v == "false" || v == "0" || v == "no" => Ok(false),
        Some(v) => Err(Error::Config(format!("{}={:?} is not a boolean", key, v))),
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base = Self::default();

        let metadata_table = lookup("METADATA_TABLE").unwrap_or(base.metadata_table);
        validate_table_name(&metadata_table)?;

        let search_row_limit: i64 = parse_var(&lookup, "SEARCH_ROW_LIMIT", base.search_row_limit)?;
        if search_row_limit <= 0 {
            return Err(Error::Config(
                "SEARCH_ROW_LIMIT must be greater than zero".to_string(),
            ));
        }

        let search_ttl_secs: u64 =
            parse_var(&lookup, "SEARCH_CACHE_TTL_SECS", defaults::SEARCH_CACHE_TTL_SECS)?;
        let link_ttl_secs: u64 =
            parse_var(&lookup, "LINK_CACHE_TTL_SECS", defaults::LINK_CACHE_TTL_SECS)?;
        let presign_expiry_secs: u64 =
            parse_var(&lookup, "PRESIGN_EXPIRY_SECS", defaults::PRESIGN_EXPIRY_SECS)?;
        if presign_expiry_secs == 0 {
            return Err(Error::Config(
                "PRESIGN_EXPIRY_SECS must be greater than zero".to_string(),
            ));
        }
        let timeout_secs: u64 = parse_var(
            &lookup,
            "PRESIGN_HTTP_TIMEOUT_SECS",
            defaults::PRESIGN_HTTP_TIMEOUT_SECS,
        )?;

        let statement_timeout_secs: u64 = parse_var(&lookup, "DB_STATEMENT_TIMEOUT_SECS", 0)?;

        let presign_backend = match lookup("PRESIGN_BACKEND")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("sql") => PresignBackendKind::Sql,
            Some("http") => {
                let base_url = lookup("PRESIGN_HTTP_URL")
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| {
                        Error::Config(
                            "PRESIGN_HTTP_URL is required when PRESIGN_BACKEND=http".to_string(),
                        )
                    })?;
                PresignBackendKind::Http { base_url }
            }
            Some(other) => {
                return Err(Error::Config(format!(
                    "PRESIGN_BACKEND={:?} is invalid. Expected: sql, http",
                    other
                )))
            }
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(base.database_url),
            host: lookup("HOST").unwrap_or(base.host),
            port: parse_var(&lookup, "PORT", base.port)?,
            metadata_table,
            search_row_limit,
            search_cache_ttl: (search_ttl_secs > 0).then(|| Duration::from_secs(search_ttl_secs)),
            search_cache_capacity: parse_var(
                &lookup,
                "SEARCH_CACHE_CAPACITY",
                base.search_cache_capacity,
            )?,
            link_cache_ttl: Duration::from_secs(link_ttl_secs),
            link_cache_capacity: parse_var(&lookup, "LINK_CACHE_CAPACITY", base.link_cache_capacity)?,
            presign_expiry: Duration::from_secs(presign_expiry_secs),
            presign_backend,
            presign_http_timeout: Duration::from_secs(timeout_secs),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", base.db_max_connections)?,
            db_statement_timeout: (statement_timeout_secs > 0)
                .then(|| Duration::from_secs(statement_timeout_secs)),
            run_migrations: parse_bool(&lookup, "RUN_MIGRATIONS", base.run_migrations)?,
        })
    }

    /// Pool settings derived from this configuration.
    pub fn pool_config(&self) -> PoolConfig {
        let config = PoolConfig::new().max_connections(self.db_max_connections);
        match self.db_statement_timeout {
            Some(timeout) => config.statement_timeout(timeout),
            None => config,
        }
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.metadata_table, "file_metadata");
        assert_eq!(config.search_row_limit, 1000);
        assert_eq!(config.search_cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.link_cache_ttl, Duration::from_secs(600));
        assert_eq!(config.presign_expiry, Duration::from_secs(900));
        assert_eq!(config.presign_backend, PresignBackendKind::Sql);
        assert!(!config.run_migrations);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_zero_search_ttl_never_expires() {
        let config = load(&[("SEARCH_CACHE_TTL_SECS", "0")]).unwrap();
        assert_eq!(config.search_cache_ttl, None);
    }

    #[test]
    fn test_http_backend_requires_url() {
        assert!(matches!(
            load(&[("PRESIGN_BACKEND", "http")]),
            Err(Error::Config(_))
        ));

        let config = load(&[
            ("PRESIGN_BACKEND", "HTTP"),
            ("PRESIGN_HTTP_URL", "http://signer:8080"),
        ])
        .unwrap();
        assert_eq!(
            config.presign_backend,
            PresignBackendKind::Http {
                base_url: "http://signer:8080".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("SEARCH_ROW_LIMIT", "0")]).is_err());
        assert!(load(&[("PRESIGN_BACKEND", "s3")]).is_err());
        assert!(load(&[("RUN_MIGRATIONS", "maybe")]).is_err());
        assert!(load(&[("METADATA_TABLE", "files; drop table files")]).is_err());
        assert!(load(&[("PRESIGN_EXPIRY_SECS", "0")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("METADATA_TABLE", "app_data.file_metadata"),
            ("RUN_MIGRATIONS", "true"),
            ("DB_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.metadata_table, "app_data.file_metadata");
        assert!(config.run_migrations);
        assert_eq!(config.db_max_connections, 4);
        assert_eq!(config.pool_config().max_connections, 4);
        assert_eq!(config.pool_config().statement_timeout, None);
    }

    #[test]
    fn test_statement_timeout() {
        let config = load(&[("DB_STATEMENT_TIMEOUT_SECS", "20")]).unwrap();
        assert_eq!(
            config.pool_config().statement_timeout,
            Some(Duration::from_secs(20))
        );
    }
}

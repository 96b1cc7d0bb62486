//! Environment-driven configuration shared by both binaries.

use anyhow::{anyhow, Context, Result};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_BASE_URL};
use crate::db_connect::PoolOptions;
use crate::store::{AnalysisStore, ArenaStore, PgAnalysisStore};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STORE_PATH: &str = "compass_history.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Nothing survives the process.
    Memory,
    /// JSON snapshot at the given path.
    File(PathBuf),
    Postgres,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    /// Caller-side deadline for a single fetch; the client itself never
    /// times out a request.
    pub request_timeout: Duration,
    pub store: StoreBackend,
    /// Only used by the Postgres backend.
    pub pg_pool: PoolOptions,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = lookup("COMPASS_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let request_timeout = Duration::from_secs(
            parse_var(&lookup, "COMPASS_REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        let store_path = lookup("COMPASS_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());
        let store = match lookup("COMPASS_STORE")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("file") => StoreBackend::File(PathBuf::from(store_path)),
            Some("memory") => StoreBackend::Memory,
            Some("postgres") => StoreBackend::Postgres,
            Some(other) => {
                return Err(anyhow!(
                    "Unknown COMPASS_STORE '{}', expected file, memory or postgres",
                    other
                ))
            }
        };

        let defaults = PoolOptions::default();
        let pg_pool = PoolOptions {
            max_size: parse_var(&lookup, "COMPASS_PG_POOL_MAX_SIZE")?.unwrap_or(defaults.max_size),
            min_idle: parse_var(&lookup, "COMPASS_PG_POOL_MIN_IDLE")?.or(defaults.min_idle),
            idle_timeout: defaults.idle_timeout,
            connection_timeout: parse_var(&lookup, "COMPASS_PG_POOL_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connection_timeout),
        };
        if pg_pool.max_size == 0 {
            return Err(anyhow!("COMPASS_PG_POOL_MAX_SIZE must be at least 1"));
        }

        Ok(Settings {
            api_base_url,
            request_timeout,
            store,
            pg_pool,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
        }
    }

    /// Opens the configured store backend.
    pub async fn open_store(&self) -> Result<Arc<dyn AnalysisStore>> {
        match self.store {
            StoreBackend::Memory => {
                info!("Using in-memory analysis store");
                Ok(Arc::new(ArenaStore::in_memory()))
            }
            StoreBackend::File(ref path) => {
                info!("Using file analysis store at {:?}", path);
                let store = ArenaStore::open(path.clone())
                    .await
                    .context(format!("Failed to open analysis store at {:?}", path))?;
                Ok(Arc::new(store))
            }
            StoreBackend::Postgres => {
                info!("Using PostgreSQL analysis store");
                Ok(Arc::new(PgAnalysisStore::connect(&self.pg_pool).await?))
            }
        }
    }
}

/// Parses an optional numeric variable; present but unparsable is an error.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .context(format!("{} is not a number: '{}'", key, raw)),
        None => Ok(None),
    }
}

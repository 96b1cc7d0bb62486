use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::info;
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

const DEFAULT_DB: &str = "compass";
const APPLICATION_NAME: &str = "compass_analysis";

/// Pool of `tokio_postgres` connections managed by `bb8`.
pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Sizing and timeouts for the store's connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_size: u32,
    pub min_idle: Option<u32>,
    pub idle_timeout: Option<Duration>,
    pub connection_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 8,
            min_idle: Some(1),
            idle_timeout: Some(Duration::from_secs(180)),
            connection_timeout: Duration::from_secs(40),
        }
    }
}

/// Builds the PostgreSQL connection configuration from `POSTGRES_*` values.
fn build_pg_config(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let host = lookup("POSTGRES_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let port = lookup("POSTGRES_PORT")
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(5432);
    let dbname = lookup("POSTGRES_DB").unwrap_or_else(|| DEFAULT_DB.to_string());
    let user = lookup("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string());
    let password = lookup("POSTGRES_PASSWORD").unwrap_or_default();

    info!(
        "Store DB config: host={}, port={}, db={}, user={}",
        host, port, dbname, user
    );
    let mut config = Config::new();
    config
        .host(&host)
        .port(port)
        .dbname(&dbname)
        .user(&user)
        .password(&password)
        .application_name(APPLICATION_NAME)
        .connect_timeout(Duration::from_secs(10));
    config
}

/// Establishes the connection pool and checks it with `SELECT 1`.
pub async fn connect(options: &PoolOptions) -> Result<PgPool> {
    let config = build_pg_config(|key| std::env::var(key).ok());
    info!("Connecting to the analysis store database...");
    let manager = PostgresConnectionManager::new(config, NoTls);

    let pool = Pool::builder()
        .max_size(options.max_size)
        .min_idle(options.min_idle)
        .idle_timeout(options.idle_timeout)
        .connection_timeout(options.connection_timeout)
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    let conn = pool
        .get()
        .await
        .context("Failed to get test connection from pool")?;
    conn.query_one("SELECT 1", &[])
        .await
        .context("Test query 'SELECT 1' failed")?;
    drop(conn);
    info!(
        "Store pool initialized with max_size: {}, min_idle: {:?}.",
        options.max_size, options.min_idle,
    );
    Ok(pool)
}

/// Returns `(total, idle, in_use)` connection counts.
pub fn get_pool_status(pool: &PgPool) -> (usize, usize, usize) {
    let state = pool.state();
    let total_connections = state.connections as usize;
    let idle_connections = state.idle_connections as usize;
    (
        total_connections,
        idle_connections,
        total_connections.saturating_sub(idle_connections),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::config::Host;

    #[test]
    fn config_defaults_to_the_local_compass_db() {
        let config = build_pg_config(|_| None);
        assert_eq!(config.get_hosts(), &[Host::Tcp("127.0.0.1".to_string())]);
        assert_eq!(config.get_ports(), &[5432]);
        assert_eq!(config.get_dbname(), Some(DEFAULT_DB));
        assert_eq!(config.get_user(), Some("postgres"));
        assert_eq!(config.get_application_name(), Some(APPLICATION_NAME));
    }

    #[test]
    fn unparsable_port_falls_back() {
        let config = build_pg_config(|key| match key {
            "POSTGRES_PORT" => Some("not-a-port".to_string()),
            "POSTGRES_DB" => Some("history".to_string()),
            _ => None,
        });
        assert_eq!(config.get_ports(), &[5432]);
        assert_eq!(config.get_dbname(), Some("history"));
    }
}

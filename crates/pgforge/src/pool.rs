//! Pooled connections (feature `pool`).

use std::str::FromStr;

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::error::{SqlError, SqlResult};

/// Pool sizing knobs.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_size: 16 }
    }
}

/// Build a connection pool from a `postgres://` URL with default sizing.
pub fn create_pool(database_url: &str) -> SqlResult<Pool> {
    create_pool_with_config(database_url, PoolConfig::default())
}

/// Build a connection pool with explicit sizing.
pub fn create_pool_with_config(database_url: &str, config: PoolConfig) -> SqlResult<Pool> {
    let pg_config = tokio_postgres::Config::from_str(database_url)
        .map_err(|e| SqlError::Connection(format!("invalid database url: {e}")))?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    Pool::builder(manager)
        .max_size(config.max_size)
        .build()
        .map_err(|e| SqlError::Pool(e.to_string()))
}

/// Check out one connection from the pool.
pub async fn acquire(pool: &Pool) -> SqlResult<Object> {
    Ok(pool.get().await?)
}

//! Database Module
//!
//! One storage adapter over two interchangeable relational backends:
//! a networked primary (MySQL) and an embedded single-file fallback
//! (SQLite). The backend is resolved once from configuration; an
//! unreachable backend fails the operation — it is never silently
//! substituted by the other one.

pub mod repository;
pub mod schema;

use crate::core::config::{StorageConfig, StorageMode};
use crate::core::error::{MarketError, MarketResult};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

/// Storage adapter — owns the connection pool for the configured backend.
///
/// Connections are acquired per statement through the pool and released on
/// every exit path; the acquire timeout bounds how long a storage call can
/// block.
#[derive(Clone)]
pub struct Storage {
    pool: AnyPool,
    mode: StorageMode,
}

impl Storage {
    /// Connect to the configured backend and apply its static schema.
    pub async fn connect(config: &StorageConfig) -> MarketResult<Self> {
        sqlx::any::install_default_drivers();

        let url = match config.mode {
            StorageMode::Primary => format!(
                "mysql://{}:{}@{}:{}/{}",
                config.user, config.password, config.host, config.port, config.database
            ),
            StorageMode::Fallback => format!("sqlite://{}?mode=rwc", config.sqlite_path),
        };

        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(config.timeout)
            .connect(&url)
            .await
            .map_err(|e| {
                MarketError::StorageUnavailable(format!(
                    "failed to open {:?} backend: {e}",
                    config.mode
                ))
            })?;

        schema::apply(&pool, config.mode).await?;

        tracing::info!(mode = ?config.mode, "Storage backend connected, schema ensured");

        Ok(Self {
            pool,
            mode: config.mode,
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }
}

//! Storage gateway: the one seam between the ingestion pipeline and
//! Postgres. The pipeline depends on the [`EventStore`] trait so tests (and
//! any future store) can stand in for the real pool.

pub mod insert;

use apipulse_core::StoredRow;
use apipulse_core::config::DatabaseConfig;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("insert timed out after {0} ms")]
    Timeout(u64),
}

/// Sink for admitted, redacted rows. One call per ingested batch.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert the rows in one statement, returning how many landed.
    async fn insert_batch(&self, rows: &[StoredRow]) -> Result<u64, StorageError>;
}

/// Production store backed by a sqlx connection pool.
///
/// A connection is acquired from the pool per call and released on every exit
/// path; nothing is shared across requests beyond the pool itself.
pub struct PgEventStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgEventStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect(&config.dsn)
            .await?;
        debug!(max_connections = config.max_connections, "Connected to Postgres");
        Ok(Self {
            pool,
            statement_timeout: Duration::from_millis(config.statement_timeout_ms),
        })
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert_batch(&self, rows: &[StoredRow]) -> Result<u64, StorageError> {
        let mut builder = insert::build_insert(rows);
        let query = builder.build();

        // A stalled write only ever holds up the request that issued it.
        let result = tokio::time::timeout(self.statement_timeout, query.execute(&self.pool))
            .await
            .map_err(|_| StorageError::Timeout(self.statement_timeout.as_millis() as u64))??;

        Ok(result.rows_affected())
    }
}

use sqlx::PgPool;
use std::time::Duration;

use crate::shared::{AppError, AppResult};

/// Reusable database service wrapping the shared connection pool.
pub struct DatabaseService {
    pool: PgPool,
}

impl DatabaseService {
    /// Create a new database service from an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health with a simple query
    pub async fn health_check(&self) -> AppResult<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(AppError::from)
    }

    /// Check database health with timeout
    pub async fn health_check_with_timeout(&self, timeout: Duration) -> AppResult<bool> {
        tokio::time::timeout(timeout, self.health_check())
            .await
            .map_err(|_| AppError::Internal("Database health check timeout".to_string()))?
    }

    /// Get active connection count
    pub fn active_connections(&self) -> u32 {
        self.pool.size()
    }

    /// Get idle connection count
    pub fn idle_connections(&self) -> usize {
        self.pool.num_idle()
    }
}

/// Create a database pool with configuration options
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> AppResult<PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect(database_url)
        .await
        .map_err(AppError::from)
}

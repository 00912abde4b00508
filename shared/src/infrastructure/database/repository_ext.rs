//! Repository Error Extension Trait
//!
//! Standardized error mapping for repository implementations: one call
//! adds operation context, structured logging and transient/conflict
//! classification.

use crate::shared::{AppError, AppResult};
use tracing::error;

/// Extension trait for standardized repository error handling.
pub trait RepositoryErrorExt<T> {
    /// Maps database errors with operation and entity context.
    ///
    /// # Arguments
    ///
    /// * `operation` - The database operation being performed (e.g., "fetch", "insert", "update", "delete")
    /// * `entity` - The entity type being operated on (e.g., "workflow", "workflow_node")
    fn map_db_error(self, operation: &str, entity: &str) -> AppResult<T>;
}

impl<T> RepositoryErrorExt<T> for Result<T, sqlx::Error> {
    fn map_db_error(self, operation: &str, entity: &str) -> AppResult<T> {
        self.map_err(|e| {
            error!(
                operation = %operation,
                entity = %entity,
                error = %e,
                "Database error during {} {}",
                operation,
                entity
            );

            // AppError::from classifies serialization failures and
            // deadlocks as Transient and unique violations as Conflict.
            AppError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_db_error_preserves_ok() {
        let result: Result<i32, sqlx::Error> = Ok(42);
        let mapped = result.map_db_error("test", "entity").unwrap();
        assert_eq!(mapped, 42);
    }

    #[test]
    fn test_map_db_error_wraps_failure() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result.map_db_error("fetch", "workflow_node").unwrap_err();
        assert_eq!(err.kind(), crate::shared::ErrorKind::Database);
    }
}

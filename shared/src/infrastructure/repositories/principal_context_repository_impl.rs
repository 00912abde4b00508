//! PostgreSQL implementation of the principal-context repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::PrincipalContext;
use crate::domain::repositories::{PgTx, PrincipalContextRepository};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

const CONTEXT_COLUMNS: &str = "id, principal_id, context, created_at, updated_at";

pub struct PrincipalContextRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl PrincipalContextRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl PrincipalContextRepository for PrincipalContextRepositoryImpl {
    async fn by_principal_id(&self, principal_id: Uuid) -> AppResult<Option<PrincipalContext>> {
        let sql = format!(
            "SELECT {} FROM principal_contexts WHERE principal_id = $1",
            CONTEXT_COLUMNS
        );
        sqlx::query_as::<_, PrincipalContext>(&sql)
            .bind(principal_id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "principal_context")
    }

    async fn merge(
        &self,
        tx: &mut PgTx<'_>,
        principal_id: Uuid,
        patch: &Map<String, Value>,
    ) -> AppResult<PrincipalContext> {
        assert!(!principal_id.is_nil(), "Principal ID must not be nil");

        let select_sql = format!(
            "SELECT {} FROM principal_contexts WHERE principal_id = $1 FOR UPDATE",
            CONTEXT_COLUMNS
        );
        let existing = sqlx::query_as::<_, PrincipalContext>(&select_sql)
            .bind(principal_id)
            .fetch_optional(&mut **tx)
            .await
            .map_db_error("lock", "principal_context")?;

        let row = match existing {
            Some(mut row) => {
                for (key, value) in patch {
                    row.context.0.insert(key.clone(), value.clone());
                }
                let update_sql = format!(
                    "UPDATE principal_contexts SET context = $2, updated_at = now() \
                     WHERE principal_id = $1 RETURNING {}",
                    CONTEXT_COLUMNS
                );
                sqlx::query_as::<_, PrincipalContext>(&update_sql)
                    .bind(principal_id)
                    .bind(row.context.clone())
                    .fetch_one(&mut **tx)
                    .await
                    .map_db_error("update", "principal_context")?
            }
            None => {
                let now = Utc::now();
                let insert_sql = format!(
                    "INSERT INTO principal_contexts ({}) \
                     VALUES ($1, $2, $3, $4, $4) RETURNING {}",
                    CONTEXT_COLUMNS, CONTEXT_COLUMNS
                );
                sqlx::query_as::<_, PrincipalContext>(&insert_sql)
                    .bind(Uuid::new_v4())
                    .bind(principal_id)
                    .bind(Json(patch.clone()))
                    .bind(now)
                    .fetch_one(&mut **tx)
                    .await
                    .map_db_error("create", "principal_context")?
            }
        };

        assert_eq!(
            row.principal_id, principal_id,
            "Merged principal context principal mismatch"
        );
        Ok(row)
    }
}

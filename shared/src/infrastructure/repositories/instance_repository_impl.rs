//! PostgreSQL implementation of the workflow-instance repository.
//!
//! Instance-level writes are sparse (`SET col = COALESCE(...)`) so
//! concurrent writers of sibling fields are never clobbered; the
//! global-context merge is a locked read-modify-write.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{WorkflowInstance, WorkflowState, WorkflowSummary};
use crate::domain::repositories::{InstanceRepository, PgTx};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::{AppError, AppResult};

const INSTANCE_COLUMNS: &str =
    "id, flow, principal_id, state, items, global_context, end_node_id, created_at, updated_at";

pub struct InstanceRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl InstanceRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl InstanceRepository for InstanceRepositoryImpl {
    async fn create(
        &self,
        tx: &mut PgTx<'_>,
        instance: &WorkflowInstance,
    ) -> AppResult<WorkflowInstance> {
        assert!(!instance.id.is_nil(), "Workflow ID must not be nil");
        assert!(!instance.principal_id.is_nil(), "Principal ID must not be nil");

        let sql = format!(
            "INSERT INTO workflows ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {}",
            INSTANCE_COLUMNS, INSTANCE_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkflowInstance>(&sql)
            .bind(instance.id)
            .bind(instance.flow)
            .bind(instance.principal_id)
            .bind(instance.state)
            .bind(instance.items.clone())
            .bind(instance.global_context.clone())
            .bind(instance.end_node_id)
            .bind(instance.created_at)
            .bind(instance.updated_at)
            .fetch_one(&mut **tx)
            .await
            .map_db_error("create", "workflow")?;

        assert_eq!(row.id, instance.id, "Created workflow ID mismatch");
        Ok(row)
    }

    async fn by_id(&self, id: Uuid) -> AppResult<Option<WorkflowInstance>> {
        let sql = format!("SELECT {} FROM workflows WHERE id = $1", INSTANCE_COLUMNS);
        sqlx::query_as::<_, WorkflowInstance>(&sql)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "workflow")
    }

    async fn by_id_in_tx(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
    ) -> AppResult<Option<WorkflowInstance>> {
        let sql = format!("SELECT {} FROM workflows WHERE id = $1", INSTANCE_COLUMNS);
        sqlx::query_as::<_, WorkflowInstance>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_db_error("fetch", "workflow")
    }

    async fn list_by_principal(
        &self,
        principal_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<WorkflowSummary>, i64)> {
        assert!(!principal_id.is_nil(), "Principal ID must not be nil");
        assert!(limit > 0, "Limit must be positive");

        let rows = sqlx::query_as::<_, WorkflowSummary>(
            "SELECT w.id, w.flow, w.principal_id, w.state, w.items, \
                    COUNT(n.id) AS workflow_node_count, \
                    COUNT(n.id) FILTER (WHERE n.state = 'COMPLETED') \
                        AS completed_workflow_node_count, \
                    w.created_at, w.updated_at \
             FROM workflows w \
             LEFT JOIN workflow_nodes n ON n.workflow_id = w.id \
             WHERE w.principal_id = $1 \
             GROUP BY w.id \
             ORDER BY w.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(principal_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.database_service.pool())
        .await
        .map_db_error("list", "workflows")?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM workflows WHERE principal_id = $1",
        )
        .bind(principal_id)
        .fetch_one(self.database_service.pool())
        .await
        .map_db_error("count", "workflows")?;

        Ok((rows, total))
    }

    async fn update_sparse(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
        state: Option<WorkflowState>,
        end_node_id: Option<Uuid>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE workflows SET \
                 state = COALESCE($2, state), \
                 end_node_id = COALESCE($3, end_node_id), \
                 updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(state)
        .bind(end_node_id)
        .execute(&mut **tx)
        .await
        .map_db_error("update", "workflow")?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Workflow {} not found", id)));
        }
        Ok(())
    }

    async fn append_global_context(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
        patch: &Map<String, Value>,
    ) -> AppResult<Map<String, Value>> {
        let current = sqlx::query_scalar::<_, Json<Map<String, Value>>>(
            "SELECT global_context FROM workflows WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_db_error("lock", "workflow")?
        .ok_or_else(|| AppError::NotFound(format!("Workflow {} not found", id)))?;

        let mut merged = current.0;
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }

        sqlx::query("UPDATE workflows SET global_context = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(Json(merged.clone()))
            .execute(&mut **tx)
            .await
            .map_db_error("update", "workflow")?;

        Ok(merged)
    }
}

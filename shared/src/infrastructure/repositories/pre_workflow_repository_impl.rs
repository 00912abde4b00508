//! PostgreSQL implementation of the pre-workflow repository.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{PreWorkflowInstance, PreWorkflowSummary, WorkflowState};
use crate::domain::repositories::{PgTx, PreWorkflowRepository};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::{AppError, AppResult};

const PRE_WORKFLOW_COLUMNS: &str = "id, pre_workflow_template_id, principal_id, state, \
     trader_context, end_node_id, created_at, updated_at";

pub struct PreWorkflowRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl PreWorkflowRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl PreWorkflowRepository for PreWorkflowRepositoryImpl {
    async fn create(
        &self,
        tx: &mut PgTx<'_>,
        instance: &PreWorkflowInstance,
    ) -> AppResult<PreWorkflowInstance> {
        assert!(!instance.id.is_nil(), "Pre-workflow ID must not be nil");
        assert!(!instance.principal_id.is_nil(), "Principal ID must not be nil");

        let sql = format!(
            "INSERT INTO pre_workflows ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            PRE_WORKFLOW_COLUMNS, PRE_WORKFLOW_COLUMNS
        );
        let row = sqlx::query_as::<_, PreWorkflowInstance>(&sql)
            .bind(instance.id)
            .bind(instance.pre_workflow_template_id)
            .bind(instance.principal_id)
            .bind(instance.state)
            .bind(instance.trader_context.clone())
            .bind(instance.end_node_id)
            .bind(instance.created_at)
            .bind(instance.updated_at)
            .fetch_one(&mut **tx)
            .await
            .map_db_error("create", "pre_workflow")?;

        assert_eq!(row.id, instance.id, "Created pre-workflow ID mismatch");
        Ok(row)
    }

    async fn by_id(&self, id: Uuid) -> AppResult<Option<PreWorkflowInstance>> {
        let sql = format!(
            "SELECT {} FROM pre_workflows WHERE id = $1",
            PRE_WORKFLOW_COLUMNS
        );
        sqlx::query_as::<_, PreWorkflowInstance>(&sql)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "pre_workflow")
    }

    async fn by_id_in_tx(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
    ) -> AppResult<Option<PreWorkflowInstance>> {
        let sql = format!(
            "SELECT {} FROM pre_workflows WHERE id = $1",
            PRE_WORKFLOW_COLUMNS
        );
        sqlx::query_as::<_, PreWorkflowInstance>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_db_error("fetch", "pre_workflow")
    }

    async fn list_by_principal(
        &self,
        principal_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<PreWorkflowSummary>, i64)> {
        assert!(!principal_id.is_nil(), "Principal ID must not be nil");
        assert!(limit > 0, "Limit must be positive");

        let rows = sqlx::query_as::<_, PreWorkflowSummary>(
            "SELECT p.id, p.pre_workflow_template_id, p.principal_id, p.state, \
                    COUNT(n.id) AS workflow_node_count, \
                    COUNT(n.id) FILTER (WHERE n.state = 'COMPLETED') \
                        AS completed_workflow_node_count, \
                    p.created_at, p.updated_at \
             FROM pre_workflows p \
             LEFT JOIN workflow_nodes n ON n.pre_workflow_id = p.id \
             WHERE p.principal_id = $1 \
             GROUP BY p.id \
             ORDER BY p.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(principal_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.database_service.pool())
        .await
        .map_db_error("list", "pre_workflows")?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM pre_workflows WHERE principal_id = $1",
        )
        .bind(principal_id)
        .fetch_one(self.database_service.pool())
        .await
        .map_db_error("count", "pre_workflows")?;

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
            "UPDATE pre_workflows SET \
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
        .map_db_error("update", "pre_workflow")?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Pre-workflow {} not found", id)));
        }
        Ok(())
    }

    async fn append_trader_context(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
        patch: &Map<String, Value>,
    ) -> AppResult<Map<String, Value>> {
        let current = sqlx::query_scalar::<_, Json<Map<String, Value>>>(
            "SELECT trader_context FROM pre_workflows WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_db_error("lock", "pre_workflow")?
        .ok_or_else(|| AppError::NotFound(format!("Pre-workflow {} not found", id)))?;

        let mut merged = current.0;
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }

        sqlx::query(
            "UPDATE pre_workflows SET trader_context = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(Json(merged.clone()))
        .execute(&mut **tx)
        .await
        .map_db_error("update", "pre_workflow")?;

        Ok(merged)
    }
}

//! PostgreSQL implementation of the read-only template lookups.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{
    NodeTemplate, PreWorkflowTemplate, TemplateMap, TradeFlow, WorkflowTemplate,
};
use crate::domain::repositories::TemplateRepository;
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::{AppError, AppResult};

const TEMPLATE_COLUMNS: &str = "id, name, description, version, node_template_ids, \
     end_node_template_id, created_at, updated_at";
const NODE_TEMPLATE_COLUMNS: &str =
    "id, name, node_type, config, depends_on, unlock_configuration, created_at, updated_at";

pub struct TemplateRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl TemplateRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl TemplateRepository for TemplateRepositoryImpl {
    async fn workflow_template_by_id(&self, id: Uuid) -> AppResult<Option<WorkflowTemplate>> {
        let sql = format!(
            "SELECT {} FROM workflow_templates WHERE id = $1",
            TEMPLATE_COLUMNS
        );
        sqlx::query_as::<_, WorkflowTemplate>(&sql)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "workflow_template")
    }

    async fn pre_workflow_template_by_id(
        &self,
        id: Uuid,
    ) -> AppResult<Option<PreWorkflowTemplate>> {
        let sql = format!(
            "SELECT {} FROM pre_workflow_templates WHERE id = $1",
            TEMPLATE_COLUMNS
        );
        sqlx::query_as::<_, PreWorkflowTemplate>(&sql)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "pre_workflow_template")
    }

    async fn node_templates_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<NodeTemplate>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {} FROM workflow_node_templates WHERE id = ANY($1)",
            NODE_TEMPLATE_COLUMNS
        );
        let rows = sqlx::query_as::<_, NodeTemplate>(&sql)
            .bind(ids)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("list", "workflow_node_templates")?;

        // Preserve the template's declared node order.
        let mut by_id: HashMap<Uuid, NodeTemplate> =
            rows.into_iter().map(|t| (t.id, t)).collect();
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            let template = by_id.remove(id).ok_or_else(|| {
                AppError::NotFound(format!("Node template {} not found", id))
            })?;
            ordered.push(template);
        }
        Ok(ordered)
    }

    async fn node_template_by_id(&self, id: Uuid) -> AppResult<Option<NodeTemplate>> {
        let sql = format!(
            "SELECT {} FROM workflow_node_templates WHERE id = $1",
            NODE_TEMPLATE_COLUMNS
        );
        sqlx::query_as::<_, NodeTemplate>(&sql)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "workflow_node_template")
    }

    async fn template_map_for(
        &self,
        goods_code_id: Uuid,
        flow: TradeFlow,
    ) -> AppResult<Option<TemplateMap>> {
        sqlx::query_as::<_, TemplateMap>(
            "SELECT id, goods_code_id, flow, workflow_template_id, created_at, updated_at \
             FROM workflow_template_maps \
             WHERE goods_code_id = $1 AND flow = $2",
        )
        .bind(goods_code_id)
        .bind(flow)
        .fetch_optional(self.database_service.pool())
        .await
        .map_db_error("fetch", "workflow_template_map")
    }
}

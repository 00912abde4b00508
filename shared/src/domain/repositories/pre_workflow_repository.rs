//! Pre-Workflow Instance Repository Trait

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::PgTx;
use crate::domain::entities::{PreWorkflowInstance, PreWorkflowSummary, WorkflowState};
use crate::shared::AppResult;

#[async_trait]
pub trait PreWorkflowRepository: Send + Sync {
    async fn create(
        &self,
        tx: &mut PgTx<'_>,
        instance: &PreWorkflowInstance,
    ) -> AppResult<PreWorkflowInstance>;

    async fn by_id(&self, id: Uuid) -> AppResult<Option<PreWorkflowInstance>>;

    async fn by_id_in_tx(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
    ) -> AppResult<Option<PreWorkflowInstance>>;

    async fn list_by_principal(
        &self,
        principal_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<PreWorkflowSummary>, i64)>;

    async fn update_sparse(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
        state: Option<WorkflowState>,
        end_node_id: Option<Uuid>,
    ) -> AppResult<()>;

    /// Locked read-modify-write of `trader_context`.
    async fn append_trader_context(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
        patch: &Map<String, Value>,
    ) -> AppResult<Map<String, Value>>;
}

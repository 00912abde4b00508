//! Workflow Instance Repository Trait

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::PgTx;
use crate::domain::entities::{WorkflowInstance, WorkflowState, WorkflowSummary};
use crate::shared::AppResult;

#[async_trait]
pub trait InstanceRepository: Send + Sync {
    async fn create(
        &self,
        tx: &mut PgTx<'_>,
        instance: &WorkflowInstance,
    ) -> AppResult<WorkflowInstance>;

    async fn by_id(&self, id: Uuid) -> AppResult<Option<WorkflowInstance>>;

    async fn by_id_in_tx(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
    ) -> AppResult<Option<WorkflowInstance>>;

    /// Paginated summaries plus total count for one principal.
    async fn list_by_principal(
        &self,
        principal_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<WorkflowSummary>, i64)>;

    /// Sparse update: only the supplied columns are written, so
    /// concurrent sibling-field writers are not clobbered.
    async fn update_sparse(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
        state: Option<WorkflowState>,
        end_node_id: Option<Uuid>,
    ) -> AppResult<()>;

    /// Locked read-modify-write of `global_context`: merge the patch
    /// (per-key overwrite) and return the merged map.
    async fn append_global_context(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
        patch: &Map<String, Value>,
    ) -> AppResult<Map<String, Value>>;
}

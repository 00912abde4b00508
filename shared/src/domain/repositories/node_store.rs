//! Node Store Trait
//!
//! Transactional persistence contract for workflow nodes. Every method
//! runs inside the caller's transaction so one request is one envelope.

use async_trait::async_trait;
use uuid::Uuid;

use super::PgTx;
use crate::domain::entities::{NodeParent, WorkflowNode};
use crate::shared::AppResult;

#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Persist a batch of freshly instantiated nodes.
    async fn create_nodes(
        &self,
        tx: &mut PgTx<'_>,
        nodes: &[WorkflowNode],
    ) -> AppResult<Vec<WorkflowNode>>;

    /// Persist updated nodes. Each row is selected `FOR UPDATE` by
    /// primary key before writing; the caller must sort its input by
    /// node id ascending (byte order) so concurrent propagations take
    /// row locks in one global order.
    async fn update_nodes(&self, tx: &mut PgTx<'_>, nodes: &[WorkflowNode]) -> AppResult<()>;

    async fn node_by_id(&self, tx: &mut PgTx<'_>, id: Uuid) -> AppResult<Option<WorkflowNode>>;

    /// Plain pool read for request-scoped lookups outside the engine's
    /// transactional envelope.
    async fn find_node(&self, id: Uuid) -> AppResult<Option<WorkflowNode>>;

    /// Plain pool read of a parent's full node set.
    async fn nodes_by_parent(&self, parent: NodeParent) -> AppResult<Vec<WorkflowNode>>;

    /// Like `node_by_id` but takes the row lock.
    async fn node_by_id_for_update(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
    ) -> AppResult<Option<WorkflowNode>>;

    /// All nodes sharing the given node's parent, the node included.
    async fn siblings_of_node(
        &self,
        tx: &mut PgTx<'_>,
        node: &WorkflowNode,
    ) -> AppResult<Vec<WorkflowNode>>;

    async fn count_incomplete_siblings(
        &self,
        tx: &mut PgTx<'_>,
        parent: NodeParent,
    ) -> AppResult<i64>;
}

//! PostgreSQL implementation of the node Store.
//!
//! `update_nodes` locks each row `FOR UPDATE` by primary key before
//! writing; callers pass batches sorted ascending by node id so
//! concurrent propagations take row locks in one global order.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{NodeParent, NodeState, WorkflowNode};
use crate::domain::repositories::{NodeStore, PgTx};
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

const NODE_COLUMNS: &str = "id, workflow_id, pre_workflow_id, node_template_id, state, \
     extended_state, outcome, depends_on, unlock_configuration, local_store, \
     created_at, updated_at";

pub struct NodeStoreImpl {
    database_service: Arc<DatabaseService>,
}

impl NodeStoreImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl NodeStore for NodeStoreImpl {
    async fn create_nodes(
        &self,
        tx: &mut PgTx<'_>,
        nodes: &[WorkflowNode],
    ) -> AppResult<Vec<WorkflowNode>> {
        let sql = format!(
            "INSERT INTO workflow_nodes ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {}",
            NODE_COLUMNS, NODE_COLUMNS
        );

        let mut created = Vec::with_capacity(nodes.len());
        for node in nodes {
            assert!(!node.id.is_nil(), "Node ID must not be nil");
            assert!(
                node.workflow_id.is_some() != node.pre_workflow_id.is_some(),
                "Node must have exactly one parent"
            );

            let row = sqlx::query_as::<_, WorkflowNode>(&sql)
                .bind(node.id)
                .bind(node.workflow_id)
                .bind(node.pre_workflow_id)
                .bind(node.node_template_id)
                .bind(node.state)
                .bind(&node.extended_state)
                .bind(&node.outcome)
                .bind(node.depends_on.clone())
                .bind(node.unlock_configuration.clone())
                .bind(node.local_store.clone())
                .bind(node.created_at)
                .bind(node.updated_at)
                .fetch_one(&mut **tx)
                .await
                .map_db_error("create", "workflow_node")?;

            assert_eq!(row.id, node.id, "Created node ID mismatch");
            created.push(row);
        }
        Ok(created)
    }

    async fn update_nodes(&self, tx: &mut PgTx<'_>, nodes: &[WorkflowNode]) -> AppResult<()> {
        assert!(
            nodes.windows(2).all(|pair| pair[0].id <= pair[1].id),
            "update_nodes input must be sorted by node id"
        );

        for node in nodes {
            // Take the row lock first; the deadlock-free order is the
            // caller's sorted input.
            sqlx::query("SELECT id FROM workflow_nodes WHERE id = $1 FOR UPDATE")
                .bind(node.id)
                .execute(&mut **tx)
                .await
                .map_db_error("lock", "workflow_node")?;

            let result = sqlx::query(
                "UPDATE workflow_nodes SET \
                     state = $2, extended_state = $3, outcome = $4, \
                     depends_on = $5, unlock_configuration = $6, \
                     local_store = $7, updated_at = $8 \
                 WHERE id = $1",
            )
            .bind(node.id)
            .bind(node.state)
            .bind(&node.extended_state)
            .bind(&node.outcome)
            .bind(node.depends_on.clone())
            .bind(node.unlock_configuration.clone())
            .bind(node.local_store.clone())
            .bind(node.updated_at)
            .execute(&mut **tx)
            .await
            .map_db_error("update", "workflow_node")?;

            assert_eq!(
                result.rows_affected(),
                1,
                "Node update affected unexpected row count"
            );
        }
        Ok(())
    }

    async fn node_by_id(&self, tx: &mut PgTx<'_>, id: Uuid) -> AppResult<Option<WorkflowNode>> {
        let sql = format!("SELECT {} FROM workflow_nodes WHERE id = $1", NODE_COLUMNS);
        sqlx::query_as::<_, WorkflowNode>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_db_error("fetch", "workflow_node")
    }

    async fn node_by_id_for_update(
        &self,
        tx: &mut PgTx<'_>,
        id: Uuid,
    ) -> AppResult<Option<WorkflowNode>> {
        let sql = format!(
            "SELECT {} FROM workflow_nodes WHERE id = $1 FOR UPDATE",
            NODE_COLUMNS
        );
        sqlx::query_as::<_, WorkflowNode>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_db_error("lock", "workflow_node")
    }

    async fn find_node(&self, id: Uuid) -> AppResult<Option<WorkflowNode>> {
        let sql = format!("SELECT {} FROM workflow_nodes WHERE id = $1", NODE_COLUMNS);
        sqlx::query_as::<_, WorkflowNode>(&sql)
            .bind(id)
            .fetch_optional(self.database_service.pool())
            .await
            .map_db_error("fetch", "workflow_node")
    }

    async fn nodes_by_parent(&self, parent: NodeParent) -> AppResult<Vec<WorkflowNode>> {
        let (column, parent_id) = parent_column(parent);
        let sql = format!(
            "SELECT {} FROM workflow_nodes WHERE {} = $1 ORDER BY created_at, id",
            NODE_COLUMNS, column
        );
        sqlx::query_as::<_, WorkflowNode>(&sql)
            .bind(parent_id)
            .fetch_all(self.database_service.pool())
            .await
            .map_db_error("list", "workflow_nodes")
    }

    async fn siblings_of_node(
        &self,
        tx: &mut PgTx<'_>,
        node: &WorkflowNode,
    ) -> AppResult<Vec<WorkflowNode>> {
        let (column, parent_id) = parent_column(node.parent()?);
        let sql = format!(
            "SELECT {} FROM workflow_nodes WHERE {} = $1 ORDER BY created_at, id",
            NODE_COLUMNS, column
        );
        sqlx::query_as::<_, WorkflowNode>(&sql)
            .bind(parent_id)
            .fetch_all(&mut **tx)
            .await
            .map_db_error("list", "workflow_nodes")
    }

    async fn count_incomplete_siblings(
        &self,
        tx: &mut PgTx<'_>,
        parent: NodeParent,
    ) -> AppResult<i64> {
        let (column, parent_id) = parent_column(parent);
        let sql = format!(
            "SELECT COUNT(*) FROM workflow_nodes WHERE {} = $1 AND state <> $2",
            column
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(parent_id)
            .bind(NodeState::Completed)
            .fetch_one(&mut **tx)
            .await
            .map_db_error("count", "workflow_nodes")?;
        assert!(count >= 0, "Count should be non-negative");
        Ok(count)
    }
}

fn parent_column(parent: NodeParent) -> (&'static str, Uuid) {
    match parent {
        NodeParent::Workflow(id) => ("workflow_id", id),
        NodeParent::PreWorkflow(id) => ("pre_workflow_id", id),
    }
}

//! Pre-workflow service: one-time registrations whose accumulated
//! context outlives the instance. Structurally the workflow service's
//! twin, except completion of the last node merges the trader context
//! into the principal's persistent context row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use crate::application::plugins::{
    ExecuteOutcome, ExecuteRequest, NodePlugin, ParentContext, PluginContainer, RenderInfo,
};
use crate::application::services::instantiation::{instantiate_nodes, ParentRef};
use crate::application::services::propagation::CompletionStamp;
use crate::application::services::workflow_service::{
    NodeStateUpdate, UpdateNodeStateRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use crate::application::services::{plugin_fsm_for, EngineDeps};
use crate::domain::entities::{
    NodeParent, NodeState, PreWorkflowInstance, PreWorkflowSummary, WorkflowNode, WorkflowState,
};
use crate::shared::{AppError, AppResult};

/// Body of `POST /pre-workflows`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreWorkflowRequest {
    pub template_id: Uuid,
}

pub struct PreWorkflowService {
    deps: EngineDeps,
}

impl PreWorkflowService {
    pub fn new(deps: EngineDeps) -> Self {
        Self { deps }
    }

    pub async fn create_pre_workflow(
        &self,
        req: &CreatePreWorkflowRequest,
        principal_id: Uuid,
        initial_context: Map<String, Value>,
    ) -> AppResult<(PreWorkflowInstance, Vec<WorkflowNode>)> {
        let template = self
            .deps
            .templates
            .pre_workflow_template_by_id(req.template_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Pre-workflow template {} not found",
                    req.template_id
                ))
            })?;
        let node_templates = self
            .deps
            .templates
            .node_templates_by_ids(&template.node_template_ids.0)
            .await?;

        let now = Utc::now();
        let mut instance = PreWorkflowInstance {
            id: Uuid::new_v4(),
            pre_workflow_template_id: template.id,
            principal_id,
            state: WorkflowState::InProgress,
            trader_context: Json(initial_context),
            end_node_id: None,
            created_at: now,
            updated_at: now,
        };

        let instantiated = instantiate_nodes(
            &node_templates,
            template.end_node_template_id,
            ParentRef::PreWorkflow(instance.id),
            now,
        )?;

        let mut tx = self.deps.db.pool().begin().await.map_err(AppError::from)?;
        self.deps.pre_workflows.create(&mut tx, &instance).await?;
        let nodes = self
            .deps
            .store
            .create_nodes(&mut tx, &instantiated.nodes)
            .await?;
        if let Some(end_node_id) = instantiated.end_node_id {
            self.deps
                .pre_workflows
                .update_sparse(&mut tx, instance.id, None, Some(end_node_id))
                .await?;
            instance.end_node_id = Some(end_node_id);
        }
        tx.commit().await.map_err(AppError::from)?;

        info!(
            pre_workflow_id = %instance.id,
            nodes = nodes.len(),
            "Pre-workflow instantiated"
        );
        Ok((instance, nodes))
    }

    pub async fn get_pre_workflow(
        &self,
        id: Uuid,
    ) -> AppResult<(PreWorkflowInstance, Vec<WorkflowNode>)> {
        let instance = self
            .deps
            .pre_workflows
            .by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pre-workflow {} not found", id)))?;
        let nodes = self
            .deps
            .store
            .nodes_by_parent(NodeParent::PreWorkflow(id))
            .await?;
        Ok((instance, nodes))
    }

    pub async fn list_pre_workflows(
        &self,
        principal_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<(Vec<PreWorkflowSummary>, i64, i64, i64)> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        let (items, total) = self
            .deps
            .pre_workflows
            .list_by_principal(principal_id, limit, offset)
            .await?;
        Ok((items, total, offset, limit))
    }

    /// Direct node-state update. On termination the trader context is
    /// synced into the principal's persistent row in the same envelope.
    pub async fn update_node_state(
        &self,
        pre_workflow_id: Uuid,
        node_id: Uuid,
        req: &UpdateNodeStateRequest,
    ) -> AppResult<NodeStateUpdate> {
        let mut tx = self.deps.db.pool().begin().await.map_err(AppError::from)?;
        let instance = self
            .deps
            .pre_workflows
            .by_id_in_tx(&mut tx, pre_workflow_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Pre-workflow {} not found", pre_workflow_id))
            })?;
        let node = self
            .deps
            .store
            .node_by_id(&mut tx, node_id)
            .await?
            .filter(|n| n.pre_workflow_id == Some(pre_workflow_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Node {} not found in pre-workflow {}",
                    node_id, pre_workflow_id
                ))
            })?;

        let mut new_ready = Vec::new();
        let mut workflow_finished = false;
        let node = match req.state {
            NodeState::Completed => {
                let result = self
                    .deps
                    .propagator
                    .to_completed(
                        &mut tx,
                        node.id,
                        CompletionStamp {
                            extended_state: req.extended_state.clone(),
                            outcome: req.outcome.clone(),
                        },
                        instance.end_node_id,
                    )
                    .await?;
                new_ready = result.new_ready;
                workflow_finished = result.workflow_finished;
                result.node
            }
            NodeState::InProgress => {
                self.deps
                    .propagator
                    .to_in_progress(&mut tx, node.id, req.extended_state.clone())
                    .await?
            }
            NodeState::Failed => {
                self.deps
                    .propagator
                    .to_failed(&mut tx, node.id, req.extended_state.clone(), req.outcome.clone())
                    .await?
            }
            other => {
                return Err(AppError::Validation(format!(
                    "Unsupported target node state: {}",
                    other
                )))
            }
        };

        let trader_context = match &req.append_global_context {
            Some(patch) if !patch.is_empty() => {
                self.deps
                    .pre_workflows
                    .append_trader_context(&mut tx, pre_workflow_id, patch)
                    .await?
            }
            _ => instance.trader_context.0.clone(),
        };

        if workflow_finished {
            // Without a designated end node, termination means every
            // node completed.
            if instance.end_node_id.is_none() {
                let incomplete = self
                    .deps
                    .store
                    .count_incomplete_siblings(&mut tx, NodeParent::PreWorkflow(pre_workflow_id))
                    .await?;
                if incomplete > 0 {
                    return Err(AppError::Internal(format!(
                        "Pre-workflow {} finished with {} incomplete nodes",
                        pre_workflow_id, incomplete
                    )));
                }
            }
            self.deps
                .pre_workflows
                .update_sparse(&mut tx, pre_workflow_id, Some(WorkflowState::Finished), None)
                .await?;
            self.deps
                .principal_contexts
                .merge(&mut tx, instance.principal_id, &trader_context)
                .await?;
        }

        tx.commit().await.map_err(AppError::from)?;

        Ok(NodeStateUpdate {
            node,
            new_ready,
            workflow_finished,
            global_context: trader_context,
        })
    }

    pub async fn execute_node(
        &self,
        pre_workflow_id: Uuid,
        node_id: Uuid,
        req: &ExecuteRequest,
    ) -> AppResult<ExecuteOutcome> {
        let (mut container, mut plugin) = self.materialize(pre_workflow_id, node_id).await?;
        if container.get_task_state() == NodeState::Locked {
            return Err(AppError::Validation(format!(
                "Node {} is still locked",
                node_id
            )));
        }
        plugin.execute(&mut container, req).await
    }

    pub async fn render_node(
        &self,
        pre_workflow_id: Uuid,
        node_id: Uuid,
    ) -> AppResult<RenderInfo> {
        let (mut container, mut plugin) = self.materialize(pre_workflow_id, node_id).await?;
        plugin.get_render_info(&mut container).await
    }

    async fn materialize(
        &self,
        pre_workflow_id: Uuid,
        node_id: Uuid,
    ) -> AppResult<(PluginContainer, NodePlugin)> {
        let instance = self
            .deps
            .pre_workflows
            .by_id(pre_workflow_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Pre-workflow {} not found", pre_workflow_id))
            })?;
        let node = self
            .deps
            .store
            .find_node(node_id)
            .await?
            .filter(|n| n.pre_workflow_id == Some(pre_workflow_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Node {} not found in pre-workflow {}",
                    node_id, pre_workflow_id
                ))
            })?;
        let template = self
            .deps
            .templates
            .node_template_by_id(node.node_template_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Node template {} not found", node.node_template_id))
            })?;

        let plugin = NodePlugin::for_template(&template)?;
        let container = PluginContainer::new(
            node,
            ParentContext::PreWorkflow(instance),
            plugin_fsm_for(template.node_type),
            self.deps.clone(),
        );
        Ok((container, plugin))
    }
}

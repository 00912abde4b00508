//! Workflow service: instantiate consignment workflows from templates,
//! update node state, drive per-node plugins and surface newly-Ready
//! siblings for downstream wake-up.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::plugins::{
    ExecuteOutcome, ExecuteRequest, NodePlugin, ParentContext, PluginContainer, RenderInfo,
};
use crate::application::services::instantiation::{instantiate_nodes, ParentRef};
use crate::application::services::propagation::CompletionStamp;
use crate::application::services::{plugin_fsm_for, EngineDeps};
use crate::domain::entities::{
    ConsignmentItem, NodeParent, NodeState, NodeTemplate, TradeFlow, WorkflowInstance,
    WorkflowNode, WorkflowState, WorkflowSummary,
};
use crate::shared::{AppError, AppResult};

/// Pagination bounds for workflow listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Body of `POST /workflows`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    pub flow: TradeFlow,
    pub items: Vec<ConsignmentItem>,
}

/// Direct node-state update: dispatched to the matching transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeStateRequest {
    pub state: NodeState,
    #[serde(default)]
    pub extended_state: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub append_global_context: Option<Map<String, Value>>,
}

/// What a node-state update changed.
#[derive(Debug)]
pub struct NodeStateUpdate {
    pub node: WorkflowNode,
    pub new_ready: Vec<WorkflowNode>,
    pub workflow_finished: bool,
    pub global_context: Map<String, Value>,
}

/// Hook run before the creation transaction commits; an error rolls the
/// whole instantiation back.
pub type PreCommitValidation =
    Arc<dyn Fn(&[WorkflowNode], &Map<String, Value>) -> AppResult<()> + Send + Sync>;

pub struct WorkflowService {
    deps: EngineDeps,
    pre_commit_validation: Option<PreCommitValidation>,
}

impl WorkflowService {
    pub fn new(deps: EngineDeps) -> Self {
        Self {
            deps,
            pre_commit_validation: None,
        }
    }

    pub fn with_pre_commit_validation(mut self, hook: PreCommitValidation) -> Self {
        self.pre_commit_validation = Some(hook);
        self
    }

    /// Instantiate a workflow for a consignment: resolve each item's
    /// template through the TemplateMap, persist the instance and its
    /// node set in one transaction and return the initially Ready nodes.
    pub async fn create_workflow(
        &self,
        req: &CreateWorkflowRequest,
        principal_id: Uuid,
        initial_context: Map<String, Value>,
    ) -> AppResult<(WorkflowInstance, Vec<WorkflowNode>)> {
        if req.items.is_empty() {
            return Err(AppError::Validation(
                "A workflow needs at least one item".to_string(),
            ));
        }

        // Resolve templates before opening the envelope; they are
        // read-only reference data.
        let mut template_ids = Vec::new();
        for item in &req.items {
            let mapping = self
                .deps
                .templates
                .template_map_for(item.goods_code_id, req.flow)
                .await?
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "No {} workflow template for goods code {}",
                        req.flow, item.goods_code_id
                    ))
                })?;
            if !template_ids.contains(&mapping.workflow_template_id) {
                template_ids.push(mapping.workflow_template_id);
            }
        }

        let mut node_templates: Vec<NodeTemplate> = Vec::new();
        let mut seen_nodes = HashSet::new();
        let mut end_node_template_id = None;
        for template_id in &template_ids {
            let template = self
                .deps
                .templates
                .workflow_template_by_id(*template_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Workflow template {} not found", template_id))
                })?;
            for node_template in self
                .deps
                .templates
                .node_templates_by_ids(&template.node_template_ids.0)
                .await?
            {
                if seen_nodes.insert(node_template.id) {
                    node_templates.push(node_template);
                }
            }
            if end_node_template_id.is_none() {
                end_node_template_id = template.end_node_template_id;
            }
        }

        let now = Utc::now();
        let mut instance = WorkflowInstance {
            id: Uuid::new_v4(),
            flow: req.flow,
            principal_id,
            state: WorkflowState::InProgress,
            items: Json(req.items.clone()),
            global_context: Json(initial_context),
            end_node_id: None,
            created_at: now,
            updated_at: now,
        };

        let instantiated = instantiate_nodes(
            &node_templates,
            end_node_template_id,
            ParentRef::Workflow(instance.id),
            now,
        )?;

        let mut tx = self.deps.db.pool().begin().await.map_err(AppError::from)?;
        self.deps.instances.create(&mut tx, &instance).await?;
        let nodes = self
            .deps
            .store
            .create_nodes(&mut tx, &instantiated.nodes)
            .await?;
        if let Some(end_node_id) = instantiated.end_node_id {
            self.deps
                .instances
                .update_sparse(&mut tx, instance.id, None, Some(end_node_id))
                .await?;
            instance.end_node_id = Some(end_node_id);
        }

        let ready: Vec<WorkflowNode> = nodes
            .iter()
            .filter(|n| n.state == NodeState::Ready)
            .cloned()
            .collect();
        if let Some(hook) = &self.pre_commit_validation {
            // An error here rolls the whole envelope back.
            hook(&ready, &instance.global_context.0)?;
        }
        tx.commit().await.map_err(AppError::from)?;

        info!(
            workflow_id = %instance.id,
            nodes = nodes.len(),
            ready = ready.len(),
            "Workflow instantiated"
        );
        Ok((instance, nodes))
    }

    pub async fn get_workflow(
        &self,
        id: Uuid,
    ) -> AppResult<(WorkflowInstance, Vec<WorkflowNode>)> {
        let instance = self
            .deps
            .instances
            .by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow {} not found", id)))?;
        let nodes = self
            .deps
            .store
            .nodes_by_parent(NodeParent::Workflow(id))
            .await?;
        Ok((instance, nodes))
    }

    pub async fn list_workflows(
        &self,
        principal_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<(Vec<WorkflowSummary>, i64, i64, i64)> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        let (items, total) = self
            .deps
            .instances
            .list_by_principal(principal_id, limit, offset)
            .await?;
        Ok((items, total, offset, limit))
    }

    /// Sparse instance update: state and/or appended context.
    pub async fn patch_workflow(
        &self,
        id: Uuid,
        state: Option<WorkflowState>,
        append_to_global_context: Option<Map<String, Value>>,
    ) -> AppResult<WorkflowInstance> {
        let mut tx = self.deps.db.pool().begin().await.map_err(AppError::from)?;
        let mut instance = self
            .deps
            .instances
            .by_id_in_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow {} not found", id)))?;

        if let Some(state) = state {
            self.deps
                .instances
                .update_sparse(&mut tx, id, Some(state), None)
                .await?;
            instance.state = state;
        }
        if let Some(patch) = append_to_global_context {
            let merged = self
                .deps
                .instances
                .append_global_context(&mut tx, id, &patch)
                .await?;
            instance.global_context = Json(merged);
        }
        tx.commit().await.map_err(AppError::from)?;
        Ok(instance)
    }

    /// Dispatch a direct node-state update; completion propagates and
    /// may finish the workflow in the same transaction.
    pub async fn update_node_state(
        &self,
        workflow_id: Uuid,
        node_id: Uuid,
        req: &UpdateNodeStateRequest,
    ) -> AppResult<NodeStateUpdate> {
        let mut tx = self.deps.db.pool().begin().await.map_err(AppError::from)?;
        let instance = self
            .deps
            .instances
            .by_id_in_tx(&mut tx, workflow_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow {} not found", workflow_id)))?;
        let node = self
            .deps
            .store
            .node_by_id(&mut tx, node_id)
            .await?
            .filter(|n| n.workflow_id == Some(workflow_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Node {} not found in workflow {}",
                    node_id, workflow_id
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

        if workflow_finished {
            self.deps
                .instances
                .update_sparse(&mut tx, workflow_id, Some(WorkflowState::Finished), None)
                .await?;
        }

        let global_context = match &req.append_global_context {
            Some(patch) if !patch.is_empty() => {
                self.deps
                    .instances
                    .append_global_context(&mut tx, workflow_id, patch)
                    .await?
            }
            _ => instance.global_context.0.clone(),
        };

        tx.commit().await.map_err(AppError::from)?;

        Ok(NodeStateUpdate {
            node,
            new_ready,
            workflow_finished,
            global_context,
        })
    }

    /// Route an execute request to the node's plugin container.
    pub async fn execute_node(
        &self,
        workflow_id: Uuid,
        node_id: Uuid,
        req: &ExecuteRequest,
    ) -> AppResult<ExecuteOutcome> {
        let (mut container, mut plugin) = self.materialize(workflow_id, node_id).await?;
        if container.get_task_state() == NodeState::Locked {
            return Err(AppError::Validation(format!(
                "Node {} is still locked",
                node_id
            )));
        }
        plugin.execute(&mut container, req).await
    }

    pub async fn render_node(&self, workflow_id: Uuid, node_id: Uuid) -> AppResult<RenderInfo> {
        let (mut container, mut plugin) = self.materialize(workflow_id, node_id).await?;
        plugin.get_render_info(&mut container).await
    }

    async fn materialize(
        &self,
        workflow_id: Uuid,
        node_id: Uuid,
    ) -> AppResult<(PluginContainer, NodePlugin)> {
        let instance = self
            .deps
            .instances
            .by_id(workflow_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workflow {} not found", workflow_id)))?;
        let node = self
            .deps
            .store
            .find_node(node_id)
            .await?
            .filter(|n| n.workflow_id == Some(workflow_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Node {} not found in workflow {}",
                    node_id, workflow_id
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
            ParentContext::Workflow(instance),
            plugin_fsm_for(template.node_type),
            self.deps.clone(),
        );
        Ok((container, plugin))
    }
}

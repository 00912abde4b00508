//! Plugin container: the per-node runtime context.
//!
//! The container owns the plugin FSM table and is the only object
//! through which a plugin reaches persistent state. `transition_with`
//! persists the plugin state, the node state, the global-context patch
//! and parent termination in one transactional envelope.

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::propagation::{CompletionStamp, NodePropagator};
use crate::domain::entities::{
    FormDefinition, NodeState, PreWorkflowInstance, WorkflowInstance, WorkflowNode, WorkflowState,
};
use crate::domain::repositories::{
    FormRepository, InstanceRepository, NodeStore, PreWorkflowRepository,
    PrincipalContextRepository, TemplateRepository,
};
use crate::domain::state_machine::{PluginFsm, PLUGIN_STATE_INITIAL};
use crate::infrastructure::database::DatabaseService;
use crate::shared::{AppError, AppResult};

/// Shared engine collaborators handed to containers and services.
#[derive(Clone)]
pub struct EngineDeps {
    pub db: Arc<DatabaseService>,
    pub store: Arc<dyn NodeStore>,
    pub propagator: Arc<NodePropagator>,
    pub instances: Arc<dyn InstanceRepository>,
    pub pre_workflows: Arc<dyn PreWorkflowRepository>,
    pub principal_contexts: Arc<dyn PrincipalContextRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub forms: Arc<dyn FormRepository>,
    /// Shared client for inline form submissions (30 s timeout).
    pub http: reqwest::Client,
    /// Externally reachable base URL of this service.
    pub public_url: String,
}

/// The node's parent instance, with its context snapshot.
#[derive(Debug, Clone)]
pub enum ParentContext {
    Workflow(WorkflowInstance),
    PreWorkflow(PreWorkflowInstance),
}

impl ParentContext {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Workflow(instance) => instance.id,
            Self::PreWorkflow(instance) => instance.id,
        }
    }

    pub fn end_node_id(&self) -> Option<Uuid> {
        match self {
            Self::Workflow(instance) => instance.end_node_id,
            Self::PreWorkflow(instance) => instance.end_node_id,
        }
    }

    pub fn context(&self) -> &Map<String, Value> {
        match self {
            Self::Workflow(instance) => &instance.global_context.0,
            Self::PreWorkflow(instance) => &instance.trader_context.0,
        }
    }
}

/// What one container transition changed.
#[derive(Debug, Clone)]
pub struct TransitionReport {
    pub plugin_state: String,
    pub node_state: NodeState,
    pub new_ready_node_ids: Vec<Uuid>,
    pub workflow_finished: bool,
}

pub struct PluginContainer {
    node: WorkflowNode,
    parent: ParentContext,
    fsm: PluginFsm,
    deps: EngineDeps,
}

impl PluginContainer {
    pub fn new(node: WorkflowNode, parent: ParentContext, fsm: PluginFsm, deps: EngineDeps) -> Self {
        Self {
            node,
            parent,
            fsm,
            deps,
        }
    }

    // ------------------------------------------------------------------
    // Identity and state accessors
    // ------------------------------------------------------------------

    pub fn task_id(&self) -> Uuid {
        self.node.id
    }

    /// Id of the owning workflow or pre-workflow instance.
    pub fn workflow_id(&self) -> Uuid {
        self.parent.id()
    }

    pub fn get_task_state(&self) -> NodeState {
        self.node.state
    }

    pub fn get_plugin_state(&self) -> String {
        self.node
            .extended_state
            .clone()
            .unwrap_or_else(|| PLUGIN_STATE_INITIAL.to_string())
    }

    pub fn node(&self) -> &WorkflowNode {
        &self.node
    }

    // ------------------------------------------------------------------
    // Store mediation
    // ------------------------------------------------------------------

    pub fn read_from_global_store(&self, key: &str) -> Option<&Value> {
        self.parent.context().get(key)
    }

    pub fn global_context(&self) -> &Map<String, Value> {
        self.parent.context()
    }

    pub fn read_from_local_store(&self, key: &str) -> Option<&Value> {
        self.node.local_store.0.get(key)
    }

    /// Stage a local-store write; persisted by the next transition.
    pub fn write_to_local_store(&mut self, key: &str, value: Value) {
        self.node.local_store.0.insert(key.to_string(), value);
    }

    /// Read-only form lookup from the schema registry.
    pub async fn get_form_definition(&self, form_id: Uuid) -> AppResult<FormDefinition> {
        self.deps
            .forms
            .form_by_id(form_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Form {} not found", form_id)))
    }

    /// Shared submission HTTP client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.deps.http
    }

    /// This service's externally reachable base URL.
    pub fn service_url(&self) -> &str {
        &self.deps.public_url
    }

    // ------------------------------------------------------------------
    // FSM transitions
    // ------------------------------------------------------------------

    /// Pure table lookup for the current plugin state.
    pub fn can_transition(&self, action: &str) -> bool {
        self.fsm.can_transition(&self.get_plugin_state(), action)
    }

    pub async fn transition(&mut self, action: &str) -> AppResult<TransitionReport> {
        self.transition_with(action, None, Map::new()).await
    }

    /// Take an FSM edge: atomically persist the new plugin state, the
    /// staged local store, any node-state side effect (propagating on
    /// completion), the global-context patch, and parent termination.
    pub async fn transition_with(
        &mut self,
        action: &str,
        outcome: Option<String>,
        global_patch: Map<String, Value>,
    ) -> AppResult<TransitionReport> {
        let from = self.get_plugin_state();
        let edge = self.fsm.resolve(&from, action)?.clone();
        let end_node_id = self.parent.end_node_id();

        let mut tx = self.deps.db.pool().begin().await.map_err(AppError::from)?;

        // Persist the staged local store under the row lock; node-state
        // writes below reuse the same lock.
        let mut locked = self
            .deps
            .store
            .node_by_id_for_update(&mut tx, self.node.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Node {} not found", self.node.id)))?;
        locked.local_store = self.node.local_store.clone();
        if edge.node_state.is_none() {
            locked.extended_state = Some(edge.plugin_state.clone());
        }
        locked.updated_at = Utc::now();
        self.deps
            .store
            .update_nodes(&mut tx, std::slice::from_ref(&locked))
            .await?;

        let mut new_ready_node_ids = Vec::new();
        let mut workflow_finished = false;
        let updated_node = match edge.node_state {
            None => locked,
            Some(NodeState::Completed) => {
                let result = self
                    .deps
                    .propagator
                    .to_completed(
                        &mut tx,
                        self.node.id,
                        CompletionStamp {
                            extended_state: Some(edge.plugin_state.clone()),
                            outcome,
                        },
                        end_node_id,
                    )
                    .await?;
                new_ready_node_ids = result.new_ready.iter().map(|n| n.id).collect();
                workflow_finished = result.workflow_finished;
                result.node
            }
            Some(NodeState::InProgress) => {
                self.deps
                    .propagator
                    .to_in_progress(&mut tx, self.node.id, Some(edge.plugin_state.clone()))
                    .await?
            }
            Some(NodeState::Failed) => {
                self.deps
                    .propagator
                    .to_failed(&mut tx, self.node.id, Some(edge.plugin_state.clone()), outcome)
                    .await?
            }
            Some(other) => {
                return Err(AppError::Internal(format!(
                    "Plugin FSM may not move a node to {}",
                    other
                )))
            }
        };

        if !global_patch.is_empty() {
            match &mut self.parent {
                ParentContext::Workflow(instance) => {
                    let merged = self
                        .deps
                        .instances
                        .append_global_context(&mut tx, instance.id, &global_patch)
                        .await?;
                    instance.global_context = Json(merged);
                }
                ParentContext::PreWorkflow(instance) => {
                    let merged = self
                        .deps
                        .pre_workflows
                        .append_trader_context(&mut tx, instance.id, &global_patch)
                        .await?;
                    instance.trader_context = Json(merged);
                }
            }
        }

        if workflow_finished {
            match &mut self.parent {
                ParentContext::Workflow(instance) => {
                    self.deps
                        .instances
                        .update_sparse(&mut tx, instance.id, Some(WorkflowState::Finished), None)
                        .await?;
                    instance.state = WorkflowState::Finished;
                }
                ParentContext::PreWorkflow(instance) => {
                    self.deps
                        .pre_workflows
                        .update_sparse(&mut tx, instance.id, Some(WorkflowState::Finished), None)
                        .await?;
                    instance.state = WorkflowState::Finished;
                    // A finished registration feeds later workflows.
                    self.deps
                        .principal_contexts
                        .merge(&mut tx, instance.principal_id, &instance.trader_context.0)
                        .await?;
                }
            }
        }

        tx.commit().await.map_err(AppError::from)?;
        self.node = updated_node;

        Ok(TransitionReport {
            plugin_state: edge.plugin_state,
            node_state: self.node.state,
            new_ready_node_ids,
            workflow_finished,
        })
    }
}

//! Per-node plugin runtime: a capability trait, the container mediating
//! every plugin/store interaction, and the two concrete plugins.

pub mod container;
pub mod event_barrier;
pub mod form;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use container::{EngineDeps, ParentContext, PluginContainer, TransitionReport};
pub use event_barrier::EventBarrierPlugin;
pub use form::FormPlugin;

use crate::domain::entities::{NodeState, NodeTemplate, NodeType};
use crate::shared::{AppError, AppResult};

/// Body of `POST .../nodes/{nodeId}/execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub action: String,
    #[serde(default)]
    pub content: Option<Value>,
}

/// What one execute call changed, surfaced to the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOutcome {
    /// Plugin-specific response payload.
    pub content: Value,
    pub state: NodeState,
    pub plugin_state: String,
    /// Siblings promoted to Ready by this call, for downstream wake-up.
    pub new_ready_node_ids: Vec<Uuid>,
    pub workflow_finished: bool,
}

/// Body of `GET .../nodes/{nodeId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInfo {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub plugin_state: String,
    pub state: NodeState,
    pub content: Value,
}

/// Capability interface every plugin implements. Plugins touch
/// persistent state only through the container.
#[async_trait]
pub trait Plugin: Send {
    /// Take the initial FSM edge when the node is first driven.
    async fn start(&mut self, ctx: &mut PluginContainer) -> AppResult<ExecuteOutcome>;

    async fn get_render_info(&mut self, ctx: &mut PluginContainer) -> AppResult<RenderInfo>;

    async fn execute(
        &mut self,
        ctx: &mut PluginContainer,
        req: &ExecuteRequest,
    ) -> AppResult<ExecuteOutcome>;
}

/// Concrete plugin set. No dynamic dispatch beyond these variants.
pub enum NodePlugin {
    SimpleForm(FormPlugin),
    EventBarrier(EventBarrierPlugin),
}

impl NodePlugin {
    /// Materialize the plugin for a node template.
    pub fn for_template(template: &NodeTemplate) -> AppResult<Self> {
        match template.node_type {
            NodeType::SimpleForm => Ok(Self::SimpleForm(FormPlugin::from_config(
                &template.config.0,
            )?)),
            NodeType::EventBarrier => Ok(Self::EventBarrier(EventBarrierPlugin::from_config(
                &template.config.0,
            )?)),
        }
    }

    pub async fn start(&mut self, ctx: &mut PluginContainer) -> AppResult<ExecuteOutcome> {
        match self {
            Self::SimpleForm(plugin) => plugin.start(ctx).await,
            Self::EventBarrier(plugin) => plugin.start(ctx).await,
        }
    }

    pub async fn get_render_info(&mut self, ctx: &mut PluginContainer) -> AppResult<RenderInfo> {
        match self {
            Self::SimpleForm(plugin) => plugin.get_render_info(ctx).await,
            Self::EventBarrier(plugin) => plugin.get_render_info(ctx).await,
        }
    }

    pub async fn execute(
        &mut self,
        ctx: &mut PluginContainer,
        req: &ExecuteRequest,
    ) -> AppResult<ExecuteOutcome> {
        match self {
            Self::SimpleForm(plugin) => plugin.execute(ctx, req).await,
            Self::EventBarrier(plugin) => plugin.execute(ctx, req).await,
        }
    }
}

/// Reserved local-store keys of the form plugin.
pub mod local_keys {
    pub const TRADER_FORM: &str = "trader:form";
    pub const SUBMISSION_RESPONSE: &str = "submissionResponse";
    pub const OGA_RESPONSE: &str = "ogaResponse";
}

pub(crate) fn config_error(message: &str) -> AppError {
    AppError::Validation(format!("Invalid node config: {}", message))
}

//! Wire DTOs shared across handlers. Field names are part of the API
//! contract and must not drift.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use shared::domain::entities::{
    ConsignmentItem, NodeState, PreWorkflowInstance, PreWorkflowSummary, TradeFlow,
    WorkflowInstance, WorkflowNode, WorkflowState, WorkflowSummary,
};
use shared::{ApiError, AppError};

/// Principal identity, normally established by the auth middleware in
/// front of this service.
pub const PRINCIPAL_HEADER: &str = "X-Principal-Id";

pub fn principal_from_headers(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| {
            ApiError(AppError::Validation(format!(
                "Missing or invalid {} header",
                PRINCIPAL_HEADER
            )))
        })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: Uuid,
    pub node_template_id: Uuid,
    pub state: NodeState,
    pub extended_state: Option<String>,
    pub outcome: Option<String>,
    pub depends_on: Vec<Uuid>,
}

impl From<&WorkflowNode> for NodeDto {
    fn from(node: &WorkflowNode) -> Self {
        Self {
            id: node.id,
            node_template_id: node.node_template_id,
            state: node.state,
            extended_state: node.extended_state.clone(),
            outcome: node.outcome.clone(),
            depends_on: node.depends_on.0.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDetailDto {
    pub id: Uuid,
    pub flow: TradeFlow,
    pub principal_id: Uuid,
    pub state: WorkflowState,
    pub items: Vec<ConsignmentItem>,
    pub global_context: Map<String, Value>,
    pub end_node_id: Option<Uuid>,
    pub workflow_nodes: Vec<NodeDto>,
}

impl WorkflowDetailDto {
    pub fn from_parts(instance: WorkflowInstance, nodes: &[WorkflowNode]) -> Self {
        Self {
            id: instance.id,
            flow: instance.flow,
            principal_id: instance.principal_id,
            state: instance.state,
            items: instance.items.0,
            global_context: instance.global_context.0,
            end_node_id: instance.end_node_id,
            workflow_nodes: nodes.iter().map(NodeDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreWorkflowDetailDto {
    pub id: Uuid,
    pub pre_workflow_template_id: Uuid,
    pub principal_id: Uuid,
    pub state: WorkflowState,
    pub trader_context: Map<String, Value>,
    pub end_node_id: Option<Uuid>,
    pub workflow_nodes: Vec<NodeDto>,
}

impl PreWorkflowDetailDto {
    pub fn from_parts(instance: PreWorkflowInstance, nodes: &[WorkflowNode]) -> Self {
        Self {
            id: instance.id,
            pre_workflow_template_id: instance.pre_workflow_template_id,
            principal_id: instance.principal_id,
            state: instance.state,
            trader_context: instance.trader_context.0,
            end_node_id: instance.end_node_id,
            workflow_nodes: nodes.iter().map(NodeDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto<T> {
    pub total: i64,
    pub items: Vec<T>,
    pub offset: i64,
    pub limit: i64,
}

pub type WorkflowPageDto = PageDto<WorkflowSummary>;
pub type PreWorkflowPageDto = PageDto<PreWorkflowSummary>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub principal_id: Uuid,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchWorkflowRequest {
    #[serde(default)]
    pub state: Option<WorkflowState>,
    #[serde(default)]
    pub append_to_global_context: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_wire_shape() {
        let req: shared::application::services::CreateWorkflowRequest = serde_json::from_value(
            json!({"flow": "IMPORT", "items": [{"goodsCodeId": Uuid::nil()}]}),
        )
        .unwrap();
        assert_eq!(req.flow, TradeFlow::Import);
        assert_eq!(req.items.len(), 1);
    }

    #[test]
    fn test_patch_request_accepts_sparse_bodies() {
        let state_only: PatchWorkflowRequest =
            serde_json::from_value(json!({"state": "REQUIRES_REWORK"})).unwrap();
        assert_eq!(state_only.state, Some(WorkflowState::RequiresRework));
        assert!(state_only.append_to_global_context.is_none());

        let ctx_only: PatchWorkflowRequest =
            serde_json::from_value(json!({"appendToGlobalContext": {"k": "v"}})).unwrap();
        assert!(ctx_only.state.is_none());
        assert_eq!(
            ctx_only.append_to_global_context.unwrap()["k"],
            json!("v")
        );
    }

    #[test]
    fn test_node_dto_field_names() {
        let value = serde_json::to_value(NodeDto {
            id: Uuid::nil(),
            node_template_id: Uuid::nil(),
            state: NodeState::Ready,
            extended_state: None,
            outcome: None,
            depends_on: vec![],
        })
        .unwrap();
        assert!(value.get("nodeTemplateId").is_some());
        assert!(value.get("extendedState").is_some());
        assert_eq!(value["state"], json!("READY"));
    }
}

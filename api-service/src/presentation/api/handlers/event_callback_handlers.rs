//! Event-callback handler: external services release event barriers by
//! POSTing to `/event-callbacks/{nodeId}`.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use shared::application::plugins::ExecuteRequest;
use shared::domain::entities::NodeParent;
use shared::{ApiError, ApiResponse, AppError};

use crate::presentation::api::AppState;

/// `POST /event-callbacks/{nodeId}` with body `{"action": "complete", ...}`.
pub async fn post_event_callback(
    State(state): State<Arc<AppState>>,
    Path(node_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let action = body
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ApiError(AppError::Validation(
                "Event callback body must carry an action".to_string(),
            ))
        })?
        .to_string();

    let node = state
        .node_store
        .find_node(node_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Node {} not found", node_id)))?;

    let req = ExecuteRequest {
        action,
        content: Some(body),
    };
    let outcome = match node.parent()? {
        NodeParent::Workflow(workflow_id) => {
            state
                .workflow_service
                .execute_node(workflow_id, node_id, &req)
                .await?
        }
        NodeParent::PreWorkflow(pre_workflow_id) => {
            state
                .pre_workflow_service
                .execute_node(pre_workflow_id, node_id, &req)
                .await?
        }
    };

    Ok(Json(ApiResponse::success(outcome)))
}

//! Workflow HTTP handlers: consignment registration, node execution and
//! render-info lookups.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use shared::application::plugins::ExecuteRequest;
use shared::application::services::CreateWorkflowRequest;
use shared::{ApiError, ApiResponse};

use super::dto::{
    principal_from_headers, ListQuery, PatchWorkflowRequest, WorkflowDetailDto, WorkflowPageDto,
};
use crate::presentation::api::AppState;

/// `POST /workflows`
pub async fn create_workflow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal_id = principal_from_headers(&headers)?;

    // A consignment starts from the trader's registered context so
    // later forms can pre-populate from it.
    let initial_context = state
        .principal_contexts
        .by_principal_id(principal_id)
        .await?
        .map(|row| row.context.0)
        .unwrap_or_default();

    let (instance, nodes) = state
        .workflow_service
        .create_workflow(&req, principal_id, initial_context)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(WorkflowDetailDto::from_parts(instance, &nodes)),
    ))
}

/// `GET /workflows/{id}`
pub async fn get_workflow(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (instance, nodes) = state.workflow_service.get_workflow(workflow_id).await?;
    Ok(Json(WorkflowDetailDto::from_parts(instance, &nodes)))
}

/// `GET /workflows?principalId=...&offset=...&limit=...`
pub async fn list_workflows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total, offset, limit) = state
        .workflow_service
        .list_workflows(query.principal_id, query.limit, query.offset)
        .await?;
    Ok(Json(WorkflowPageDto {
        total,
        items,
        offset,
        limit,
    }))
}

/// `PATCH /workflows/{id}`
pub async fn patch_workflow(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<Uuid>,
    Json(req): Json<PatchWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .workflow_service
        .patch_workflow(workflow_id, req.state, req.append_to_global_context)
        .await?;
    let (instance, nodes) = state.workflow_service.get_workflow(workflow_id).await?;
    Ok(Json(WorkflowDetailDto::from_parts(instance, &nodes)))
}

/// `POST /workflows/{id}/nodes/{nodeId}/execute`
pub async fn execute_node(
    State(state): State<Arc<AppState>>,
    Path((workflow_id, node_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ExecuteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .workflow_service
        .execute_node(workflow_id, node_id, &req)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// `GET /workflows/{id}/nodes/{nodeId}`
pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path((workflow_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let render_info = state
        .workflow_service
        .render_node(workflow_id, node_id)
        .await?;
    Ok(Json(render_info))
}

//! Pre-workflow HTTP handlers: one-time registrations.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use shared::application::plugins::ExecuteRequest;
use shared::application::services::CreatePreWorkflowRequest;
use shared::{ApiError, ApiResponse};

use super::dto::{principal_from_headers, ListQuery, PreWorkflowDetailDto, PreWorkflowPageDto};
use crate::presentation::api::AppState;

/// `POST /pre-workflows`
pub async fn create_pre_workflow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePreWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal_id = principal_from_headers(&headers)?;
    let (instance, nodes) = state
        .pre_workflow_service
        .create_pre_workflow(&req, principal_id, Default::default())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PreWorkflowDetailDto::from_parts(instance, &nodes)),
    ))
}

/// `GET /pre-workflows/{id}`
pub async fn get_pre_workflow(
    State(state): State<Arc<AppState>>,
    Path(pre_workflow_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (instance, nodes) = state
        .pre_workflow_service
        .get_pre_workflow(pre_workflow_id)
        .await?;
    Ok(Json(PreWorkflowDetailDto::from_parts(instance, &nodes)))
}

/// `GET /pre-workflows?principalId=...&offset=...&limit=...`
pub async fn list_pre_workflows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total, offset, limit) = state
        .pre_workflow_service
        .list_pre_workflows(query.principal_id, query.limit, query.offset)
        .await?;
    Ok(Json(PreWorkflowPageDto {
        total,
        items,
        offset,
        limit,
    }))
}

/// `POST /pre-workflows/{id}/nodes/{nodeId}/execute`
pub async fn execute_node(
    State(state): State<Arc<AppState>>,
    Path((pre_workflow_id, node_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ExecuteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .pre_workflow_service
        .execute_node(pre_workflow_id, node_id, &req)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// `GET /pre-workflows/{id}/nodes/{nodeId}`
pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path((pre_workflow_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let render_info = state
        .pre_workflow_service
        .render_node(pre_workflow_id, node_id)
        .await?;
    Ok(Json(render_info))
}

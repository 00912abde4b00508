//! Reference-data handlers: goods codes, form definitions, principal
//! contexts and the health probe.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use shared::{ApiError, AppError};

use crate::presentation::api::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// `GET /health`: liveness plus a database ping.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.database_service.health_check().await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_UNAVAILABLE"),
    }
}

/// `GET /goods-codes`
pub async fn list_goods_codes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let offset = query.offset.unwrap_or(0).max(0);
    let codes = state.goods_codes.list(limit, offset).await?;
    Ok(Json(codes))
}

/// `GET /goods-codes/{id}`
pub async fn get_goods_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let code = state
        .goods_codes
        .by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Goods code {} not found", id)))?;
    Ok(Json(code))
}

/// `GET /forms/{id}`
pub async fn get_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let form = state
        .forms
        .form_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Form {} not found", id)))?;
    Ok(Json(form))
}

/// `GET /principal-contexts/{principalId}`
pub async fn get_principal_context(
    State(state): State<Arc<AppState>>,
    Path(principal_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let context = state
        .principal_contexts
        .by_principal_id(principal_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No context for principal {}", principal_id))
        })?;
    Ok(Json(context))
}

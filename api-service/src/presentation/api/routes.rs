//! Router assembly: engine endpoints, event callbacks, reference data.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    catalog_handlers, event_callback_handlers, pre_workflow_handlers, workflow_handlers,
};
use super::middleware::request_id_middleware;
use super::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(catalog_handlers::health))
        .route(
            "/workflows",
            post(workflow_handlers::create_workflow).get(workflow_handlers::list_workflows),
        )
        .route(
            "/workflows/{id}",
            get(workflow_handlers::get_workflow).patch(workflow_handlers::patch_workflow),
        )
        .route(
            "/workflows/{id}/nodes/{nodeId}",
            get(workflow_handlers::get_node),
        )
        .route(
            "/workflows/{id}/nodes/{nodeId}/execute",
            post(workflow_handlers::execute_node),
        )
        .route(
            "/pre-workflows",
            post(pre_workflow_handlers::create_pre_workflow)
                .get(pre_workflow_handlers::list_pre_workflows),
        )
        .route(
            "/pre-workflows/{id}",
            get(pre_workflow_handlers::get_pre_workflow),
        )
        .route(
            "/pre-workflows/{id}/nodes/{nodeId}",
            get(pre_workflow_handlers::get_node),
        )
        .route(
            "/pre-workflows/{id}/nodes/{nodeId}/execute",
            post(pre_workflow_handlers::execute_node),
        )
        .route(
            "/event-callbacks/{nodeId}",
            post(event_callback_handlers::post_event_callback),
        )
        .route("/goods-codes", get(catalog_handlers::list_goods_codes))
        .route("/goods-codes/{id}", get(catalog_handlers::get_goods_code))
        .route("/forms/{id}", get(catalog_handlers::get_form))
        .route(
            "/principal-contexts/{principalId}",
            get(catalog_handlers::get_principal_context),
        )
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

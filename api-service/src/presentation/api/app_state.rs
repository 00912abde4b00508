use std::sync::Arc;

use shared::application::services::{PreWorkflowService, WorkflowService};
use shared::domain::repositories::{
    FormRepository, GoodsCodeRepository, NodeStore, PrincipalContextRepository,
};
use shared::infrastructure::database::DatabaseService;

/// Application state shared across handlers.
pub struct AppState {
    pub database_service: Arc<DatabaseService>,
    pub workflow_service: Arc<WorkflowService>,
    pub pre_workflow_service: Arc<PreWorkflowService>,
    pub node_store: Arc<dyn NodeStore>,
    pub goods_codes: Arc<dyn GoodsCodeRepository>,
    pub forms: Arc<dyn FormRepository>,
    pub principal_contexts: Arc<dyn PrincipalContextRepository>,
}

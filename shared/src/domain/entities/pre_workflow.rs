use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use super::workflow_instance::WorkflowState;

/// Template for a one-time registration workflow whose outputs persist
/// per principal and feed later workflow instances.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PreWorkflowTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub node_template_ids: Json<Vec<Uuid>>,
    pub end_node_template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row for pre-workflows, mirroring the workflow summary shape.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PreWorkflowSummary {
    pub id: Uuid,
    pub pre_workflow_template_id: Uuid,
    pub principal_id: Uuid,
    pub state: WorkflowState,
    pub workflow_node_count: i64,
    pub completed_workflow_node_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One live execution of a pre-workflow template. On completion its
/// accumulated `trader_context` is merged into the principal's persistent
/// context row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PreWorkflowInstance {
    pub id: Uuid,
    pub pre_workflow_template_id: Uuid,
    pub principal_id: Uuid,
    pub state: WorkflowState,
    pub trader_context: Json<Map<String, Value>>,
    pub end_node_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

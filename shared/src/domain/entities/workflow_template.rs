use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use super::workflow_instance::TradeFlow;

/// Kind of plugin driving a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum NodeType {
    #[serde(rename = "SIMPLE_FORM")]
    #[sqlx(rename = "SIMPLE_FORM")]
    SimpleForm,
    #[serde(rename = "EVENT_BARRIER")]
    #[sqlx(rename = "EVENT_BARRIER")]
    EventBarrier,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SimpleForm => write!(f, "SIMPLE_FORM"),
            Self::EventBarrier => write!(f, "EVENT_BARRIER"),
        }
    }
}

/// Blueprint for one node of a workflow.
///
/// The unlock rule is exactly one of the legacy `depends_on` list
/// (AND-all) and the `unlock_configuration` expression; when both are
/// present the expression wins and the legacy list is kept for audit.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    pub id: Uuid,
    pub name: String,
    pub node_type: NodeType,
    /// Plugin-specific configuration (form id, submission target,
    /// emission rules, external service URL, ...).
    pub config: Json<Value>,
    pub depends_on: Json<Vec<Uuid>>,
    /// Raw unlock expression as authored (either surface syntax).
    pub unlock_configuration: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An ordered list of node templates plus an optional designated end node.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub node_template_ids: Json<Vec<Uuid>>,
    pub end_node_template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unique mapping `(goods code, trade direction) -> workflow template`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMap {
    pub id: Uuid,
    pub goods_code_id: Uuid,
    pub flow: TradeFlow,
    pub workflow_template_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

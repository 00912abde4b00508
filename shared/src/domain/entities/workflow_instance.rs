use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

/// Trade direction of a consignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum TradeFlow {
    #[serde(rename = "IMPORT")]
    #[sqlx(rename = "IMPORT")]
    Import,
    #[serde(rename = "EXPORT")]
    #[sqlx(rename = "EXPORT")]
    Export,
}

impl std::fmt::Display for TradeFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Import => write!(f, "IMPORT"),
            Self::Export => write!(f, "EXPORT"),
        }
    }
}

/// Lifecycle state of a workflow or pre-workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum WorkflowState {
    #[serde(rename = "IN_PROGRESS")]
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "FINISHED")]
    #[sqlx(rename = "FINISHED")]
    Finished,
    #[serde(rename = "REQUIRES_REWORK")]
    #[sqlx(rename = "REQUIRES_REWORK")]
    RequiresRework,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Finished => write!(f, "FINISHED"),
            Self::RequiresRework => write!(f, "REQUIRES_REWORK"),
        }
    }
}

/// One traded item on a consignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsignmentItem {
    pub goods_code_id: Uuid,
}

/// One live execution of a workflow template: a consignment attached to a
/// trader and a set of traded items.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: Uuid,
    pub flow: TradeFlow,
    pub principal_id: Uuid,
    pub state: WorkflowState,
    pub items: Json<Vec<ConsignmentItem>>,
    /// String-keyed map accumulating per-node emissions; keys may be
    /// overwritten by later emissions, never deleted.
    pub global_context: Json<Map<String, Value>>,
    /// Node whose completion terminates the workflow, resolved at
    /// instantiation. Unset means all nodes must complete.
    pub end_node_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: node-count aggregates instead of per-node detail.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: Uuid,
    pub flow: TradeFlow,
    pub principal_id: Uuid,
    pub state: WorkflowState,
    pub items: Json<Vec<ConsignmentItem>>,
    pub workflow_node_count: i64,
    pub completed_workflow_node_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_wire_format() {
        assert_eq!(
            serde_json::to_value(TradeFlow::Import).unwrap(),
            serde_json::json!("IMPORT")
        );
        let flow: TradeFlow = serde_json::from_value(serde_json::json!("EXPORT")).unwrap();
        assert_eq!(flow, TradeFlow::Export);
    }

    #[test]
    fn test_item_wire_format_is_camel_case() {
        let item = ConsignmentItem {
            goods_code_id: Uuid::nil(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("goodsCodeId").is_some());
    }
}

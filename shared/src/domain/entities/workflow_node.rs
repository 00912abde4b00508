use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::unlock::{Unlock, UnlockExpr};
use crate::shared::{AppError, AppResult};

/// Lifecycle state of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum NodeState {
    #[serde(rename = "LOCKED")]
    #[sqlx(rename = "LOCKED")]
    Locked,
    #[serde(rename = "READY")]
    #[sqlx(rename = "READY")]
    Ready,
    #[serde(rename = "IN_PROGRESS")]
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    #[sqlx(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    #[sqlx(rename = "FAILED")]
    Failed,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "LOCKED"),
            Self::Ready => write!(f, "READY"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for NodeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOCKED" => Ok(Self::Locked),
            "READY" => Ok(Self::Ready),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Unknown node state: {}", s)),
        }
    }
}

/// The single parent of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeParent {
    Workflow(Uuid),
    PreWorkflow(Uuid),
}

/// One step inside a workflow or pre-workflow instance, driven by a plugin.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: Uuid,
    pub workflow_id: Option<Uuid>,
    pub pre_workflow_id: Option<Uuid>,
    pub node_template_id: Uuid,
    pub state: NodeState,
    /// Opaque plugin-state label (e.g. the form plugin's `Draft`).
    pub extended_state: Option<String>,
    /// Immutable tag emitted at a terminal transition, consumable by
    /// sibling unlock expressions.
    pub outcome: Option<String>,
    /// Sibling node ids resolved from the template's legacy dependency
    /// list. Kept for audit even when an unlock expression is present.
    pub depends_on: Json<Vec<Uuid>>,
    /// Resolved unlock expression (leaves carry template and instance ids).
    pub unlock_configuration: Option<Json<UnlockExpr>>,
    /// Namespaced per-plugin store (`trader:form`, `submissionResponse`,
    /// `ogaResponse` for the form plugin).
    pub local_store: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowNode {
    /// The owning parent. A node with neither or both parents violates a
    /// data invariant and is surfaced as an internal error.
    pub fn parent(&self) -> AppResult<NodeParent> {
        match (self.workflow_id, self.pre_workflow_id) {
            (Some(id), None) => Ok(NodeParent::Workflow(id)),
            (None, Some(id)) => Ok(NodeParent::PreWorkflow(id)),
            _ => Err(AppError::Internal(format!(
                "Node {} violates the single-parent invariant",
                self.id
            ))),
        }
    }

    /// The authoritative unlock rule: the expression when present,
    /// otherwise the legacy dependency list.
    pub fn unlock(&self) -> Unlock<'_> {
        match &self.unlock_configuration {
            Some(expr) => Unlock::Expression(&expr.0),
            None => Unlock::Legacy(&self.depends_on.0),
        }
    }
}

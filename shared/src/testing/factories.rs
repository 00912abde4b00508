//! Test Data Factories
//!
//! Builders for engine entities with sensible defaults, used by unit
//! and integration tests.

use chrono::Utc;
use serde_json::{json, Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entities::{
    ConsignmentItem, NodeState, NodeTemplate, NodeType, TradeFlow, WorkflowInstance,
    WorkflowNode, WorkflowState, WorkflowTemplate,
};

/// A SimpleForm node template with no dependencies.
pub fn form_node_template(config: Value) -> NodeTemplate {
    let now = Utc::now();
    NodeTemplate {
        id: Uuid::new_v4(),
        name: "Test Form".to_string(),
        node_type: NodeType::SimpleForm,
        config: Json(config),
        depends_on: Json(vec![]),
        unlock_configuration: None,
        created_at: now,
        updated_at: now,
    }
}

/// An EventBarrier node template pointing at the given URL.
pub fn barrier_node_template(external_service_url: &str) -> NodeTemplate {
    let mut template = form_node_template(json!({
        "externalServiceUrl": external_service_url
    }));
    template.name = "Test Barrier".to_string();
    template.node_type = NodeType::EventBarrier;
    template
}

/// Add a legacy dependency list to a node template.
pub fn with_depends_on(mut template: NodeTemplate, deps: Vec<Uuid>) -> NodeTemplate {
    template.depends_on = Json(deps);
    template
}

/// Add an unlock expression to a node template.
pub fn with_unlock(mut template: NodeTemplate, unlock: Value) -> NodeTemplate {
    template.unlock_configuration = Some(Json(unlock));
    template
}

pub fn workflow_template(node_template_ids: Vec<Uuid>) -> WorkflowTemplate {
    let now = Utc::now();
    WorkflowTemplate {
        id: Uuid::new_v4(),
        name: "Test Workflow".to_string(),
        description: None,
        version: "1".to_string(),
        node_template_ids: Json(node_template_ids),
        end_node_template_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn workflow_instance(principal_id: Uuid) -> WorkflowInstance {
    let now = Utc::now();
    WorkflowInstance {
        id: Uuid::new_v4(),
        flow: TradeFlow::Import,
        principal_id,
        state: WorkflowState::InProgress,
        items: Json(vec![ConsignmentItem {
            goods_code_id: Uuid::new_v4(),
        }]),
        global_context: Json(Map::new()),
        end_node_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn workflow_node(workflow_id: Uuid, template_id: Uuid, state: NodeState) -> WorkflowNode {
    let now = Utc::now();
    WorkflowNode {
        id: Uuid::new_v4(),
        workflow_id: Some(workflow_id),
        pre_workflow_id: None,
        node_template_id: template_id,
        state,
        extended_state: None,
        outcome: None,
        depends_on: Json(vec![]),
        unlock_configuration: None,
        local_store: Json(Map::new()),
        created_at: now,
        updated_at: now,
    }
}

//! Node transitions and completion propagation.
//!
//! `to_completed` is the only propagating transition: within the
//! caller's transaction it completes the node, re-evaluates every
//! still-Locked sibling's unlock rule, auto-completes a Ready end node
//! and detects workflow termination. `to_failed` / `to_in_progress` are
//! single-row transitions behind the same legal-transition gate.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::{NodeState, WorkflowNode};
use crate::domain::repositories::{NodeStore, PgTx};
use crate::domain::state_machine::check_transition;
use crate::domain::unlock::SiblingFacts;
use crate::shared::{AppError, AppResult};

/// Optional stamps applied at the terminal transition.
#[derive(Debug, Clone, Default)]
pub struct CompletionStamp {
    pub extended_state: Option<String>,
    pub outcome: Option<String>,
}

/// What one completion changed.
#[derive(Debug)]
pub struct PropagationResult {
    /// The completed node after stamping.
    pub node: WorkflowNode,
    /// Every persisted node, the completed one included.
    pub updated: Vec<WorkflowNode>,
    /// Siblings promoted Locked -> Ready by this completion.
    pub new_ready: Vec<WorkflowNode>,
    pub workflow_finished: bool,
}

/// Facts map over a sibling set.
pub fn sibling_facts(nodes: &[WorkflowNode]) -> HashMap<Uuid, SiblingFacts> {
    nodes
        .iter()
        .map(|n| {
            (
                n.id,
                SiblingFacts {
                    state: n.state,
                    outcome: n.outcome.clone(),
                },
            )
        })
        .collect()
}

/// Ids of Locked nodes whose unlock rule currently evaluates true.
pub fn newly_unlockable(nodes: &[WorkflowNode]) -> Vec<Uuid> {
    let facts = sibling_facts(nodes);
    nodes
        .iter()
        .filter(|n| n.state == NodeState::Locked && n.unlock().is_satisfied(&facts))
        .map(|n| n.id)
        .collect()
}

/// Termination: the designated end node is Completed, or, with no end
/// node, every sibling is Completed.
pub fn termination_reached(nodes: &[WorkflowNode], end_node_id: Option<Uuid>) -> bool {
    match end_node_id {
        Some(end_id) => nodes
            .iter()
            .any(|n| n.id == end_id && n.state == NodeState::Completed),
        None => nodes.iter().all(|n| n.state == NodeState::Completed),
    }
}

/// Drives node transitions against the store.
pub struct NodePropagator {
    store: Arc<dyn NodeStore>,
}

impl NodePropagator {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Complete a node and propagate: unlock siblings, auto-complete a
    /// Ready end node, detect termination. Idempotent when the node is
    /// already Completed.
    pub async fn to_completed(
        &self,
        tx: &mut PgTx<'_>,
        node_id: Uuid,
        stamp: CompletionStamp,
        end_node_id: Option<Uuid>,
    ) -> AppResult<PropagationResult> {
        let mut node = self.load_for_update(tx, node_id).await?;

        if node.state == NodeState::Completed {
            let siblings = self.store.siblings_of_node(tx, &node).await?;
            return Ok(PropagationResult {
                workflow_finished: termination_reached(&siblings, end_node_id),
                node,
                updated: vec![],
                new_ready: vec![],
            });
        }
        check_transition(node.state, NodeState::Completed)?;

        let now = Utc::now();
        node.state = NodeState::Completed;
        if stamp.extended_state.is_some() {
            node.extended_state = stamp.extended_state;
        }
        node.outcome = stamp.outcome;
        node.updated_at = now;

        // Sibling map with the just-completed node patched in.
        let mut siblings = self.store.siblings_of_node(tx, &node).await?;
        for sibling in &mut siblings {
            if sibling.id == node.id {
                *sibling = node.clone();
            }
        }

        let promoted = newly_unlockable(&siblings);
        for sibling in &mut siblings {
            if promoted.contains(&sibling.id) {
                sibling.state = NodeState::Ready;
                sibling.updated_at = now;
            }
        }

        // The designated end node is a pure synchronization point:
        // complete it the moment it is Ready.
        let mut auto_completed = None;
        if let Some(end_id) = end_node_id {
            if let Some(end_node) = siblings
                .iter_mut()
                .find(|n| n.id == end_id && n.state == NodeState::Ready)
            {
                end_node.state = NodeState::Completed;
                end_node.updated_at = now;
                auto_completed = Some(end_id);
            }
        }

        let workflow_finished = termination_reached(&siblings, end_node_id);

        let mut updated: Vec<WorkflowNode> = siblings
            .iter()
            .filter(|n| {
                n.id == node.id || promoted.contains(&n.id) || auto_completed == Some(n.id)
            })
            .cloned()
            .collect();
        // Global lock order: ascending byte order over node ids.
        updated.sort_by_key(|n| n.id);
        self.store.update_nodes(tx, &updated).await?;

        let new_ready: Vec<WorkflowNode> = updated
            .iter()
            .filter(|n| n.state == NodeState::Ready)
            .cloned()
            .collect();

        info!(
            node_id = %node.id,
            unlocked = new_ready.len(),
            finished = workflow_finished,
            "Node completed"
        );

        Ok(PropagationResult {
            node,
            updated,
            new_ready,
            workflow_finished,
        })
    }

    /// Single-row transition to InProgress. A node already InProgress
    /// only refreshes its plugin-state label.
    pub async fn to_in_progress(
        &self,
        tx: &mut PgTx<'_>,
        node_id: Uuid,
        extended_state: Option<String>,
    ) -> AppResult<WorkflowNode> {
        self.single_row(tx, node_id, NodeState::InProgress, extended_state, None)
            .await
    }

    /// Single-row transition to Failed. A terminal failure may still
    /// carry an emitted outcome tag (e.g. an agency rejection class).
    pub async fn to_failed(
        &self,
        tx: &mut PgTx<'_>,
        node_id: Uuid,
        extended_state: Option<String>,
        outcome: Option<String>,
    ) -> AppResult<WorkflowNode> {
        self.single_row(tx, node_id, NodeState::Failed, extended_state, outcome)
            .await
    }

    async fn single_row(
        &self,
        tx: &mut PgTx<'_>,
        node_id: Uuid,
        target: NodeState,
        extended_state: Option<String>,
        outcome: Option<String>,
    ) -> AppResult<WorkflowNode> {
        let mut node = self.load_for_update(tx, node_id).await?;

        if node.state != target {
            check_transition(node.state, target)?;
            node.state = target;
        }
        if extended_state.is_some() {
            node.extended_state = extended_state;
        }
        if outcome.is_some() {
            node.outcome = outcome;
        }
        node.updated_at = Utc::now();

        self.store
            .update_nodes(tx, std::slice::from_ref(&node))
            .await?;
        Ok(node)
    }

    async fn load_for_update(&self, tx: &mut PgTx<'_>, node_id: Uuid) -> AppResult<WorkflowNode> {
        self.store
            .node_by_id_for_update(tx, node_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Node {} not found", node_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::unlock::{parse_unlock_config, resolve};
    use serde_json::{json, Map};
    use sqlx::types::Json;

    fn node_id(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn node(n: u8, state: NodeState, deps: Vec<Uuid>) -> WorkflowNode {
        WorkflowNode {
            id: node_id(n),
            workflow_id: Some(Uuid::from_bytes([0xAA; 16])),
            pre_workflow_id: None,
            node_template_id: Uuid::from_bytes([0x10 + n; 16]),
            state,
            extended_state: None,
            outcome: None,
            depends_on: Json(deps),
            unlock_configuration: None,
            local_store: Json(Map::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// In-memory completion + one unlock pass, mirroring the persisted
    /// propagation.
    fn complete(nodes: &mut [WorkflowNode], id: Uuid, outcome: Option<&str>) {
        for n in nodes.iter_mut() {
            if n.id == id {
                n.state = NodeState::Completed;
                n.outcome = outcome.map(str::to_string);
            }
        }
        let promoted = newly_unlockable(nodes);
        for n in nodes.iter_mut() {
            if promoted.contains(&n.id) {
                n.state = NodeState::Ready;
            }
        }
    }

    #[test]
    fn test_completion_unlocks_dependent() {
        let mut nodes = vec![
            node(1, NodeState::Ready, vec![]),
            node(2, NodeState::Locked, vec![node_id(1)]),
        ];
        complete(&mut nodes, node_id(1), None);
        assert_eq!(nodes[1].state, NodeState::Ready);
        // no Locked sibling with a satisfied rule remains
        assert!(newly_unlockable(&nodes).is_empty());
    }

    #[test]
    fn test_unlock_pass_is_idempotent() {
        let mut nodes = vec![
            node(1, NodeState::Completed, vec![]),
            node(2, NodeState::Locked, vec![node_id(1)]),
        ];
        let first = newly_unlockable(&nodes);
        assert_eq!(first, vec![node_id(2)]);
        for n in nodes.iter_mut() {
            if first.contains(&n.id) {
                n.state = NodeState::Ready;
            }
        }
        assert!(newly_unlockable(&nodes).is_empty());
    }

    #[test]
    fn test_propagation_is_confluent() {
        // C waits on A and B; completing A then B must equal B then A.
        let build = || {
            vec![
                node(1, NodeState::Ready, vec![]),
                node(2, NodeState::Ready, vec![]),
                node(3, NodeState::Locked, vec![node_id(1), node_id(2)]),
            ]
        };

        let mut forward = build();
        complete(&mut forward, node_id(1), None);
        complete(&mut forward, node_id(2), None);

        let mut backward = build();
        complete(&mut backward, node_id(2), None);
        complete(&mut backward, node_id(1), None);

        let states = |nodes: &[WorkflowNode]| {
            nodes.iter().map(|n| (n.id, n.state)).collect::<Vec<_>>()
        };
        assert_eq!(states(&forward), states(&backward));
        assert_eq!(forward[2].state, NodeState::Ready);
    }

    #[test]
    fn test_outcome_based_unlock_skips_unfinished_sibling() {
        // D unlocks on (A and B completed) or A emitted FAST_TRACKED.
        let expr = parse_unlock_config(&json!({
            "anyOf": [
                {"allOf": [
                    {"nodeTemplateId": Uuid::from_bytes([0x11; 16]), "state": "COMPLETED"},
                    {"nodeTemplateId": Uuid::from_bytes([0x12; 16]), "state": "COMPLETED"}
                ]},
                {"nodeTemplateId": Uuid::from_bytes([0x11; 16]), "outcome": "FAST_TRACKED"}
            ]
        }))
        .unwrap();
        let map: HashMap<Uuid, Uuid> = [
            (Uuid::from_bytes([0x11; 16]), node_id(1)),
            (Uuid::from_bytes([0x12; 16]), node_id(2)),
        ]
        .into_iter()
        .collect();
        let resolved = resolve(&expr, &map).unwrap();

        let mut d = node(4, NodeState::Locked, vec![]);
        d.unlock_configuration = Some(Json(resolved));

        let mut nodes = vec![
            node(1, NodeState::Ready, vec![]),
            node(2, NodeState::Ready, vec![]),
            d,
        ];
        complete(&mut nodes, node_id(1), Some("FAST_TRACKED"));
        assert_eq!(nodes[2].state, NodeState::Ready);
        assert_eq!(nodes[1].state, NodeState::Ready); // B untouched
    }

    #[test]
    fn test_termination_with_and_without_end_node() {
        let nodes = vec![
            node(1, NodeState::Completed, vec![]),
            node(2, NodeState::Ready, vec![]),
        ];
        assert!(termination_reached(&nodes, Some(node_id(1))));
        assert!(!termination_reached(&nodes, Some(node_id(2))));
        assert!(!termination_reached(&nodes, None));

        let all_done = vec![
            node(1, NodeState::Completed, vec![]),
            node(2, NodeState::Completed, vec![]),
        ];
        assert!(termination_reached(&all_done, None));
    }
}

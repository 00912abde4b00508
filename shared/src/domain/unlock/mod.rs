//! Conditional-unlock evaluation: validate, resolve and evaluate boolean
//! expressions over sibling `(state, outcome)` pairs, plus the legacy
//! AND-all dependency list.

pub mod expression;

use std::collections::HashMap;
use uuid::Uuid;

pub use expression::{parse_unlock_config, validate_references, UnlockExpr, UnlockLeaf};

use crate::domain::entities::NodeState;
use crate::shared::{AppError, AppResult};

/// What unlock evaluation needs to know about one sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingFacts {
    pub state: NodeState,
    pub outcome: Option<String>,
}

/// The unlock rule of a node: either the legacy AND-all dependency list
/// or a resolved boolean expression. The expression wins when both exist
/// on the template.
#[derive(Debug, Clone, Copy)]
pub enum Unlock<'a> {
    Legacy(&'a [Uuid]),
    Expression(&'a UnlockExpr),
}

impl Unlock<'_> {
    /// Evaluate against the sibling map. An empty legacy list is
    /// trivially satisfied (no dependencies, Ready at creation).
    pub fn is_satisfied(&self, siblings: &HashMap<Uuid, SiblingFacts>) -> bool {
        match self {
            Unlock::Legacy(ids) => ids.iter().all(|id| {
                siblings
                    .get(id)
                    .is_some_and(|facts| facts.state == NodeState::Completed)
            }),
            Unlock::Expression(expr) => evaluate(expr, siblings),
        }
    }
}

/// Produce a new tree whose leaves carry the instance id resolved through
/// `template_to_instance` (template ids are preserved for audit).
pub fn resolve(
    expr: &UnlockExpr,
    template_to_instance: &HashMap<Uuid, Uuid>,
) -> AppResult<UnlockExpr> {
    match expr {
        UnlockExpr::Leaf(leaf) => {
            let node_id = template_to_instance
                .get(&leaf.node_template_id)
                .copied()
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Unlock rule references node template {} with no instance",
                        leaf.node_template_id
                    ))
                })?;
            Ok(UnlockExpr::Leaf(UnlockLeaf {
                node_id: Some(node_id),
                ..leaf.clone()
            }))
        }
        UnlockExpr::AnyOf(children) => Ok(UnlockExpr::AnyOf(
            children
                .iter()
                .map(|child| resolve(child, template_to_instance))
                .collect::<AppResult<Vec<_>>>()?,
        )),
        UnlockExpr::AllOf(children) => Ok(UnlockExpr::AllOf(
            children
                .iter()
                .map(|child| resolve(child, template_to_instance))
                .collect::<AppResult<Vec<_>>>()?,
        )),
    }
}

/// Pure evaluation over the sibling map. A leaf referencing a missing
/// sibling is false; `anyOf` / `allOf` short-circuit.
pub fn evaluate(expr: &UnlockExpr, siblings: &HashMap<Uuid, SiblingFacts>) -> bool {
    match expr {
        UnlockExpr::Leaf(leaf) => evaluate_leaf(leaf, siblings),
        UnlockExpr::AnyOf(children) => children.iter().any(|child| evaluate(child, siblings)),
        UnlockExpr::AllOf(children) => children.iter().all(|child| evaluate(child, siblings)),
    }
}

fn evaluate_leaf(leaf: &UnlockLeaf, siblings: &HashMap<Uuid, SiblingFacts>) -> bool {
    let Some(node_id) = leaf.node_id else {
        // Unresolved leaves never match.
        return false;
    };
    let Some(facts) = siblings.get(&node_id) else {
        return false;
    };

    if let Some(expected) = leaf.state {
        if facts.state != expected {
            return false;
        }
    }
    if let Some(expected) = &leaf.outcome {
        match &facts.outcome {
            Some(actual) if actual == expected => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template_id(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn node_id(n: u8) -> Uuid {
        Uuid::from_bytes([0xF0 + n; 16])
    }

    fn facts(state: NodeState, outcome: Option<&str>) -> SiblingFacts {
        SiblingFacts {
            state,
            outcome: outcome.map(str::to_string),
        }
    }

    fn resolved(config: serde_json::Value, pairs: &[(u8, u8)]) -> UnlockExpr {
        let expr = parse_unlock_config(&config).unwrap();
        let map: HashMap<Uuid, Uuid> = pairs
            .iter()
            .map(|(t, n)| (template_id(*t), node_id(*n)))
            .collect();
        resolve(&expr, &map).unwrap()
    }

    #[test]
    fn test_resolution_fills_node_ids_and_keeps_template_ids() {
        let expr = resolved(
            json!({"nodeTemplateId": template_id(1), "state": "COMPLETED"}),
            &[(1, 1)],
        );
        match expr {
            UnlockExpr::Leaf(leaf) => {
                assert_eq!(leaf.node_template_id, template_id(1));
                assert_eq!(leaf.node_id, Some(node_id(1)));
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_resolution_fails_on_missing_instance() {
        let expr = parse_unlock_config(&json!({
            "nodeTemplateId": template_id(9), "state": "COMPLETED"
        }))
        .unwrap();
        assert!(resolve(&expr, &HashMap::new()).is_err());
    }

    #[test]
    fn test_missing_sibling_is_false() {
        let expr = resolved(
            json!({"nodeTemplateId": template_id(1), "state": "COMPLETED"}),
            &[(1, 1)],
        );
        assert!(!evaluate(&expr, &HashMap::new()));
    }

    #[test]
    fn test_state_and_outcome_and_together() {
        let expr = resolved(
            json!({
                "nodeTemplateId": template_id(1),
                "state": "COMPLETED",
                "outcome": "FAST_TRACKED"
            }),
            &[(1, 1)],
        );

        let mut siblings = HashMap::new();
        siblings.insert(node_id(1), facts(NodeState::Completed, None));
        assert!(!evaluate(&expr, &siblings));

        siblings.insert(node_id(1), facts(NodeState::Completed, Some("FAST_TRACKED")));
        assert!(evaluate(&expr, &siblings));

        siblings.insert(node_id(1), facts(NodeState::Ready, Some("FAST_TRACKED")));
        assert!(!evaluate(&expr, &siblings));
    }

    #[test]
    fn test_conditional_unlock_any_of_all_of() {
        // (A completed AND B completed) OR A emitted FAST_TRACKED
        let expr = resolved(
            json!({
                "anyOf": [
                    {"allOf": [
                        {"nodeTemplateId": template_id(1), "state": "COMPLETED"},
                        {"nodeTemplateId": template_id(2), "state": "COMPLETED"}
                    ]},
                    {"nodeTemplateId": template_id(1), "outcome": "FAST_TRACKED"}
                ]
            }),
            &[(1, 1), (2, 2)],
        );

        let mut siblings = HashMap::new();
        siblings.insert(node_id(1), facts(NodeState::Completed, Some("FAST_TRACKED")));
        siblings.insert(node_id(2), facts(NodeState::Locked, None));
        // fast-tracked outcome unlocks regardless of B
        assert!(evaluate(&expr, &siblings));

        siblings.insert(node_id(1), facts(NodeState::Completed, None));
        assert!(!evaluate(&expr, &siblings));

        siblings.insert(node_id(2), facts(NodeState::Completed, None));
        assert!(evaluate(&expr, &siblings));
    }

    #[test]
    fn test_evaluation_is_idempotent_on_unchanged_siblings() {
        let expr = resolved(
            json!({"allOf": [
                {"nodeTemplateId": template_id(1), "state": "COMPLETED"},
                {"nodeTemplateId": template_id(2), "outcome": "npqs:review"}
            ]}),
            &[(1, 1), (2, 2)],
        );

        let mut siblings = HashMap::new();
        siblings.insert(node_id(1), facts(NodeState::Completed, None));
        siblings.insert(node_id(2), facts(NodeState::Completed, Some("npqs:review")));

        let first = evaluate(&expr, &siblings);
        let second = evaluate(&expr, &siblings);
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn test_legacy_unlock_all_completed() {
        let deps = vec![node_id(1), node_id(2)];
        let unlock = Unlock::Legacy(&deps);

        let mut siblings = HashMap::new();
        siblings.insert(node_id(1), facts(NodeState::Completed, None));
        siblings.insert(node_id(2), facts(NodeState::InProgress, None));
        assert!(!unlock.is_satisfied(&siblings));

        siblings.insert(node_id(2), facts(NodeState::Completed, None));
        assert!(unlock.is_satisfied(&siblings));
    }

    #[test]
    fn test_empty_legacy_list_is_trivially_satisfied() {
        let unlock = Unlock::Legacy(&[]);
        assert!(unlock.is_satisfied(&HashMap::new()));
    }
}

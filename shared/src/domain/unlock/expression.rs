//! Unlock expression model and surface-syntax parsing.
//!
//! Two equivalent surface syntaxes normalize to one recursive tree:
//! the tree itself (`{"anyOf": [...]}` / `{"allOf": [...]}` / leaf
//! objects nested freely) and the legacy DNF shape
//! `{"anyOf": [{"allOf": [leaf, ...]}, ...]}`, which is a restriction of
//! the tree. A template may also wrap the tree under an `"expression"`
//! key; mixing that wrapper with top-level tree keys is rejected.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::entities::NodeState;
use crate::shared::{AppError, AppResult};

/// One condition over a sibling node: state and/or outcome literals,
/// ANDed when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockLeaf {
    /// Template-level reference, preserved for audit.
    pub node_template_id: Uuid,
    /// Instance-level reference, populated by resolution.
    pub node_id: Option<Uuid>,
    pub state: Option<NodeState>,
    pub outcome: Option<String>,
}

/// Recursive boolean expression over sibling `(state, outcome)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockExpr {
    Leaf(UnlockLeaf),
    AnyOf(Vec<UnlockExpr>),
    AllOf(Vec<UnlockExpr>),
}

impl UnlockExpr {
    /// Canonical JSON form (also the stored form on resolved nodes).
    pub fn to_value(&self) -> Value {
        match self {
            UnlockExpr::Leaf(leaf) => {
                let mut map = Map::new();
                map.insert(
                    "nodeTemplateId".to_string(),
                    json!(leaf.node_template_id),
                );
                if let Some(node_id) = leaf.node_id {
                    map.insert("nodeId".to_string(), json!(node_id));
                }
                if let Some(state) = leaf.state {
                    map.insert("state".to_string(), json!(state));
                }
                if let Some(outcome) = &leaf.outcome {
                    map.insert("outcome".to_string(), json!(outcome));
                }
                Value::Object(map)
            }
            UnlockExpr::AnyOf(children) => {
                json!({"anyOf": children.iter().map(Self::to_value).collect::<Vec<_>>()})
            }
            UnlockExpr::AllOf(children) => {
                json!({"allOf": children.iter().map(Self::to_value).collect::<Vec<_>>()})
            }
        }
    }

    /// Template ids referenced anywhere in the tree.
    pub fn referenced_template_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::new();
        self.collect_template_ids(&mut ids);
        ids
    }

    fn collect_template_ids(&self, ids: &mut Vec<Uuid>) {
        match self {
            UnlockExpr::Leaf(leaf) => ids.push(leaf.node_template_id),
            UnlockExpr::AnyOf(children) | UnlockExpr::AllOf(children) => {
                for child in children {
                    child.collect_template_ids(ids);
                }
            }
        }
    }
}

impl Serialize for UnlockExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnlockExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_expr(&value).map_err(D::Error::custom)
    }
}

/// Parse a node template's `unlock_configuration` JSON. Accepts the bare
/// tree or an `{"expression": tree}` wrapper; rejects a wrapper mixed
/// with top-level tree keys.
pub fn parse_unlock_config(value: &Value) -> AppResult<UnlockExpr> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::Validation("Unlock rule must be a JSON object".to_string()))?;

    if let Some(wrapped) = object.get("expression") {
        if object.contains_key("anyOf")
            || object.contains_key("allOf")
            || object.contains_key("nodeTemplateId")
        {
            return Err(AppError::Validation(
                "Unlock rule must use a single surface syntax".to_string(),
            ));
        }
        return parse_expr(wrapped).map_err(AppError::Validation);
    }

    parse_expr(value).map_err(AppError::Validation)
}

fn parse_expr(value: &Value) -> Result<UnlockExpr, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "Unlock expression must be a JSON object".to_string())?;

    let has_any = object.contains_key("anyOf");
    let has_all = object.contains_key("allOf");
    let has_leaf = object.contains_key("nodeTemplateId");

    match (has_any, has_all, has_leaf) {
        (true, false, false) => parse_children(&object["anyOf"], "anyOf").map(UnlockExpr::AnyOf),
        (false, true, false) => parse_children(&object["allOf"], "allOf").map(UnlockExpr::AllOf),
        (false, false, true) => parse_leaf(object).map(UnlockExpr::Leaf),
        (false, false, false) => {
            Err("Unlock expression must be a leaf, anyOf or allOf".to_string())
        }
        _ => Err("Unlock expression mixes leaf and operator shape".to_string()),
    }
}

fn parse_children(value: &Value, operator: &str) -> Result<Vec<UnlockExpr>, String> {
    let children = value
        .as_array()
        .ok_or_else(|| format!("{} must be an array", operator))?;
    if children.is_empty() {
        return Err(format!("{} must have at least one child", operator));
    }
    children.iter().map(parse_expr).collect()
}

fn parse_leaf(object: &Map<String, Value>) -> Result<UnlockLeaf, String> {
    let node_template_id = object
        .get("nodeTemplateId")
        .and_then(Value::as_str)
        .ok_or_else(|| "Leaf nodeTemplateId must be a string".to_string())
        .and_then(|s| {
            Uuid::parse_str(s).map_err(|_| format!("Leaf nodeTemplateId is not a UUID: {}", s))
        })?;
    if node_template_id.is_nil() {
        return Err("Leaf nodeTemplateId must not be nil".to_string());
    }

    let node_id = match object.get("nodeId") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| "Leaf nodeId is not a UUID".to_string())?,
        ),
    };

    let state = match object.get("state") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let raw = value
                .as_str()
                .ok_or_else(|| "Leaf state must be a string".to_string())?;
            if raw.is_empty() {
                return Err("Leaf state must not be empty".to_string());
            }
            Some(raw.parse::<NodeState>()?)
        }
    };

    let outcome = match object.get("outcome") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let raw = value
                .as_str()
                .ok_or_else(|| "Leaf outcome must be a string".to_string())?;
            if raw.is_empty() {
                return Err("Leaf outcome must not be empty".to_string());
            }
            Some(raw.to_string())
        }
    };

    if state.is_none() && outcome.is_none() {
        return Err("Leaf must set a state or an outcome".to_string());
    }

    Ok(UnlockLeaf {
        node_template_id,
        node_id,
        state,
        outcome,
    })
}

/// Every template id referenced by the expression must belong to the
/// owning workflow template.
pub fn validate_references(expr: &UnlockExpr, allowed: &HashSet<Uuid>) -> AppResult<()> {
    for id in expr.referenced_template_ids() {
        if !allowed.contains(&id) {
            return Err(AppError::Validation(format!(
                "Unlock rule references node template {} outside the owning template",
                id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_id(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn leaf_json(n: u8) -> Value {
        json!({"nodeTemplateId": template_id(n), "state": "COMPLETED"})
    }

    #[test]
    fn test_parse_leaf_with_state_and_outcome() {
        let expr = parse_unlock_config(&json!({
            "nodeTemplateId": template_id(1),
            "state": "COMPLETED",
            "outcome": "FAST_TRACKED"
        }))
        .unwrap();

        match expr {
            UnlockExpr::Leaf(leaf) => {
                assert_eq!(leaf.node_template_id, template_id(1));
                assert_eq!(leaf.state, Some(NodeState::Completed));
                assert_eq!(leaf.outcome.as_deref(), Some("FAST_TRACKED"));
                assert_eq!(leaf.node_id, None);
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_tree() {
        let expr = parse_unlock_config(&json!({
            "anyOf": [
                {"allOf": [leaf_json(1), leaf_json(2)]},
                {"nodeTemplateId": template_id(1), "outcome": "FAST_TRACKED"}
            ]
        }))
        .unwrap();

        match expr {
            UnlockExpr::AnyOf(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], UnlockExpr::AllOf(_)));
                assert!(matches!(children[1], UnlockExpr::Leaf(_)));
            }
            other => panic!("expected anyOf, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_legacy_dnf_desugars_to_tree() {
        let expr = parse_unlock_config(&json!({
            "anyOf": [{"allOf": [leaf_json(1)]}, {"allOf": [leaf_json(2), leaf_json(3)]}]
        }))
        .unwrap();
        let UnlockExpr::AnyOf(disjuncts) = expr else {
            panic!("expected anyOf");
        };
        assert!(disjuncts.iter().all(|d| matches!(d, UnlockExpr::AllOf(_))));
    }

    #[test]
    fn test_expression_wrapper() {
        let expr = parse_unlock_config(&json!({"expression": leaf_json(1)})).unwrap();
        assert!(matches!(expr, UnlockExpr::Leaf(_)));

        let mixed = parse_unlock_config(&json!({
            "expression": leaf_json(1),
            "anyOf": [leaf_json(2)]
        }));
        assert!(mixed.is_err());
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        // empty operators
        assert!(parse_unlock_config(&json!({"anyOf": []})).is_err());
        assert!(parse_unlock_config(&json!({"allOf": []})).is_err());
        // leaf without state or outcome
        assert!(parse_unlock_config(&json!({"nodeTemplateId": template_id(1)})).is_err());
        // empty literals
        assert!(parse_unlock_config(
            &json!({"nodeTemplateId": template_id(1), "state": ""})
        )
        .is_err());
        assert!(parse_unlock_config(
            &json!({"nodeTemplateId": template_id(1), "outcome": ""})
        )
        .is_err());
        // nil template id
        assert!(
            parse_unlock_config(&json!({"nodeTemplateId": Uuid::nil(), "state": "COMPLETED"}))
                .is_err()
        );
        // mixed leaf + operator shape
        assert!(parse_unlock_config(&json!({
            "nodeTemplateId": template_id(1),
            "state": "COMPLETED",
            "anyOf": [leaf_json(2)]
        }))
        .is_err());
        // unknown state literal
        assert!(parse_unlock_config(
            &json!({"nodeTemplateId": template_id(1), "state": "DONE"})
        )
        .is_err());
    }

    #[test]
    fn test_validate_references() {
        let expr = parse_unlock_config(&json!({
            "allOf": [leaf_json(1), leaf_json(2)]
        }))
        .unwrap();

        let allowed: HashSet<Uuid> = [template_id(1), template_id(2)].into_iter().collect();
        assert!(validate_references(&expr, &allowed).is_ok());

        let narrow: HashSet<Uuid> = [template_id(1)].into_iter().collect();
        assert!(validate_references(&expr, &narrow).is_err());
    }

    #[test]
    fn test_serde_round_trip_preserves_tree() {
        let expr = parse_unlock_config(&json!({
            "anyOf": [
                {"allOf": [leaf_json(1), leaf_json(2)]},
                {"nodeTemplateId": template_id(3), "outcome": "FAST_TRACKED"}
            ]
        }))
        .unwrap();

        let serialized = serde_json::to_value(&expr).unwrap();
        let reparsed: UnlockExpr = serde_json::from_value(serialized).unwrap();
        assert_eq!(expr, reparsed);
    }
}

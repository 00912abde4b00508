//! Node instantiation: materialize a template's node list into Locked
//! rows, resolve unlock rules to instance ids, reject dependency cycles
//! and promote trivially unlockable nodes to Ready.

use chrono::{DateTime, Utc};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde_json::Map;
use sqlx::types::Json;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::entities::{NodeState, NodeTemplate, WorkflowNode};
use crate::domain::unlock::{self, parse_unlock_config, SiblingFacts, UnlockExpr};
use crate::shared::{AppError, AppResult};

/// Which parent column the new nodes carry.
#[derive(Debug, Clone, Copy)]
pub enum ParentRef {
    Workflow(Uuid),
    PreWorkflow(Uuid),
}

/// Output of node instantiation, before persistence.
#[derive(Debug)]
pub struct InstantiatedNodes {
    /// All nodes, Locked except for the initially Ready set.
    pub nodes: Vec<WorkflowNode>,
    pub template_to_instance: HashMap<Uuid, Uuid>,
    /// Instance id of the designated end node, when the template
    /// declares one.
    pub end_node_id: Option<Uuid>,
}

impl InstantiatedNodes {
    pub fn ready_nodes(&self) -> Vec<&WorkflowNode> {
        self.nodes
            .iter()
            .filter(|n| n.state == NodeState::Ready)
            .collect()
    }
}

/// Build the node rows for one parent from its node templates.
///
/// The templates must already be deduplicated; order is preserved.
pub fn instantiate_nodes(
    templates: &[NodeTemplate],
    end_node_template_id: Option<Uuid>,
    parent: ParentRef,
    now: DateTime<Utc>,
) -> AppResult<InstantiatedNodes> {
    let template_ids: HashSet<Uuid> = templates.iter().map(|t| t.id).collect();
    if template_ids.len() != templates.len() {
        return Err(AppError::Validation(
            "Node templates must be unique within a template".to_string(),
        ));
    }

    // Parse and validate every unlock rule against the sibling set.
    let mut expressions: HashMap<Uuid, UnlockExpr> = HashMap::new();
    for template in templates {
        for dep in &template.depends_on.0 {
            if !template_ids.contains(dep) {
                return Err(AppError::Validation(format!(
                    "Node template {} depends on {} outside the owning template",
                    template.id, dep
                )));
            }
        }
        if let Some(raw) = &template.unlock_configuration {
            let expr = parse_unlock_config(&raw.0)?;
            unlock::validate_references(&expr, &template_ids)?;
            expressions.insert(template.id, expr);
        }
    }

    reject_dependency_cycles(templates, &expressions)?;

    // Assign instance ids up front so unlock resolution can see the
    // whole sibling set.
    let template_to_instance: HashMap<Uuid, Uuid> = templates
        .iter()
        .map(|t| (t.id, Uuid::new_v4()))
        .collect();

    let (workflow_id, pre_workflow_id) = match parent {
        ParentRef::Workflow(id) => (Some(id), None),
        ParentRef::PreWorkflow(id) => (None, Some(id)),
    };

    let mut nodes = Vec::with_capacity(templates.len());
    for template in templates {
        let resolved_expr = match expressions.get(&template.id) {
            Some(expr) => Some(unlock::resolve(expr, &template_to_instance)?),
            None => None,
        };
        let resolved_deps: Vec<Uuid> = template
            .depends_on
            .0
            .iter()
            .map(|dep| {
                template_to_instance.get(dep).copied().ok_or_else(|| {
                    AppError::Internal(format!("Dependency {} missing from instance map", dep))
                })
            })
            .collect::<AppResult<_>>()?;

        nodes.push(WorkflowNode {
            id: template_to_instance[&template.id],
            workflow_id,
            pre_workflow_id,
            node_template_id: template.id,
            state: NodeState::Locked,
            extended_state: None,
            outcome: None,
            depends_on: Json(resolved_deps),
            unlock_configuration: resolved_expr.map(Json),
            local_store: Json(Map::new()),
            created_at: now,
            updated_at: now,
        });
    }

    // Promote nodes whose unlock rule is trivially satisfied.
    let facts: HashMap<Uuid, SiblingFacts> = nodes
        .iter()
        .map(|n| {
            (
                n.id,
                SiblingFacts {
                    state: n.state,
                    outcome: None,
                },
            )
        })
        .collect();
    let promote: Vec<Uuid> = nodes
        .iter()
        .filter(|n| n.unlock().is_satisfied(&facts))
        .map(|n| n.id)
        .collect();
    for node in &mut nodes {
        if promote.contains(&node.id) {
            node.state = NodeState::Ready;
        }
    }

    let end_node_id = match end_node_template_id {
        Some(template_id) => Some(
            template_to_instance
                .get(&template_id)
                .copied()
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "End node template {} is not part of the template",
                        template_id
                    ))
                })?,
        ),
        None => None,
    };

    Ok(InstantiatedNodes {
        nodes,
        template_to_instance,
        end_node_id,
    })
}

/// Dependency edges (legacy list, or expression references when an
/// expression is present) must admit a topological order.
fn reject_dependency_cycles(
    templates: &[NodeTemplate],
    expressions: &HashMap<Uuid, UnlockExpr>,
) -> AppResult<()> {
    let mut graph = DiGraph::<Uuid, ()>::new();
    let mut index = HashMap::new();
    for template in templates {
        index.insert(template.id, graph.add_node(template.id));
    }

    for template in templates {
        let dependencies: Vec<Uuid> = match expressions.get(&template.id) {
            Some(expr) => expr.referenced_template_ids(),
            None => template.depends_on.0.clone(),
        };
        for dep in dependencies {
            graph.add_edge(index[&dep], index[&template.id], ());
        }
    }

    toposort(&graph, None).map_err(|cycle| {
        AppError::Validation(format!(
            "Dependency cycle through node template {}",
            graph[cycle.node_id()]
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NodeType;
    use serde_json::json;

    fn template_id(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    fn template(
        n: u8,
        depends_on: Vec<Uuid>,
        unlock: Option<serde_json::Value>,
    ) -> NodeTemplate {
        NodeTemplate {
            id: template_id(n),
            name: format!("node-{}", n),
            node_type: NodeType::SimpleForm,
            config: Json(json!({})),
            depends_on: Json(depends_on),
            unlock_configuration: unlock.map(Json),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_dependency_nodes_start_ready() {
        let templates = vec![
            template(1, vec![], None),
            template(2, vec![template_id(1)], None),
        ];
        let result = instantiate_nodes(
            &templates,
            None,
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .unwrap();

        let by_template: HashMap<Uuid, &WorkflowNode> = result
            .nodes
            .iter()
            .map(|n| (n.node_template_id, n))
            .collect();
        assert_eq!(by_template[&template_id(1)].state, NodeState::Ready);
        assert_eq!(by_template[&template_id(2)].state, NodeState::Locked);
        assert_eq!(result.ready_nodes().len(), 1);
    }

    #[test]
    fn test_dependencies_resolved_to_instance_ids() {
        let templates = vec![
            template(1, vec![], None),
            template(2, vec![template_id(1)], None),
        ];
        let result = instantiate_nodes(
            &templates,
            None,
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .unwrap();

        let dependent = result
            .nodes
            .iter()
            .find(|n| n.node_template_id == template_id(2))
            .unwrap();
        assert_eq!(
            dependent.depends_on.0,
            vec![result.template_to_instance[&template_id(1)]]
        );
    }

    #[test]
    fn test_unlock_expression_resolved_and_locked() {
        let templates = vec![
            template(1, vec![], None),
            template(
                2,
                vec![],
                Some(json!({"nodeTemplateId": template_id(1), "state": "COMPLETED"})),
            ),
        ];
        let result = instantiate_nodes(
            &templates,
            None,
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .unwrap();

        let gated = result
            .nodes
            .iter()
            .find(|n| n.node_template_id == template_id(2))
            .unwrap();
        assert_eq!(gated.state, NodeState::Locked);
        let Json(UnlockExpr::Leaf(leaf)) = gated.unlock_configuration.as_ref().unwrap() else {
            panic!("expected resolved leaf");
        };
        assert_eq!(
            leaf.node_id,
            Some(result.template_to_instance[&template_id(1)])
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let templates = vec![
            template(1, vec![template_id(2)], None),
            template(2, vec![template_id(1)], None),
        ];
        let err = instantiate_nodes(
            &templates,
            None,
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::shared::ErrorKind::Validation);
    }

    #[test]
    fn test_self_dependency_rejected() {
        let templates = vec![template(1, vec![template_id(1)], None)];
        assert!(instantiate_nodes(
            &templates,
            None,
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .is_err());
    }

    #[test]
    fn test_dependency_outside_template_rejected() {
        let templates = vec![template(1, vec![template_id(9)], None)];
        assert!(instantiate_nodes(
            &templates,
            None,
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .is_err());
    }

    #[test]
    fn test_end_node_resolution() {
        let templates = vec![
            template(1, vec![], None),
            template(2, vec![template_id(1)], None),
        ];
        let result = instantiate_nodes(
            &templates,
            Some(template_id(2)),
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            result.end_node_id,
            Some(result.template_to_instance[&template_id(2)])
        );

        // end node outside the template set
        let err = instantiate_nodes(
            &templates,
            Some(template_id(9)),
            ParentRef::Workflow(Uuid::new_v4()),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::shared::ErrorKind::Validation);
    }

    #[test]
    fn test_pre_workflow_parent_column() {
        let parent_id = Uuid::new_v4();
        let templates = vec![template(1, vec![], None)];
        let result =
            instantiate_nodes(&templates, None, ParentRef::PreWorkflow(parent_id), Utc::now())
                .unwrap();
        let node = &result.nodes[0];
        assert_eq!(node.pre_workflow_id, Some(parent_id));
        assert_eq!(node.workflow_id, None);
        assert!(node.parent().is_ok());
    }
}

//! Node state machine and the plugin FSM table.
//!
//! The node lifecycle (`Locked → Ready → InProgress → Completed/Failed`)
//! is a fixed machine gated by [`is_legal_transition`]. Each plugin runs
//! a nested sub-machine described by a [`PluginFsm`] transition table;
//! its terminal substates drive the node's own terminal state.

use std::collections::HashMap;

use crate::domain::entities::NodeState;
use crate::shared::{AppError, AppResult};

/// Legal node transitions.
///
/// `Locked → Completed` directly and `Completed → anything` are
/// forbidden; `Failed → InProgress` allows plugin retries.
pub fn is_legal_transition(from: NodeState, to: NodeState) -> bool {
    use NodeState::*;
    matches!(
        (from, to),
        (Locked, Ready)
            | (Ready, InProgress)
            | (Ready, Completed)
            | (Ready, Failed)
            | (InProgress, Completed)
            | (InProgress, Failed)
            | (Failed, InProgress)
    )
}

/// Gate a node transition, surfacing illegal moves as validation errors.
pub fn check_transition(from: NodeState, to: NodeState) -> AppResult<()> {
    if is_legal_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Illegal node transition: {} -> {}",
            from, to
        )))
    }
}

/// Plugin state at node creation, before the plugin has started.
pub const PLUGIN_STATE_INITIAL: &str = "";

/// Result of taking one plugin FSM edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub plugin_state: String,
    /// Node-state side effect of the edge, if any.
    pub node_state: Option<NodeState>,
}

/// A plugin's nested sub-state machine as a transition table keyed by
/// `(plugin state, action)`.
#[derive(Debug, Clone)]
pub struct PluginFsm {
    name: &'static str,
    transitions: HashMap<(String, String), TransitionOutcome>,
}

impl PluginFsm {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            transitions: HashMap::new(),
        }
    }

    /// Builder-style edge registration.
    pub fn edge(
        mut self,
        from: &str,
        action: &str,
        to: &str,
        node_state: Option<NodeState>,
    ) -> Self {
        let replaced = self.transitions.insert(
            (from.to_string(), action.to_string()),
            TransitionOutcome {
                plugin_state: to.to_string(),
                node_state,
            },
        );
        assert!(
            replaced.is_none(),
            "duplicate FSM edge ({}, {}) in {}",
            from,
            action,
            self.name
        );
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Pure table lookup.
    pub fn can_transition(&self, from: &str, action: &str) -> bool {
        self.lookup(from, action).is_some()
    }

    pub fn lookup(&self, from: &str, action: &str) -> Option<&TransitionOutcome> {
        self.transitions
            .get(&(from.to_string(), action.to_string()))
    }

    /// Look up an edge, surfacing a missing one as a validation error.
    pub fn resolve(&self, from: &str, action: &str) -> AppResult<&TransitionOutcome> {
        self.lookup(from, action).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid {} transition: action {} is not allowed in state {:?}",
                self.name, action, from
            ))
        })
    }
}

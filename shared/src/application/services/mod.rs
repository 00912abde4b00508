pub mod instantiation;
pub mod pre_workflow_service;
pub mod propagation;
pub mod workflow_service;

pub use crate::application::plugins::EngineDeps;
pub use instantiation::{instantiate_nodes, InstantiatedNodes, ParentRef};
pub use pre_workflow_service::{CreatePreWorkflowRequest, PreWorkflowService};
pub use propagation::{CompletionStamp, NodePropagator, PropagationResult};
pub use workflow_service::{
    CreateWorkflowRequest, NodeStateUpdate, UpdateNodeStateRequest, WorkflowService,
};

use once_cell::sync::Lazy;

use crate::application::plugins::{event_barrier, form};
use crate::domain::entities::NodeType;
use crate::domain::state_machine::PluginFsm;

static FORM_FSM: Lazy<PluginFsm> = Lazy::new(form::form_fsm);
static BARRIER_FSM: Lazy<PluginFsm> = Lazy::new(event_barrier::barrier_fsm);

/// The FSM table driving a node of the given type.
pub fn plugin_fsm_for(node_type: NodeType) -> PluginFsm {
    match node_type {
        NodeType::SimpleForm => FORM_FSM.clone(),
        NodeType::EventBarrier => BARRIER_FSM.clone(),
    }
}

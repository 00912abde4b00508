pub mod form_definition;
pub mod goods_code;
pub mod pre_workflow;
pub mod principal_context;
pub mod workflow_instance;
pub mod workflow_node;
pub mod workflow_template;

pub use form_definition::FormDefinition;
pub use goods_code::GoodsCode;
pub use pre_workflow::{PreWorkflowInstance, PreWorkflowSummary, PreWorkflowTemplate};
pub use principal_context::PrincipalContext;
pub use workflow_instance::{
    ConsignmentItem, TradeFlow, WorkflowInstance, WorkflowState, WorkflowSummary,
};
pub use workflow_node::{NodeParent, NodeState, WorkflowNode};
pub use workflow_template::{NodeTemplate, NodeType, TemplateMap, WorkflowTemplate};

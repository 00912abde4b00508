//! Template Repository Trait
//!
//! Read-only template lookups: the engine consumes templates, it never
//! authors them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{
    NodeTemplate, PreWorkflowTemplate, TemplateMap, TradeFlow, WorkflowTemplate,
};
use crate::shared::AppResult;

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn workflow_template_by_id(&self, id: Uuid) -> AppResult<Option<WorkflowTemplate>>;

    async fn pre_workflow_template_by_id(
        &self,
        id: Uuid,
    ) -> AppResult<Option<PreWorkflowTemplate>>;

    /// Node templates for the given ids, in the same order.
    async fn node_templates_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<NodeTemplate>>;

    async fn node_template_by_id(&self, id: Uuid) -> AppResult<Option<NodeTemplate>>;

    /// The unique `(goods code, flow)` mapping, if any.
    async fn template_map_for(
        &self,
        goods_code_id: Uuid,
        flow: TradeFlow,
    ) -> AppResult<Option<TemplateMap>>;
}

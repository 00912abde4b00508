//! Form Repository Trait
//!
//! The schema registry as seen by the engine: a read-only lookup.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::FormDefinition;
use crate::shared::AppResult;

#[async_trait]
pub trait FormRepository: Send + Sync {
    async fn form_by_id(&self, id: Uuid) -> AppResult<Option<FormDefinition>>;
}

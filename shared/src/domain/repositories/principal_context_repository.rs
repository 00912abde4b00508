//! Principal Context Repository Trait

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::PgTx;
use crate::domain::entities::PrincipalContext;
use crate::shared::AppResult;

#[async_trait]
pub trait PrincipalContextRepository: Send + Sync {
    async fn by_principal_id(&self, principal_id: Uuid) -> AppResult<Option<PrincipalContext>>;

    /// Upsert + map-merge under a row lock: read `FOR UPDATE`, overwrite
    /// per key, write back; create the row when the principal has none.
    async fn merge(
        &self,
        tx: &mut PgTx<'_>,
        principal_id: Uuid,
        patch: &Map<String, Value>,
    ) -> AppResult<PrincipalContext>;
}

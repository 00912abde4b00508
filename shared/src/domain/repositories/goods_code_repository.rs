//! Goods Code Repository Trait

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::GoodsCode;
use crate::shared::AppResult;

#[async_trait]
pub trait GoodsCodeRepository: Send + Sync {
    async fn by_id(&self, id: Uuid) -> AppResult<Option<GoodsCode>>;

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<GoodsCode>>;
}

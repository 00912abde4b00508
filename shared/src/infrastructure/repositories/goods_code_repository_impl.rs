//! PostgreSQL implementation of the goods-code reference lookup.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::GoodsCode;
use crate::domain::repositories::GoodsCodeRepository;
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

pub struct GoodsCodeRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl GoodsCodeRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl GoodsCodeRepository for GoodsCodeRepositoryImpl {
    async fn by_id(&self, id: Uuid) -> AppResult<Option<GoodsCode>> {
        sqlx::query_as::<_, GoodsCode>(
            "SELECT id, code, description, category, created_at, updated_at \
             FROM goods_codes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.database_service.pool())
        .await
        .map_db_error("fetch", "goods_code")
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<GoodsCode>> {
        assert!(limit > 0, "Limit must be positive");
        sqlx::query_as::<_, GoodsCode>(
            "SELECT id, code, description, category, created_at, updated_at \
             FROM goods_codes ORDER BY code LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.database_service.pool())
        .await
        .map_db_error("list", "goods_codes")
    }
}

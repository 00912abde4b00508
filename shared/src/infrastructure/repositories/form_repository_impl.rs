//! PostgreSQL implementation of the schema-registry lookup.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::FormDefinition;
use crate::domain::repositories::FormRepository;
use crate::infrastructure::database::{DatabaseService, RepositoryErrorExt};
use crate::shared::AppResult;

pub struct FormRepositoryImpl {
    database_service: Arc<DatabaseService>,
}

impl FormRepositoryImpl {
    pub fn new(database_service: Arc<DatabaseService>) -> Self {
        Self { database_service }
    }
}

#[async_trait]
impl FormRepository for FormRepositoryImpl {
    async fn form_by_id(&self, id: Uuid) -> AppResult<Option<FormDefinition>> {
        sqlx::query_as::<_, FormDefinition>(
            "SELECT id, name, description, schema, ui_schema, version, is_active, \
                    created_at, updated_at \
             FROM forms \
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .fetch_optional(self.database_service.pool())
        .await
        .map_db_error("fetch", "form")
    }
}

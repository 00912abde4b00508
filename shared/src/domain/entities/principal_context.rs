use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

/// Persistent per-principal context row. Completed pre-workflows merge
/// their trader context into this map (per-key overwrite, never delete).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalContext {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub context: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

/// A form definition from the schema registry. Read-only to the engine.
///
/// Schema leaves may be annotated with `{"readFrom": key}` (pre-populate
/// the field from the workflow-level context) or `{"writeTo": key}` (copy
/// the submitted value back into the context).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub schema: Json<Value>,
    pub ui_schema: Json<Value>,
    pub version: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single user's useful / not-useful judgment about one prompt.
///
/// Rows are append-only and unique per (user, prompt); the database index
/// enforces that under concurrent inserts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt_id: Uuid,
    pub is_useful: bool,
    pub feedback: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Verification {
    pub fn new(user_id: Uuid, prompt_id: Uuid, is_useful: bool, feedback: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            prompt_id,
            is_useful,
            feedback,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// License minted for a verifier after a positive verification of an
/// on-chain prompt. Written best-effort; absence never indicates a failed
/// verification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub buyer_id: Uuid,
    pub story_license_id: String,
    pub tx_hash: String,
    pub created_at: NaiveDateTime,
}

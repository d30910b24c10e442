use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User model representing an account indexed by wallet address.
///
/// `reputation_points` is written only through the atomic increment in the
/// reputation ledger; `nickname` may be set exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub wallet_address: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub reputation_points: i32,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Create a new User (typically used for creating from API input)
    pub fn new(wallet_address: Option<String>, email: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address,
            email,
            nickname: None,
            reputation_points: 0,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Public projection embedded in prompt and verification responses
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            wallet_address: self.wallet_address.clone(),
            nickname: self.nickname.clone(),
            reputation_points: self.reputation_points,
        }
    }
}

/// Public user fields exposed alongside prompts and verifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub wallet_address: Option<String>,
    pub nickname: Option<String>,
    pub reputation_points: i32,
}

/// Leaderboard row: a user ranked by reputation with activity counts
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CreatorRank {
    pub id: Uuid,
    pub wallet_address: Option<String>,
    pub nickname: Option<String>,
    pub reputation_points: i32,
    pub prompt_count: i64,
    pub verification_count: i64,
}

use crate::error::RepositoryError;
use crate::models::{UserSummary, Verification};
use crate::repositories::VerificationStore;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const VERIFICATION_COLUMNS: &str = "id, user_id, prompt_id, is_useful, feedback, created_at";

/// Joined row carrying the verifier summary
#[derive(FromRow)]
struct VerificationWithUserRow {
    id: Uuid,
    user_id: Uuid,
    prompt_id: Uuid,
    is_useful: bool,
    feedback: Option<String>,
    created_at: NaiveDateTime,
    verifier_wallet_address: Option<String>,
    verifier_nickname: Option<String>,
    verifier_reputation_points: i32,
}

impl VerificationWithUserRow {
    fn split(self) -> (Verification, UserSummary) {
        let verifier = UserSummary {
            id: self.user_id,
            wallet_address: self.verifier_wallet_address,
            nickname: self.verifier_nickname,
            reputation_points: self.verifier_reputation_points,
        };
        let verification = Verification {
            id: self.id,
            user_id: self.user_id,
            prompt_id: self.prompt_id,
            is_useful: self.is_useful,
            feedback: self.feedback,
            created_at: self.created_at,
        };
        (verification, verifier)
    }
}

/// Repository for the append-only verification ledger
pub struct VerificationRepository {
    pool: PgPool,
}

impl VerificationRepository {
    /// Create a new VerificationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationStore for VerificationRepository {
    async fn create(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
        is_useful: bool,
        feedback: Option<String>,
    ) -> Result<Verification, RepositoryError> {
        // The (user_id, prompt_id) unique index rejects duplicates here even
        // when two submissions race past the application pre-check; the
        // 23505 surfaces as RepositoryError::Duplicate.
        let verification = sqlx::query_as::<_, Verification>(&format!(
            "INSERT INTO verifications (user_id, prompt_id, is_useful, feedback) \
             VALUES ($1, $2, $3, $4) RETURNING {VERIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(prompt_id)
        .bind(is_useful)
        .bind(feedback)
        .fetch_one(&self.pool)
        .await?;

        Ok(verification)
    }

    async fn find_unique(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
    ) -> Result<Option<Verification>, RepositoryError> {
        let verification = sqlx::query_as::<_, Verification>(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM verifications WHERE user_id = $1 AND prompt_id = $2"
        ))
        .bind(user_id)
        .bind(prompt_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(verification)
    }

    async fn list_for_prompt(
        &self,
        prompt_id: Uuid,
    ) -> Result<Vec<(Verification, UserSummary)>, RepositoryError> {
        let rows = sqlx::query_as::<_, VerificationWithUserRow>(
            r#"
            SELECT v.id, v.user_id, v.prompt_id, v.is_useful, v.feedback, v.created_at,
                   u.wallet_address AS verifier_wallet_address,
                   u.nickname AS verifier_nickname,
                   u.reputation_points AS verifier_reputation_points
            FROM verifications v
            JOIN users u ON u.id = v.user_id
            WHERE v.prompt_id = $1
            ORDER BY v.created_at DESC
            "#,
        )
        .bind(prompt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(VerificationWithUserRow::split)
            .collect())
    }
}

use crate::error::RepositoryError;
use crate::models::{CreatorRank, User};
use crate::repositories::UserStore;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, wallet_address, email, nickname, reputation_points, created_at";

/// Repository for user data access and the reputation ledger
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user keyed by wallet address
    async fn create_by_wallet(&self, wallet_address: &str) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (wallet_address) VALUES ($1) RETURNING {USER_COLUMNS}"
        ))
        .bind(wallet_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE wallet_address = $1"
        ))
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_or_create_by_wallet(
        &self,
        wallet_address: &str,
    ) -> Result<User, RepositoryError> {
        // Try to find existing user first
        if let Some(user) = self.find_by_wallet(wallet_address).await? {
            return Ok(user);
        }

        // Create new user if not found; a concurrent creation for the same
        // wallet trips the unique index, in which case re-read the winner.
        match self.create_by_wallet(wallet_address).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::Duplicate(_)) => self
                .find_by_wallet(wallet_address)
                .await?
                .ok_or_else(|| RepositoryError::NotFound("User not found".to_string())),
            Err(e) => Err(e),
        }
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE nickname = $1"
        ))
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_nickname(&self, id: Uuid, nickname: &str) -> Result<User, RepositoryError> {
        // The WHERE clause keeps the nickname write-once even if two requests
        // race past the service-level check.
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET nickname = $2 WHERE id = $1 AND nickname IS NULL RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| {
            RepositoryError::BusinessRule("Username is already set and cannot be changed".to_string())
        })
    }

    async fn add_reputation(&self, id: Uuid, amount: i32) -> Result<User, RepositoryError> {
        // Single-statement atomic add; concurrent awards never lose updates
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET reputation_points = reputation_points + $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))
    }

    async fn top_by_reputation(&self, limit: i64) -> Result<Vec<CreatorRank>, RepositoryError> {
        let rows = sqlx::query_as::<_, CreatorRank>(
            r#"
            SELECT u.id, u.wallet_address, u.nickname, u.reputation_points,
                   (SELECT COUNT(*) FROM prompts p WHERE p.creator_id = u.id) AS prompt_count,
                   (SELECT COUNT(*) FROM verifications v WHERE v.user_id = u.id) AS verification_count
            FROM users u
            ORDER BY u.reputation_points DESC, u.created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

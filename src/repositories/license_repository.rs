use crate::error::RepositoryError;
use crate::models::License;
use crate::repositories::LicenseStore;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const LICENSE_COLUMNS: &str = "id, prompt_id, buyer_id, story_license_id, tx_hash, created_at";

/// Repository for license receipts
pub struct LicenseRepository {
    pool: PgPool,
}

impl LicenseRepository {
    /// Create a new LicenseRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenseStore for LicenseRepository {
    async fn create(
        &self,
        prompt_id: Uuid,
        buyer_id: Uuid,
        story_license_id: &str,
        tx_hash: &str,
    ) -> Result<License, RepositoryError> {
        let license = sqlx::query_as::<_, License>(&format!(
            "INSERT INTO licenses (prompt_id, buyer_id, story_license_id, tx_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {LICENSE_COLUMNS}"
        ))
        .bind(prompt_id)
        .bind(buyer_id)
        .bind(story_license_id)
        .bind(tx_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(license)
    }

    async fn exists_for_buyer(
        &self,
        prompt_id: Uuid,
        buyer_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM licenses WHERE prompt_id = $1 AND buyer_id = $2 LIMIT 1")
                .bind(prompt_id)
                .bind(buyer_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some())
    }
}

use crate::error::RepositoryError;
use crate::models::{NewPrompt, Prompt, UserSummary};
use crate::repositories::PromptStore;
use crate::scoring::{self, Judgment, ScoreSummary};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const PROMPT_COLUMNS: &str = "id, creator_id, parent_prompt_id, title, description, prompt_text, \
     category, license_type, story_ip_id, story_license_terms_id, trust_score, \
     effectiveness_score, verification_count, is_listed, created_at";

/// Joined row used by listing queries
#[derive(FromRow)]
struct PromptWithCreatorRow {
    id: Uuid,
    creator_id: Uuid,
    parent_prompt_id: Option<Uuid>,
    title: String,
    description: String,
    prompt_text: String,
    category: String,
    license_type: String,
    story_ip_id: Option<String>,
    story_license_terms_id: Option<String>,
    trust_score: f64,
    effectiveness_score: f64,
    verification_count: i32,
    is_listed: bool,
    created_at: NaiveDateTime,
    creator_wallet_address: Option<String>,
    creator_nickname: Option<String>,
    creator_reputation_points: i32,
}

impl PromptWithCreatorRow {
    fn split(self) -> (Prompt, UserSummary) {
        let creator = UserSummary {
            id: self.creator_id,
            wallet_address: self.creator_wallet_address,
            nickname: self.creator_nickname,
            reputation_points: self.creator_reputation_points,
        };
        let prompt = Prompt {
            id: self.id,
            creator_id: self.creator_id,
            parent_prompt_id: self.parent_prompt_id,
            title: self.title,
            description: self.description,
            prompt_text: self.prompt_text,
            category: self.category,
            license_type: self.license_type,
            story_ip_id: self.story_ip_id,
            story_license_terms_id: self.story_license_terms_id,
            trust_score: self.trust_score,
            effectiveness_score: self.effectiveness_score,
            verification_count: self.verification_count,
            is_listed: self.is_listed,
            created_at: self.created_at,
        };
        (prompt, creator)
    }
}

/// Row feeding the score recalculator
#[derive(FromRow)]
struct JudgmentRow {
    is_useful: bool,
    reputation_points: i32,
}

fn joined_select(where_and_order: &str) -> String {
    format!(
        "SELECT p.{}, \
                u.wallet_address AS creator_wallet_address, \
                u.nickname AS creator_nickname, \
                u.reputation_points AS creator_reputation_points \
         FROM prompts p JOIN users u ON u.id = p.creator_id {}",
        PROMPT_COLUMNS.replace(", ", ", p."),
        where_and_order
    )
}

/// Repository for prompt data access. Owns the three derived score fields:
/// `recompute_scores` is their only writer.
pub struct PromptRepository {
    pool: PgPool,
}

impl PromptRepository {
    /// Create a new PromptRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromptStore for PromptRepository {
    async fn create(&self, prompt: NewPrompt) -> Result<Prompt, RepositoryError> {
        let created = sqlx::query_as::<_, Prompt>(&format!(
            "INSERT INTO prompts \
                 (creator_id, parent_prompt_id, title, description, prompt_text, category, license_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PROMPT_COLUMNS}"
        ))
        .bind(prompt.creator_id)
        .bind(prompt.parent_prompt_id)
        .bind(&prompt.title)
        .bind(&prompt.description)
        .bind(&prompt.prompt_text)
        .bind(&prompt.category)
        .bind(&prompt.license_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Prompt>, RepositoryError> {
        let prompt = sqlx::query_as::<_, Prompt>(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(prompt)
    }

    async fn marketplace(&self) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError> {
        let rows = sqlx::query_as::<_, PromptWithCreatorRow>(&joined_select(
            "WHERE p.is_listed = TRUE ORDER BY p.created_at DESC",
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PromptWithCreatorRow::split).collect())
    }

    async fn find_by_creator(&self, creator_id: Uuid) -> Result<Vec<Prompt>, RepositoryError> {
        let prompts = sqlx::query_as::<_, Prompt>(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE creator_id = $1 ORDER BY created_at DESC"
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prompts)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Prompt not found".to_string()));
        }

        Ok(())
    }

    async fn set_story_anchor(
        &self,
        id: Uuid,
        story_ip_id: &str,
        story_license_terms_id: &str,
    ) -> Result<Prompt, RepositoryError> {
        let prompt = sqlx::query_as::<_, Prompt>(&format!(
            "UPDATE prompts SET story_ip_id = $2, story_license_terms_id = $3 \
             WHERE id = $1 RETURNING {PROMPT_COLUMNS}"
        ))
        .bind(id)
        .bind(story_ip_id)
        .bind(story_license_terms_id)
        .fetch_optional(&self.pool)
        .await?;

        prompt.ok_or_else(|| RepositoryError::NotFound("Prompt not found".to_string()))
    }

    async fn recompute_scores(&self, prompt_id: Uuid) -> Result<ScoreSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes recomputes per prompt; two concurrent
        // verifications cannot both read a stale set and write stale scores.
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM prompts WHERE id = $1 FOR UPDATE")
                .bind(prompt_id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            return Err(RepositoryError::NotFound("Prompt not found".to_string()));
        }

        let rows = sqlx::query_as::<_, JudgmentRow>(
            r#"
            SELECT v.is_useful, u.reputation_points
            FROM verifications v
            JOIN users u ON u.id = v.user_id
            WHERE v.prompt_id = $1
            "#,
        )
        .bind(prompt_id)
        .fetch_all(&mut *tx)
        .await?;

        let judgments: Vec<Judgment> = rows
            .iter()
            .map(|r| Judgment {
                is_useful: r.is_useful,
                verifier_reputation: r.reputation_points,
            })
            .collect();

        let scores = scoring::recompute(&judgments);

        sqlx::query(
            "UPDATE prompts SET trust_score = $2, effectiveness_score = $3, verification_count = $4 \
             WHERE id = $1",
        )
        .bind(prompt_id)
        .bind(scores.trust_score)
        .bind(scores.effectiveness_score)
        .bind(scores.verification_count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(scores)
    }

    async fn most_useful(
        &self,
        limit: i64,
        min_verifications: i32,
    ) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError> {
        let rows = sqlx::query_as::<_, PromptWithCreatorRow>(&joined_select(
            "WHERE p.is_listed = TRUE AND p.verification_count >= $1 \
             ORDER BY p.trust_score DESC LIMIT $2",
        ))
        .bind(min_verifications)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PromptWithCreatorRow::split).collect())
    }

    async fn most_verified(
        &self,
        limit: i64,
    ) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError> {
        let rows = sqlx::query_as::<_, PromptWithCreatorRow>(&joined_select(
            "WHERE p.is_listed = TRUE ORDER BY p.verification_count DESC LIMIT $1",
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PromptWithCreatorRow::split).collect())
    }
}

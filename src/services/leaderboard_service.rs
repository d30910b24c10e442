use crate::error::{AppError, AppResult};
use crate::models::{CreatorRank, PromptWithCreator};
use crate::repositories::{PromptStore, UserStore};
use std::sync::Arc;

/// Default number of rows returned by leaderboard queries
pub const DEFAULT_LIMIT: i64 = 10;

/// Minimum verification count for the "most useful" ranking; filters out
/// prompts whose trust score rests on one or two judgments.
pub const DEFAULT_MIN_VERIFICATIONS: i32 = 3;

/// Read-only sorted projections over users and prompts
pub struct LeaderboardService {
    user_store: Arc<dyn UserStore>,
    prompt_store: Arc<dyn PromptStore>,
}

impl LeaderboardService {
    pub fn new(user_store: Arc<dyn UserStore>, prompt_store: Arc<dyn PromptStore>) -> Self {
        Self {
            user_store,
            prompt_store,
        }
    }

    /// Users ranked by reputation points descending
    pub async fn top_creators(&self, limit: i64) -> AppResult<Vec<CreatorRank>> {
        self.user_store
            .top_by_reputation(limit.max(0))
            .await
            .map_err(AppError::from)
    }

    /// Listed prompts with at least `min_verifications`, by trust score
    pub async fn most_useful_prompts(
        &self,
        limit: i64,
        min_verifications: i32,
    ) -> AppResult<Vec<PromptWithCreator>> {
        // Negative query values clamp to zero rather than reaching the store
        let rows = self
            .prompt_store
            .most_useful(limit.max(0), min_verifications.max(0))
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|(prompt, creator)| PromptWithCreator {
                prompt: prompt.summary(),
                creator,
            })
            .collect())
    }

    /// Listed prompts by verification count
    pub async fn most_verified_prompts(&self, limit: i64) -> AppResult<Vec<PromptWithCreator>> {
        let rows = self
            .prompt_store
            .most_verified(limit.max(0))
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|(prompt, creator)| PromptWithCreator {
                prompt: prompt.summary(),
                creator,
            })
            .collect())
    }
}

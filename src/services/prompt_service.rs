use crate::error::{AppError, AppResult};
use crate::models::{NewPrompt, Prompt, PromptSummary, PromptWithCreator, UserSummary};
use crate::repositories::{LicenseStore, PromptStore, UserStore};
use crate::scoring::ScoreSummary;
use crate::story_client::{IpMetadata, ReputationSnapshot, StoryGateway};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for prompt lifecycle: creation, listing, access control,
/// deletion and on-chain registration.
pub struct PromptService {
    user_store: Arc<dyn UserStore>,
    prompt_store: Arc<dyn PromptStore>,
    license_store: Arc<dyn LicenseStore>,
    story: Arc<dyn StoryGateway>,
}

/// Input accepted for creating a prompt
#[derive(Debug, Clone)]
pub struct CreatePromptInput {
    pub title: String,
    pub description: String,
    pub prompt_text: String,
    pub category: String,
    pub license_type: Option<String>,
    pub parent_prompt_id: Option<Uuid>,
}

/// Detail view with the prompt text gated by access
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDetail {
    #[serde(flatten)]
    pub prompt: PromptSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
    pub locked: bool,
    pub creator: UserSummary,
}

/// Result of registering a prompt on-chain
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub prompt: Prompt,
    pub ip_tx_hash: String,
    pub reputation_snapshot: ReputationSnapshot,
}

impl PromptService {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        prompt_store: Arc<dyn PromptStore>,
        license_store: Arc<dyn LicenseStore>,
        story: Arc<dyn StoryGateway>,
    ) -> Self {
        Self {
            user_store,
            prompt_store,
            license_store,
            story,
        }
    }

    /// Create a prompt, optionally as a remix of an existing parent
    pub async fn create_prompt(
        &self,
        creator_id: Uuid,
        input: CreatePromptInput,
    ) -> AppResult<Prompt> {
        if input.title.trim().is_empty()
            || input.description.trim().is_empty()
            || input.prompt_text.trim().is_empty()
            || input.category.trim().is_empty()
        {
            return Err(AppError::Validation("Missing required fields".into()));
        }

        // A remix must point at an existing parent; the parent link is set
        // only at creation, which keeps the derivation tree acyclic.
        if let Some(parent_id) = input.parent_prompt_id {
            self.prompt_store
                .find_by_id(parent_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::NotFound("Parent prompt not found".into()))?;
        }

        let prompt = self
            .prompt_store
            .create(NewPrompt {
                creator_id,
                parent_prompt_id: input.parent_prompt_id,
                title: input.title,
                description: input.description,
                prompt_text: input.prompt_text,
                category: input.category,
                license_type: input.license_type.unwrap_or_else(|| "ONE_TIME".to_string()),
            })
            .await
            .map_err(AppError::from)?;

        info!(prompt_id = %prompt.id, creator = %creator_id, "Created prompt");
        Ok(prompt)
    }

    /// Listed prompts for the marketplace, without prompt text
    pub async fn marketplace(&self) -> AppResult<Vec<PromptWithCreator>> {
        let rows = self.prompt_store.marketplace().await.map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .map(|(prompt, creator)| PromptWithCreator {
                prompt: prompt.summary(),
                creator,
            })
            .collect())
    }

    /// A creator's own prompts, including unlisted ones
    pub async fn user_prompts(&self, creator_id: Uuid) -> AppResult<Vec<Prompt>> {
        self.prompt_store
            .find_by_creator(creator_id)
            .await
            .map_err(AppError::from)
    }

    /// Fetch one prompt; the prompt text is included only for the creator
    /// or a license holder.
    pub async fn get_prompt(
        &self,
        prompt_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> AppResult<PromptDetail> {
        let prompt = self
            .prompt_store
            .find_by_id(prompt_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Prompt not found".into()))?;

        let creator = self
            .user_store
            .find_by_id(prompt.creator_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Creator not found".into()))?;

        let has_access = match viewer_id {
            Some(viewer) if viewer == prompt.creator_id => true,
            Some(viewer) => self
                .license_store
                .exists_for_buyer(prompt_id, viewer)
                .await
                .map_err(AppError::from)?,
            None => false,
        };

        let prompt_text = has_access.then(|| prompt.prompt_text.clone());

        Ok(PromptDetail {
            prompt: prompt.summary(),
            prompt_text,
            locked: !has_access,
            creator: creator.summary(),
        })
    }

    /// Delete a prompt. Only the creator may delete, and only while the
    /// prompt has no on-chain anchor.
    pub async fn delete_prompt(&self, prompt_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let prompt = self
            .prompt_store
            .find_by_id(prompt_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Prompt not found".into()))?;

        if prompt.creator_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this prompt".into(),
            ));
        }

        if prompt.is_on_chain() {
            return Err(AppError::Validation(
                "Cannot delete prompts registered on blockchain".into(),
            ));
        }

        self.prompt_store.delete(prompt_id).await.map_err(AppError::from)?;
        info!(%prompt_id, "Deleted prompt");
        Ok(())
    }

    /// Register a prompt as an IP asset, embedding a reputation snapshot in
    /// the on-chain metadata.
    pub async fn register_on_chain(
        &self,
        prompt_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<RegistrationOutcome> {
        let prompt = self
            .prompt_store
            .find_by_id(prompt_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Prompt not found".into()))?;

        if prompt.creator_id != user_id {
            return Err(AppError::Forbidden("Not authorized".into()));
        }

        if prompt.is_on_chain() {
            return Err(AppError::Validation(
                "Prompt already registered on-chain".into(),
            ));
        }

        let creator = self
            .user_store
            .find_by_id(prompt.creator_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Creator not found".into()))?;

        let reputation_snapshot = ReputationSnapshot::new(
            ScoreSummary {
                trust_score: prompt.trust_score,
                effectiveness_score: prompt.effectiveness_score,
                verification_count: prompt.verification_count,
            },
            creator.reputation_points,
        );

        let registration = self
            .story
            .register_ip(IpMetadata {
                name: prompt.title.clone(),
                description: prompt.description.clone(),
                category: prompt.category.clone(),
                license_type: prompt.license_type.clone(),
                reputation: reputation_snapshot.clone(),
            })
            .await?;

        let updated = self
            .prompt_store
            .set_story_anchor(prompt_id, &registration.ip_id, &registration.license_terms_id)
            .await
            .map_err(AppError::from)?;

        Ok(RegistrationOutcome {
            prompt: updated,
            ip_tx_hash: registration.tx_hash,
            reputation_snapshot,
        })
    }
}

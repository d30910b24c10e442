use crate::models::user::UserSummary;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Prompt model. `trust_score`, `effectiveness_score` and
/// `verification_count` are derived fields owned by the score recalculator;
/// nothing else writes them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub parent_prompt_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub prompt_text: String,
    pub category: String,
    pub license_type: String,
    pub story_ip_id: Option<String>,
    pub story_license_terms_id: Option<String>,
    pub trust_score: f64,
    pub effectiveness_score: f64,
    pub verification_count: i32,
    pub is_listed: bool,
    pub created_at: NaiveDateTime,
}

impl Prompt {
    /// True once the prompt has been anchored as an IP asset
    pub fn is_on_chain(&self) -> bool {
        self.story_ip_id.is_some()
    }

    /// Marketplace projection without the prompt text
    pub fn summary(&self) -> PromptSummary {
        PromptSummary {
            id: self.id,
            creator_id: self.creator_id,
            parent_prompt_id: self.parent_prompt_id,
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            license_type: self.license_type.clone(),
            story_ip_id: self.story_ip_id.clone(),
            trust_score: self.trust_score,
            effectiveness_score: self.effectiveness_score,
            verification_count: self.verification_count,
            created_at: self.created_at,
        }
    }
}

/// Listing row pairing a prompt summary with its creator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptWithCreator {
    #[serde(flatten)]
    pub prompt: PromptSummary,
    pub creator: UserSummary,
}

/// Input for creating a prompt
#[derive(Debug, Clone)]
pub struct NewPrompt {
    pub creator_id: Uuid,
    pub parent_prompt_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub prompt_text: String,
    pub category: String,
    pub license_type: String,
}

/// Listing projection that hides `prompt_text` from non-buyers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSummary {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub parent_prompt_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub license_type: String,
    pub story_ip_id: Option<String>,
    pub trust_score: f64,
    pub effectiveness_score: f64,
    pub verification_count: i32,
    pub created_at: NaiveDateTime,
}

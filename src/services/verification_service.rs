use crate::error::{AppError, AppResult};
use crate::models::{Prompt, UserSummary, Verification};
use crate::repositories::{LicenseStore, PromptStore, UserStore, VerificationStore};
use crate::scoring::{self, VerificationTally, REPUTATION_AWARD};
use crate::story_client::{LicenseReceipt, StoryGateway};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Service orchestrating the verification ledger, score recalculation and
/// the reputation ledger.
pub struct VerificationService {
    user_store: Arc<dyn UserStore>,
    prompt_store: Arc<dyn PromptStore>,
    verification_store: Arc<dyn VerificationStore>,
    license_store: Arc<dyn LicenseStore>,
    story: Arc<dyn StoryGateway>,
}

/// Result of a submitted verification: the created row, the recomputed
/// prompt snapshot, and the optional best-effort license receipt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub verification: Verification,
    pub prompt: Prompt,
    pub license: Option<LicenseReceipt>,
}

/// Verification listing plus the display tally
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationListing {
    pub verifications: Vec<VerificationEntry>,
    pub summary: VerificationTally,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationEntry {
    #[serde(flatten)]
    pub verification: Verification,
    pub user: UserSummary,
}

impl VerificationService {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        prompt_store: Arc<dyn PromptStore>,
        verification_store: Arc<dyn VerificationStore>,
        license_store: Arc<dyn LicenseStore>,
        story: Arc<dyn StoryGateway>,
    ) -> Self {
        Self {
            user_store,
            prompt_store,
            verification_store,
            license_store,
            story,
        }
    }

    /// Submit one verification for a prompt.
    ///
    /// Precondition order: prompt exists, verifier exists, verifier is not
    /// the creator, no prior verification by this verifier. The duplicate
    /// pre-check is a fast path; the store's unique constraint is the
    /// authority when two submissions race.
    pub async fn submit_verification(
        &self,
        prompt_id: Uuid,
        verifier_id: Uuid,
        is_useful: bool,
        feedback: Option<String>,
    ) -> AppResult<VerificationOutcome> {
        info!(%prompt_id, %verifier_id, is_useful, "Submitting verification");

        let prompt = self
            .prompt_store
            .find_by_id(prompt_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Prompt not found".into()))?;

        let verifier = self
            .user_store
            .find_by_id(verifier_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        // Self-verification never reaches the ledger
        if prompt.creator_id == verifier.id {
            return Err(AppError::Forbidden("Cannot verify your own prompt".into()));
        }

        if self
            .verification_store
            .find_unique(verifier.id, prompt_id)
            .await
            .map_err(AppError::from)?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You have already verified this prompt".into(),
            ));
        }

        // A racing duplicate insert surfaces here as Conflict via the
        // store's unique constraint.
        let verification = self
            .verification_store
            .create(verifier.id, prompt_id, is_useful, feedback)
            .await
            .map_err(AppError::from)?;

        // Recompute the derived scores from the full verification set
        self.prompt_store
            .recompute_scores(prompt_id)
            .await
            .map_err(AppError::from)?;

        // Award reputation to the creator for a positive verification only.
        // The creator was loaded with the prompt, so a missing row here is an
        // internal consistency error.
        if is_useful {
            self.user_store
                .add_reputation(prompt.creator_id, REPUTATION_AWARD)
                .await
                .map_err(|e| {
                    AppError::Message(format!(
                        "Reputation award failed for creator {}: {}",
                        prompt.creator_id, e
                    ))
                })?;
        }

        let license = self.issue_license_best_effort(&prompt, &verifier).await;

        let updated_prompt = self
            .prompt_store
            .find_by_id(prompt_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::Message("Prompt vanished during verification".into()))?;

        Ok(VerificationOutcome {
            verification,
            prompt: updated_prompt,
            license,
        })
    }

    /// Mint a verification license when the prompt is anchored on-chain.
    /// Failures are logged and swallowed: the verification row is already
    /// durable and must not be rolled back for an external error.
    async fn issue_license_best_effort(
        &self,
        prompt: &Prompt,
        verifier: &crate::models::User,
    ) -> Option<LicenseReceipt> {
        let (ip_id, terms_id) = match (&prompt.story_ip_id, &prompt.story_license_terms_id) {
            (Some(ip), Some(terms)) => (ip.as_str(), terms.as_str()),
            _ => return None,
        };

        let wallet = verifier.wallet_address.as_deref()?;

        match self.story.issue_license(ip_id, terms_id, wallet).await {
            Ok(receipt) => {
                if let Err(e) = self
                    .license_store
                    .create(prompt.id, verifier.id, &receipt.license_token_id, &receipt.tx_hash)
                    .await
                {
                    warn!(prompt_id = %prompt.id, error = %e, "Failed to record license receipt");
                }
                Some(receipt)
            }
            Err(e) => {
                warn!(prompt_id = %prompt.id, error = %e, "Failed to mint verification license");
                None
            }
        }
    }

    /// All verifications for a prompt plus the display tally. The tally uses
    /// the same trust formula as the recalculator, so it matches the
    /// persisted score for the same set.
    pub async fn verifications_for_prompt(
        &self,
        prompt_id: Uuid,
    ) -> AppResult<VerificationListing> {
        self.prompt_store
            .find_by_id(prompt_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("Prompt not found".into()))?;

        let rows = self
            .verification_store
            .list_for_prompt(prompt_id)
            .await
            .map_err(AppError::from)?;

        let useful_count = rows.iter().filter(|(v, _)| v.is_useful).count();
        let not_useful_count = rows.len() - useful_count;
        let summary = scoring::tally(useful_count, not_useful_count);

        let verifications = rows
            .into_iter()
            .map(|(verification, user)| VerificationEntry { verification, user })
            .collect();

        Ok(VerificationListing {
            verifications,
            summary,
        })
    }
}

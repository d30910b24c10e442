//! Data access layer.
//!
//! Each entity is accessed through a store trait so services receive an
//! injected capability set instead of a concrete database handle. Postgres
//! repositories implement the traits for production; [`memory::MemoryStore`]
//! implements all of them for tests.

pub mod license_repository;
pub mod memory;
pub mod prompt_repository;
pub mod user_repository;
pub mod verification_repository;

// Re-export all repositories for convenient access
pub use license_repository::LicenseRepository;
pub use memory::MemoryStore;
pub use prompt_repository::PromptRepository;
pub use user_repository::UserRepository;
pub use verification_repository::VerificationRepository;

use crate::error::RepositoryError;
use crate::models::{CreatorRank, License, NewPrompt, Prompt, User, UserSummary, Verification};
use crate::scoring::ScoreSummary;
use async_trait::async_trait;
use uuid::Uuid;

/// User access and the reputation ledger
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, RepositoryError>;

    /// Find or create a user by wallet address (first authenticated contact)
    async fn find_or_create_by_wallet(
        &self,
        wallet_address: &str,
    ) -> Result<User, RepositoryError>;

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError>;

    /// Set the nickname; callers must have checked it is not already set
    async fn set_nickname(&self, id: Uuid, nickname: &str) -> Result<User, RepositoryError>;

    /// Atomically add reputation points. Must be a single-statement add, not
    /// a read-modify-write, so concurrent awards for one creator never lose
    /// an update.
    async fn add_reputation(&self, id: Uuid, amount: i32) -> Result<User, RepositoryError>;

    /// Users ranked by reputation points descending
    async fn top_by_reputation(&self, limit: i64) -> Result<Vec<CreatorRank>, RepositoryError>;
}

/// Prompt access plus the score recalculator entry point
#[async_trait]
pub trait PromptStore: Send + Sync {
    async fn create(&self, prompt: NewPrompt) -> Result<Prompt, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Prompt>, RepositoryError>;

    /// Listed prompts, newest first, with creator summaries
    async fn marketplace(&self) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError>;

    async fn find_by_creator(&self, creator_id: Uuid) -> Result<Vec<Prompt>, RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// Record the on-chain anchor ids after successful registration
    async fn set_story_anchor(
        &self,
        id: Uuid,
        story_ip_id: &str,
        story_license_terms_id: &str,
    ) -> Result<Prompt, RepositoryError>;

    /// Recompute and persist the derived scores for one prompt.
    ///
    /// Implementations must serialize recomputes per prompt (row lock or
    /// equivalent) and write all three fields atomically; this is the only
    /// writer of those fields.
    async fn recompute_scores(&self, prompt_id: Uuid) -> Result<ScoreSummary, RepositoryError>;

    /// Listed prompts with at least `min_verifications`, by trust score desc
    async fn most_useful(
        &self,
        limit: i64,
        min_verifications: i32,
    ) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError>;

    /// Listed prompts by verification count desc
    async fn most_verified(&self, limit: i64)
        -> Result<Vec<(Prompt, UserSummary)>, RepositoryError>;
}

/// The append-only verification ledger
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Insert one verification. Returns [`RepositoryError::Duplicate`] when
    /// the (user, prompt) pair already exists; the store-level unique
    /// constraint is the source of truth under concurrent submissions.
    async fn create(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
        is_useful: bool,
        feedback: Option<String>,
    ) -> Result<Verification, RepositoryError>;

    /// Fast-path duplicate lookup for a (user, prompt) pair
    async fn find_unique(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
    ) -> Result<Option<Verification>, RepositoryError>;

    /// All verifications for a prompt, newest first, with verifier summaries
    async fn list_for_prompt(
        &self,
        prompt_id: Uuid,
    ) -> Result<Vec<(Verification, UserSummary)>, RepositoryError>;
}

/// Best-effort license receipts
#[async_trait]
pub trait LicenseStore: Send + Sync {
    async fn create(
        &self,
        prompt_id: Uuid,
        buyer_id: Uuid,
        story_license_id: &str,
        tx_hash: &str,
    ) -> Result<License, RepositoryError>;

    /// Whether the buyer holds a license for the prompt (access control)
    async fn exists_for_buyer(
        &self,
        prompt_id: Uuid,
        buyer_id: Uuid,
    ) -> Result<bool, RepositoryError>;
}

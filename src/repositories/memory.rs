//! In-memory store implementing every store trait.
//!
//! Used by the test suite to exercise the services without Postgres. The
//! single mutex gives the same guarantees the database provides: serialized
//! recomputes per prompt, atomic reputation adds, and duplicate rejection for
//! concurrent verification inserts.

use crate::error::RepositoryError;
use crate::models::{CreatorRank, License, NewPrompt, Prompt, User, UserSummary, Verification};
use crate::repositories::{LicenseStore, PromptStore, UserStore, VerificationStore};
use crate::scoring::{self, Judgment, ScoreSummary};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    prompts: Vec<Prompt>,
    verifications: Vec<Verification>,
    licenses: Vec<License>,
}

/// Cloneable handle over shared in-memory tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-write;
        // recover the data rather than cascading the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.wallet_address.as_deref() == Some(wallet_address))
            .cloned())
    }

    async fn find_or_create_by_wallet(
        &self,
        wallet_address: &str,
    ) -> Result<User, RepositoryError> {
        let mut inner = self.lock();
        if let Some(user) = inner
            .users
            .iter()
            .find(|u| u.wallet_address.as_deref() == Some(wallet_address))
        {
            return Ok(user.clone());
        }

        let user = User::new(Some(wallet_address.to_string()), None);
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.nickname.as_deref() == Some(nickname))
            .cloned())
    }

    async fn set_nickname(&self, id: Uuid, nickname: &str) -> Result<User, RepositoryError> {
        let mut inner = self.lock();
        if inner
            .users
            .iter()
            .any(|u| u.nickname.as_deref() == Some(nickname))
        {
            return Err(RepositoryError::Duplicate(
                "Username is already taken".to_string(),
            ));
        }

        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))?;

        if user.nickname.is_some() {
            return Err(RepositoryError::BusinessRule(
                "Username is already set and cannot be changed".to_string(),
            ));
        }

        user.nickname = Some(nickname.to_string());
        Ok(user.clone())
    }

    async fn add_reputation(&self, id: Uuid, amount: i32) -> Result<User, RepositoryError> {
        let mut inner = self.lock();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| RepositoryError::NotFound("User not found".to_string()))?;

        user.reputation_points += amount;
        Ok(user.clone())
    }

    async fn top_by_reputation(&self, limit: i64) -> Result<Vec<CreatorRank>, RepositoryError> {
        let inner = self.lock();
        let mut users: Vec<&User> = inner.users.iter().collect();
        // Stable sort keeps insertion order for reputation ties
        users.sort_by_key(|u| std::cmp::Reverse(u.reputation_points));

        Ok(users
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|u| CreatorRank {
                id: u.id,
                wallet_address: u.wallet_address.clone(),
                nickname: u.nickname.clone(),
                reputation_points: u.reputation_points,
                prompt_count: inner.prompts.iter().filter(|p| p.creator_id == u.id).count() as i64,
                verification_count: inner
                    .verifications
                    .iter()
                    .filter(|v| v.user_id == u.id)
                    .count() as i64,
            })
            .collect())
    }
}

#[async_trait]
impl PromptStore for MemoryStore {
    async fn create(&self, prompt: NewPrompt) -> Result<Prompt, RepositoryError> {
        let mut inner = self.lock();
        let created = Prompt {
            id: Uuid::new_v4(),
            creator_id: prompt.creator_id,
            parent_prompt_id: prompt.parent_prompt_id,
            title: prompt.title,
            description: prompt.description,
            prompt_text: prompt.prompt_text,
            category: prompt.category,
            license_type: prompt.license_type,
            story_ip_id: None,
            story_license_terms_id: None,
            trust_score: 0.0,
            effectiveness_score: 0.0,
            verification_count: 0,
            is_listed: true,
            created_at: chrono::Utc::now().naive_utc(),
        };
        inner.prompts.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Prompt>, RepositoryError> {
        Ok(self.lock().prompts.iter().find(|p| p.id == id).cloned())
    }

    async fn marketplace(&self) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .prompts
            .iter()
            .rev()
            .filter(|p| p.is_listed)
            .filter_map(|p| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == p.creator_id)
                    .map(|u| (p.clone(), u.summary()))
            })
            .collect())
    }

    async fn find_by_creator(&self, creator_id: Uuid) -> Result<Vec<Prompt>, RepositoryError> {
        Ok(self
            .lock()
            .prompts
            .iter()
            .rev()
            .filter(|p| p.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let before = inner.prompts.len();
        inner.prompts.retain(|p| p.id != id);
        if inner.prompts.len() == before {
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
        let mut inner = self.lock();
        let prompt = inner
            .prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepositoryError::NotFound("Prompt not found".to_string()))?;

        prompt.story_ip_id = Some(story_ip_id.to_string());
        prompt.story_license_terms_id = Some(story_license_terms_id.to_string());
        Ok(prompt.clone())
    }

    async fn recompute_scores(&self, prompt_id: Uuid) -> Result<ScoreSummary, RepositoryError> {
        // Holding the store lock for the whole recompute mirrors the
        // database row lock: reads and the score write are one atomic step.
        let mut inner = self.lock();

        let judgments: Vec<Judgment> = inner
            .verifications
            .iter()
            .filter(|v| v.prompt_id == prompt_id)
            .filter_map(|v| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == v.user_id)
                    .map(|u| Judgment {
                        is_useful: v.is_useful,
                        verifier_reputation: u.reputation_points,
                    })
            })
            .collect();

        let scores = scoring::recompute(&judgments);

        let prompt = inner
            .prompts
            .iter_mut()
            .find(|p| p.id == prompt_id)
            .ok_or_else(|| RepositoryError::NotFound("Prompt not found".to_string()))?;

        prompt.trust_score = scores.trust_score;
        prompt.effectiveness_score = scores.effectiveness_score;
        prompt.verification_count = scores.verification_count;

        Ok(scores)
    }

    async fn most_useful(
        &self,
        limit: i64,
        min_verifications: i32,
    ) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError> {
        let inner = self.lock();
        let mut prompts: Vec<&Prompt> = inner
            .prompts
            .iter()
            .filter(|p| p.is_listed && p.verification_count >= min_verifications)
            .collect();
        prompts.sort_by(|a, b| {
            b.trust_score
                .partial_cmp(&a.trust_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(prompts
            .into_iter()
            .take(limit.max(0) as usize)
            .filter_map(|p| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == p.creator_id)
                    .map(|u| (p.clone(), u.summary()))
            })
            .collect())
    }

    async fn most_verified(
        &self,
        limit: i64,
    ) -> Result<Vec<(Prompt, UserSummary)>, RepositoryError> {
        let inner = self.lock();
        let mut prompts: Vec<&Prompt> = inner.prompts.iter().filter(|p| p.is_listed).collect();
        prompts.sort_by_key(|p| std::cmp::Reverse(p.verification_count));

        Ok(prompts
            .into_iter()
            .take(limit.max(0) as usize)
            .filter_map(|p| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == p.creator_id)
                    .map(|u| (p.clone(), u.summary()))
            })
            .collect())
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
        is_useful: bool,
        feedback: Option<String>,
    ) -> Result<Verification, RepositoryError> {
        let mut inner = self.lock();
        // Uniqueness check and insert under one lock, matching the unique
        // index guarantee of the real store.
        if inner
            .verifications
            .iter()
            .any(|v| v.user_id == user_id && v.prompt_id == prompt_id)
        {
            return Err(RepositoryError::Duplicate(
                "duplicate key value violates unique constraint \"uq_verifications_user_prompt\""
                    .to_string(),
            ));
        }

        let verification = Verification::new(user_id, prompt_id, is_useful, feedback);
        inner.verifications.push(verification.clone());
        Ok(verification)
    }

    async fn find_unique(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
    ) -> Result<Option<Verification>, RepositoryError> {
        Ok(self
            .lock()
            .verifications
            .iter()
            .find(|v| v.user_id == user_id && v.prompt_id == prompt_id)
            .cloned())
    }

    async fn list_for_prompt(
        &self,
        prompt_id: Uuid,
    ) -> Result<Vec<(Verification, UserSummary)>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .verifications
            .iter()
            .rev()
            .filter(|v| v.prompt_id == prompt_id)
            .filter_map(|v| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == v.user_id)
                    .map(|u| (v.clone(), u.summary()))
            })
            .collect())
    }
}

#[async_trait]
impl LicenseStore for MemoryStore {
    async fn create(
        &self,
        prompt_id: Uuid,
        buyer_id: Uuid,
        story_license_id: &str,
        tx_hash: &str,
    ) -> Result<License, RepositoryError> {
        let mut inner = self.lock();
        let license = License {
            id: Uuid::new_v4(),
            prompt_id,
            buyer_id,
            story_license_id: story_license_id.to_string(),
            tx_hash: tx_hash.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        inner.licenses.push(license.clone());
        Ok(license)
    }

    async fn exists_for_buyer(
        &self,
        prompt_id: Uuid,
        buyer_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()
            .licenses
            .iter()
            .any(|l| l.prompt_id == prompt_id && l.buyer_id == buyer_id))
    }
}

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::repositories::UserStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Nickname length bounds (alphanumeric only)
const NICKNAME_MIN_LEN: usize = 3;
const NICKNAME_MAX_LEN: usize = 20;

/// Service for wallet identity and nickname management
pub struct AccountService {
    user_store: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    /// Resolve the caller from a wallet address, creating the account on
    /// first contact.
    pub async fn authenticate(&self, wallet_address: &str) -> AppResult<User> {
        if wallet_address.trim().is_empty() {
            return Err(AppError::Unauthorized("No wallet address provided".into()));
        }

        self.user_store
            .find_or_create_by_wallet(wallet_address)
            .await
            .map_err(AppError::from)
    }

    /// Set a nickname exactly once. 3-20 alphanumeric characters, unique
    /// across users, immutable once set.
    pub async fn set_nickname(&self, user_id: Uuid, nickname: &str) -> AppResult<User> {
        if !Self::is_valid_nickname(nickname) {
            return Err(AppError::Validation(
                "Username must be 3-20 characters and contain only letters and numbers".into(),
            ));
        }

        let user = self
            .user_store
            .find_by_id(user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if user.nickname.is_some() {
            return Err(AppError::Validation(
                "Username is already set and cannot be changed".into(),
            ));
        }

        if self
            .user_store
            .find_by_nickname(nickname)
            .await
            .map_err(AppError::from)?
            .is_some()
        {
            return Err(AppError::Conflict("Username is already taken".into()));
        }

        let updated = self
            .user_store
            .set_nickname(user_id, nickname)
            .await
            .map_err(AppError::from)?;

        info!(%user_id, nickname, "Nickname set");
        Ok(updated)
    }

    /// Whether a nickname is valid and unclaimed
    pub async fn nickname_available(&self, nickname: &str) -> AppResult<bool> {
        if !Self::is_valid_nickname(nickname) {
            return Ok(false);
        }

        Ok(self
            .user_store
            .find_by_nickname(nickname)
            .await
            .map_err(AppError::from)?
            .is_none())
    }

    fn is_valid_nickname(nickname: &str) -> bool {
        let len = nickname.chars().count();
        (NICKNAME_MIN_LEN..=NICKNAME_MAX_LEN).contains(&len)
            && nickname.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_validation() {
        assert!(AccountService::is_valid_nickname("abc"));
        assert!(AccountService::is_valid_nickname("User123"));
        assert!(!AccountService::is_valid_nickname("ab"));
        assert!(!AccountService::is_valid_nickname("a".repeat(21).as_str()));
        assert!(!AccountService::is_valid_nickname("has space"));
        assert!(!AccountService::is_valid_nickname("emoji🙂"));
        assert!(!AccountService::is_valid_nickname(""));
    }
}

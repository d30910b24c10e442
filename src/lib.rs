//! PrompIP Backend Library
//!
//! This module exposes the backend components for use by tests and other consumers.

pub mod config;
pub mod database;
pub mod error;
pub mod http;
pub mod models;
pub mod repositories;
pub mod scoring;
pub mod services;
pub mod story_client;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repositories::{
    LicenseRepository, LicenseStore, PromptRepository, PromptStore, UserRepository, UserStore,
    VerificationRepository, VerificationStore,
};
use services::{AccountService, LeaderboardService, PromptService, VerificationService};
use std::sync::Arc;
use story_client::StoryGateway;

/// Application state containing all repositories and services
pub struct AppState {
    pub account_service: AccountService,
    pub prompt_service: PromptService,
    pub verification_service: VerificationService,
    pub leaderboard_service: LeaderboardService,
}

impl AppState {
    /// Create a new AppState with Postgres-backed repositories
    pub fn new(pool: sqlx::PgPool, story: Arc<dyn StoryGateway>) -> Self {
        let user_store: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
        let prompt_store: Arc<dyn PromptStore> = Arc::new(PromptRepository::new(pool.clone()));
        let verification_store: Arc<dyn VerificationStore> =
            Arc::new(VerificationRepository::new(pool.clone()));
        let license_store: Arc<dyn LicenseStore> = Arc::new(LicenseRepository::new(pool));

        Self::with_stores(
            user_store,
            prompt_store,
            verification_store,
            license_store,
            story,
        )
    }

    /// Create an AppState over any store implementations. Tests use this
    /// with the in-memory store.
    pub fn with_stores(
        user_store: Arc<dyn UserStore>,
        prompt_store: Arc<dyn PromptStore>,
        verification_store: Arc<dyn VerificationStore>,
        license_store: Arc<dyn LicenseStore>,
        story: Arc<dyn StoryGateway>,
    ) -> Self {
        Self {
            account_service: AccountService::new(user_store.clone()),
            prompt_service: PromptService::new(
                user_store.clone(),
                prompt_store.clone(),
                license_store.clone(),
                story.clone(),
            ),
            verification_service: VerificationService::new(
                user_store.clone(),
                prompt_store.clone(),
                verification_store,
                license_store,
                story,
            ),
            leaderboard_service: LeaderboardService::new(user_store, prompt_store),
        }
    }
}

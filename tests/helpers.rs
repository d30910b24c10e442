use async_trait::async_trait;
use prompip_backend::config::StoryConfig;
use prompip_backend::error::{AppError, AppResult, RepositoryError};
use prompip_backend::models::{CreatorRank, Prompt, User};
use prompip_backend::repositories::{MemoryStore, PromptStore, UserStore};
use prompip_backend::services::prompt_service::CreatePromptInput;
use prompip_backend::story_client::{
    IpMetadata, IpRegistration, LicenseReceipt, StoryClient, StoryGateway,
};
use prompip_backend::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// Test application over the in-memory store and a simulated Story gateway
pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
}

impl TestApp {
    /// App with the simulated Story client (no gateway configured)
    pub fn new() -> Self {
        let story =
            StoryClient::with_config(StoryConfig::default()).expect("simulated client builds");
        Self::with_gateway(Arc::new(story))
    }

    /// App whose reputation writes always fail, other stores intact
    pub fn with_broken_reputation() -> Self {
        let store = MemoryStore::new();
        let shared = Arc::new(store.clone());
        let user_store = Arc::new(BrokenReputationStore(store.clone()));
        let story =
            StoryClient::with_config(StoryConfig::default()).expect("simulated client builds");
        let state = AppState::with_stores(
            user_store,
            shared.clone(),
            shared.clone(),
            shared,
            Arc::new(story),
        );
        Self { state, store }
    }

    pub fn with_gateway(story: Arc<dyn StoryGateway>) -> Self {
        let store = MemoryStore::new();
        let shared = Arc::new(store.clone());
        let state = AppState::with_stores(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
            story,
        );
        Self { state, store }
    }

    /// Create (or fetch) a user by wallet address
    pub async fn user(&self, wallet: &str) -> User {
        self.state
            .account_service
            .authenticate(wallet)
            .await
            .expect("authenticate")
    }

    /// Create a user with preloaded reputation points
    pub async fn user_with_reputation(&self, wallet: &str, reputation: i32) -> User {
        let user = self.user(wallet).await;
        if reputation > 0 {
            self.store
                .add_reputation(user.id, reputation)
                .await
                .expect("add reputation")
        } else {
            user
        }
    }

    /// Re-read a user from the store
    pub async fn reload_user(&self, id: Uuid) -> User {
        UserStore::find_by_id(&self.store, id)
            .await
            .expect("query user")
            .expect("user exists")
    }

    /// Re-read a prompt from the store, if it still exists
    pub async fn reload_prompt(&self, id: Uuid) -> Option<Prompt> {
        PromptStore::find_by_id(&self.store, id)
            .await
            .expect("query prompt")
    }

    /// Create a listed prompt for the given creator
    pub async fn prompt(&self, creator_id: Uuid, title: &str) -> Prompt {
        self.state
            .prompt_service
            .create_prompt(
                creator_id,
                CreatePromptInput {
                    title: title.to_string(),
                    description: format!("{} description", title),
                    prompt_text: "You are a helpful assistant. Summarize {{input}}.".to_string(),
                    category: "writing".to_string(),
                    license_type: None,
                    parent_prompt_id: None,
                },
            )
            .await
            .expect("create prompt")
    }
}

/// User store that delegates everything except reputation awards, which
/// fail as if the creator row vanished mid-flight
pub struct BrokenReputationStore(pub MemoryStore);

#[async_trait]
impl UserStore for BrokenReputationStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        UserStore::find_by_id(&self.0, id).await
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, RepositoryError> {
        self.0.find_by_wallet(wallet_address).await
    }

    async fn find_or_create_by_wallet(
        &self,
        wallet_address: &str,
    ) -> Result<User, RepositoryError> {
        self.0.find_or_create_by_wallet(wallet_address).await
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, RepositoryError> {
        self.0.find_by_nickname(nickname).await
    }

    async fn set_nickname(&self, id: Uuid, nickname: &str) -> Result<User, RepositoryError> {
        self.0.set_nickname(id, nickname).await
    }

    async fn add_reputation(&self, _id: Uuid, _amount: i32) -> Result<User, RepositoryError> {
        Err(RepositoryError::NotFound("User not found".to_string()))
    }

    async fn top_by_reputation(&self, limit: i64) -> Result<Vec<CreatorRank>, RepositoryError> {
        self.0.top_by_reputation(limit).await
    }
}

/// Gateway stub whose every call fails, for best-effort paths
pub struct FailingGateway;

#[async_trait]
impl StoryGateway for FailingGateway {
    async fn register_ip(&self, _metadata: IpMetadata) -> AppResult<IpRegistration> {
        Err(AppError::ExternalService("gateway unavailable".to_string()))
    }

    async fn issue_license(
        &self,
        _ip_id: &str,
        _license_terms_id: &str,
        _receiver_wallet: &str,
    ) -> AppResult<LicenseReceipt> {
        Err(AppError::ExternalService("gateway unavailable".to_string()))
    }
}

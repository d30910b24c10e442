//! REST API surface.
//!
//! Thin axum handlers over the service layer. Identity is supplied by the
//! auth collaborator as an `x-wallet-address` header; users are created on
//! first authenticated contact.

pub mod handlers;

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Prompt lifecycle
        .route("/api/prompts", post(handlers::create_prompt))
        .route("/api/prompts/marketplace", get(handlers::marketplace))
        .route("/api/prompts/user/prompts", get(handlers::user_prompts))
        .route("/api/prompts/:id", get(handlers::get_prompt))
        .route("/api/prompts/:id", delete(handlers::delete_prompt))
        .route("/api/prompts/:id/register", post(handlers::register_prompt))
        // Verification ledger
        .route("/api/prompts/:id/verify", post(handlers::verify_prompt))
        .route(
            "/api/prompts/:id/verifications",
            get(handlers::prompt_verifications),
        )
        // Leaderboards
        .route(
            "/api/prompts/leaderboards/creators",
            get(handlers::top_creators),
        )
        .route(
            "/api/prompts/leaderboards/useful",
            get(handlers::most_useful_prompts),
        )
        .route(
            "/api/prompts/leaderboards/verified",
            get(handlers::most_verified_prompts),
        )
        // Accounts
        .route("/api/user/me", get(handlers::user_info))
        .route("/api/user/nickname", post(handlers::set_nickname))
        .route(
            "/api/nickname/:nickname/available",
            get(handlers::nickname_available),
        )
        // Health check
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// JSON body extractor that reports malformed input as a validation error
/// (400) instead of axum's default rejection statuses.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal failures are logged with detail but reported generically
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

use crate::error::{AppError, AppResult};
use crate::http::ApiJson;
use crate::models::User;
use crate::services::leaderboard_service::{DEFAULT_LIMIT, DEFAULT_MIN_VERIFICATIONS};
use crate::services::prompt_service::CreatePromptInput;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the caller's wallet address
const WALLET_HEADER: &str = "x-wallet-address";

/// Resolve the caller, creating the account on first contact
async fn require_user(state: &AppState, headers: &HeaderMap) -> AppResult<User> {
    let wallet = headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("No wallet address provided".into()))?;

    state.account_service.authenticate(wallet).await
}

/// Resolve the caller if a wallet header is present, otherwise None
async fn optional_user(state: &AppState, headers: &HeaderMap) -> AppResult<Option<User>> {
    match headers.get(WALLET_HEADER).and_then(|v| v.to_str().ok()) {
        Some(wallet) if !wallet.trim().is_empty() => {
            Ok(Some(state.account_service.authenticate(wallet).await?))
        }
        _ => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    pub title: String,
    pub description: String,
    pub prompt_text: String,
    pub category: String,
    pub license_type: Option<String>,
    pub parent_prompt_id: Option<Uuid>,
}

pub async fn create_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<CreatePromptRequest>,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&state, &headers).await?;

    let prompt = state
        .prompt_service
        .create_prompt(
            user.id,
            CreatePromptInput {
                title: body.title,
                description: body.description,
                prompt_text: body.prompt_text,
                category: body.category,
                license_type: body.license_type,
                parent_prompt_id: body.parent_prompt_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(prompt)))
}

pub async fn marketplace(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let prompts = state.prompt_service.marketplace().await?;
    Ok(Json(prompts))
}

pub async fn user_prompts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&state, &headers).await?;
    let prompts = state.prompt_service.user_prompts(user.id).await?;
    Ok(Json(prompts))
}

pub async fn get_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let viewer = optional_user(&state, &headers).await?;
    let detail = state
        .prompt_service
        .get_prompt(id, viewer.map(|u| u.id))
        .await?;
    Ok(Json(detail))
}

pub async fn delete_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&state, &headers).await?;
    state.prompt_service.delete_prompt(id, user.id).await?;
    Ok(Json(json!({ "message": "Prompt deleted successfully" })))
}

pub async fn register_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&state, &headers).await?;
    let outcome = state.prompt_service.register_on_chain(id, user.id).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub is_useful: bool,
    pub feedback: Option<String>,
}

pub async fn verify_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<VerifyRequest>,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&state, &headers).await?;

    let outcome = state
        .verification_service
        .submit_verification(id, user.id, body.is_useful, body.feedback)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn prompt_verifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let listing = state.verification_service.verifications_for_prompt(id).await?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
    pub min_verifications: Option<i32>,
}

pub async fn top_creators(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> AppResult<impl IntoResponse> {
    let creators = state
        .leaderboard_service
        .top_creators(params.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(creators))
}

pub async fn most_useful_prompts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> AppResult<impl IntoResponse> {
    let prompts = state
        .leaderboard_service
        .most_useful_prompts(
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.min_verifications.unwrap_or(DEFAULT_MIN_VERIFICATIONS),
        )
        .await?;
    Ok(Json(prompts))
}

pub async fn most_verified_prompts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> AppResult<impl IntoResponse> {
    let prompts = state
        .leaderboard_service
        .most_verified_prompts(params.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(prompts))
}

pub async fn user_info(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&state, &headers).await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    pub nickname: String,
}

pub async fn set_nickname(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<NicknameRequest>,
) -> AppResult<impl IntoResponse> {
    let user = require_user(&state, &headers).await?;
    let updated = state
        .account_service
        .set_nickname(user.id, &body.nickname)
        .await?;
    Ok(Json(updated))
}

pub async fn nickname_available(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> AppResult<impl IntoResponse> {
    let available = state.account_service.nickname_available(&nickname).await?;
    Ok(Json(json!({ "available": available })))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

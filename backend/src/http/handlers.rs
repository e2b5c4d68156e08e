//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic. Extractor rejections are taken as
//! `Result`s so that malformed input maps to a 400 [`AppError`].

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateUserRequest, CreateUserResponse, FollowRequest, FollowStats, HealthResponse,
    IsFollowingQuery, IsFollowingResponse, PreferencePatch, ProfilePatch, UpdateUserRequest, User,
    UserId, UserPreference, UserProfile,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::UserKey;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

type IdPath = Result<Path<i64>, PathRejection>;

fn user_id(path: IdPath) -> Result<UserId, AppError> {
    let Path(id) = path?;
    Ok(UserId::new(id))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and storage is reachable.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match state.service.health_check().await {
        Ok(true) => (StatusCode::OK, "connected".to_string()),
        Ok(false) => (StatusCode::SERVICE_UNAVAILABLE, "disconnected".to_string()),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("error: {}", e)),
    };

    let body = HealthResponse {
        status: if status == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
        version: "v1".to_string(),
        database,
    };
    (status, Json(body))
}

// =============================================================================
// Users
// =============================================================================

/// POST /user/v1
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUserResponse>), AppError> {
    let Json(request) = body?;
    let user = state.service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(CreateUserResponse::from(&user))))
}

/// GET /user/v1/{id}
pub async fn get_user(State(state): State<AppState>, path: IdPath) -> HandlerResult<User> {
    let id = user_id(path)?;
    Ok(Json(state.service.get_user(&UserKey::Id(id)).await?))
}

/// GET /user/v1/username/{username}
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> HandlerResult<User> {
    Ok(Json(
        state.service.get_user(&UserKey::Username(username)).await?,
    ))
}

/// GET /user/v1/email/{email}
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> HandlerResult<User> {
    Ok(Json(state.service.get_user(&UserKey::Email(email)).await?))
}

/// PUT /user/v1/{id}
pub async fn update_user(
    State(state): State<AppState>,
    path: IdPath,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> HandlerResult<User> {
    let id = user_id(path)?;
    let Json(request) = body?;
    Ok(Json(state.service.update_user(id, request).await?))
}

/// DELETE /user/v1/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    path: IdPath,
) -> Result<StatusCode, AppError> {
    let id = user_id(path)?;
    state.service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Relationships
// =============================================================================

/// PUT /user/v1/{id}/follow
pub async fn follow(
    State(state): State<AppState>,
    path: IdPath,
    body: Result<Json<FollowRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = user_id(path)?;
    let Json(request) = body?;
    state.service.follow(id, request.following_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /user/v1/{id}/unfollow
pub async fn unfollow(
    State(state): State<AppState>,
    path: IdPath,
    body: Result<Json<FollowRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let id = user_id(path)?;
    let Json(request) = body?;
    state.service.unfollow(id, request.following_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /user/v1/{id}/followers
pub async fn list_followers(
    State(state): State<AppState>,
    path: IdPath,
) -> HandlerResult<Vec<UserId>> {
    let id = user_id(path)?;
    Ok(Json(state.service.list_followers(id).await?))
}

/// GET /user/v1/{id}/following
pub async fn list_following(
    State(state): State<AppState>,
    path: IdPath,
) -> HandlerResult<Vec<UserId>> {
    let id = user_id(path)?;
    Ok(Json(state.service.list_following(id).await?))
}

/// GET /user/v1/{id}/isFollowing?following_id=N
pub async fn is_following(
    State(state): State<AppState>,
    path: IdPath,
    query: Result<Query<IsFollowingQuery>, QueryRejection>,
) -> HandlerResult<IsFollowingResponse> {
    let id = user_id(path)?;
    let Query(query) = query?;
    let is_following = state.service.is_following(id, query.following_id).await?;
    Ok(Json(IsFollowingResponse { is_following }))
}

/// GET /user/v1/{id}/followStats
pub async fn follow_stats(
    State(state): State<AppState>,
    path: IdPath,
) -> HandlerResult<FollowStats> {
    let id = user_id(path)?;
    Ok(Json(state.service.follow_stats(id).await?))
}

// =============================================================================
// Profile & Preference
// =============================================================================

/// PUT /user/v1/{id}/profile
pub async fn upsert_profile(
    State(state): State<AppState>,
    path: IdPath,
    body: Result<Json<ProfilePatch>, JsonRejection>,
) -> HandlerResult<UserProfile> {
    let id = user_id(path)?;
    let Json(patch) = body?;
    Ok(Json(state.service.upsert_profile(id, &patch).await?))
}

/// GET /user/v1/{id}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    path: IdPath,
) -> HandlerResult<UserProfile> {
    let id = user_id(path)?;
    Ok(Json(state.service.get_profile(id).await?))
}

/// PUT /user/v1/{id}/preference
pub async fn upsert_preference(
    State(state): State<AppState>,
    path: IdPath,
    body: Result<Json<PreferencePatch>, JsonRejection>,
) -> HandlerResult<UserPreference> {
    let id = user_id(path)?;
    let Json(patch) = body?;
    Ok(Json(state.service.upsert_preference(id, &patch).await?))
}

/// GET /user/v1/{id}/preference
pub async fn get_preference(
    State(state): State<AppState>,
    path: IdPath,
) -> HandlerResult<UserPreference> {
    let id = user_id(path)?;
    Ok(Json(state.service.get_preference(id).await?))
}

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use lemoteur::{Track, UserId};
use leregistre::{NewUser, PageRequest, UserFilter, UserRecord, UserStats, UserStore, UserUpdate};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::ApiResult;
use crate::extract::{optional_filter, ApiJson, ApiPath, ApiQuery};
use crate::responses::{CreatedId, CreatedResponse, MessageResponse, UserListResponse};

/// Query parameters for `GET /api/users`
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    /// 1-based page
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Matched against name and email
    pub search: Option<String>,
    /// Strand filter
    pub strand: Option<String>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/stats/overview", get(user_stats))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let request = PageRequest::new(query.page, query.limit)?;
    let filter = UserFilter {
        search: query.search,
        strand: optional_filter::<Track>(query.strand.as_deref())?,
    };

    let mut storage = state.storage()?;
    let page = UserStore::new(&mut storage).list(&filter, request)?;
    Ok(Json(page.into()))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Json<UserRecord>> {
    let mut storage = state.storage()?;
    Ok(Json(UserStore::new(&mut storage).get(id)?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let mut storage = state.storage()?;
    let id = UserStore::new(&mut storage).create(&user)?;
    info!("Created user {} ({})", id, user.strand);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("User created successfully", CreatedId::UserId(id))),
    ))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    UserStore::new(&mut storage).update(id, &update)?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    UserStore::new(&mut storage).delete(id)?;
    info!("Deleted user {}", id);
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// GET /api/users/stats/overview
pub async fn user_stats(State(state): State<AppState>) -> ApiResult<Json<UserStats>> {
    let mut storage = state.storage()?;
    Ok(Json(UserStore::new(&mut storage).stats()?))
}

use axum::{extract::State, http::StatusCode, routing::{get, post, put}, Json, Router};
use lemoteur::{
    CourseId, RecommendationGenerator, RecommendationId, RecommendationStatus, UserId,
};
use leregistre::{
    CourseRecommendation, ManualRecommendation, PageRequest, RecommendationDetail,
    RecommendationFilter, RecommendationStats, RecommendationStore, UserRecommendation, UserStore,
};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::ApiResult;
use crate::extract::{optional_filter, ApiJson, ApiPath, ApiQuery};
use crate::responses::{
    CreatedId, CreatedResponse, GenerateResponse, MessageResponse, RecommendationListResponse,
};

/// Query parameters for `GET /api/recommendations`
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationListQuery {
    /// 1-based page
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Status filter
    pub status: Option<String>,
    /// Learner filter
    pub user_id: Option<UserId>,
    /// Course filter
    pub course_id: Option<CourseId>,
}

/// Body of `PUT /api/recommendations/:id/status`
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// New status
    pub status: RecommendationStatus,
}

/// Body of `POST /api/recommendations/generate`
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Learner to generate for
    pub user_id: UserId,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recommendations",
            get(list_recommendations).post(create_recommendation),
        )
        .route("/api/recommendations/generate", post(generate_recommendations))
        .route("/api/recommendations/stats/overview", get(recommendation_stats))
        .route("/api/recommendations/user/:user_id", get(user_recommendations))
        .route("/api/recommendations/course/:course_id", get(course_recommendations))
        .route(
            "/api/recommendations/:id",
            get(get_recommendation).delete(delete_recommendation),
        )
        .route("/api/recommendations/:id/status", put(update_status))
}

/// GET /api/recommendations
pub async fn list_recommendations(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RecommendationListQuery>,
) -> ApiResult<Json<RecommendationListResponse>> {
    let request = PageRequest::new(query.page, query.limit)?;
    let filter = RecommendationFilter {
        status: optional_filter::<RecommendationStatus>(query.status.as_deref())?,
        user_id: query.user_id,
        course_id: query.course_id,
    };

    let mut storage = state.storage()?;
    let page = RecommendationStore::new(&mut storage).list(filter, request)?;
    Ok(Json(page.into()))
}

/// GET /api/recommendations/:id - Recommendation joined with learner and course
pub async fn get_recommendation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecommendationId>,
) -> ApiResult<Json<RecommendationDetail>> {
    let mut storage = state.storage()?;
    Ok(Json(RecommendationStore::new(&mut storage).detail(id)?))
}

/// POST /api/recommendations - Manual recommendation
pub async fn create_recommendation(
    State(state): State<AppState>,
    ApiJson(recommendation): ApiJson<ManualRecommendation>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let mut storage = state.storage()?;
    let id = RecommendationStore::new(&mut storage).create(&recommendation)?;
    info!(
        "Created manual recommendation {} (user {}, course {})",
        id, recommendation.user_id, recommendation.course_id
    );
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new(
            "Recommendation created successfully",
            CreatedId::RecommendationId(id),
        )),
    ))
}

/// PUT /api/recommendations/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecommendationId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    RecommendationStore::new(&mut storage).update_status(id, request.status)?;
    info!("Recommendation {} marked {}", id, request.status);
    Ok(Json(MessageResponse::new(
        "Recommendation status updated successfully",
    )))
}

/// DELETE /api/recommendations/:id
pub async fn delete_recommendation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecommendationId>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    RecommendationStore::new(&mut storage).delete(id)?;
    Ok(Json(MessageResponse::new("Recommendation deleted successfully")))
}

/// GET /api/recommendations/user/:user_id
pub async fn user_recommendations(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> ApiResult<Json<Vec<UserRecommendation>>> {
    let mut storage = state.storage()?;
    Ok(Json(RecommendationStore::new(&mut storage).for_user(user_id)?))
}

/// GET /api/recommendations/course/:course_id
pub async fn course_recommendations(
    State(state): State<AppState>,
    ApiPath(course_id): ApiPath<CourseId>,
) -> ApiResult<Json<Vec<CourseRecommendation>>> {
    let mut storage = state.storage()?;
    Ok(Json(RecommendationStore::new(&mut storage).for_course(course_id)?))
}

/// GET /api/recommendations/stats/overview
pub async fn recommendation_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<RecommendationStats>> {
    let mut storage = state.storage()?;
    Ok(Json(RecommendationStore::new(&mut storage).stats()?))
}

/// POST /api/recommendations/generate
///
/// Writes one pending recommendation per eligible course. A failed write
/// leaves no recommendation from the run behind.
pub async fn generate_recommendations(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    let mut storage = state.storage()?;
    let user = UserStore::new(&mut storage).get(request.user_id)?;

    let report = RecommendationGenerator::new(&mut *storage).generate(user.user_id)?;
    info!(
        "Generated {} recommendations for user {}",
        report.count, user.user_id
    );

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            message: format!(
                "Generated {} recommendations for {}",
                report.count, user.full_name
            ),
            recommendations: report.recommendations,
            count: report.count,
        }),
    ))
}

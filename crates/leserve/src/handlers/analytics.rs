use axum::{extract::State, routing::get, Json, Router};
use leregistre::{
    ActivityTimeline, Analytics, CourseAnalytics, RecommendationAnalytics, StorageError,
    SystemOverview, TestAnalytics, UserAnalytics, DEFAULT_TIMELINE_DAYS,
};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiResult;
use crate::extract::ApiQuery;

/// Query parameters for `GET /api/analytics/activity/timeline`
#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    /// Days to look back (default 30)
    pub days: Option<u32>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/system/overview", get(system_overview))
        .route("/api/analytics/users/analytics", get(user_analytics))
        .route("/api/analytics/courses/analytics", get(course_analytics))
        .route(
            "/api/analytics/recommendations/analytics",
            get(recommendation_analytics),
        )
        .route("/api/analytics/tests/analytics", get(test_analytics))
        .route("/api/analytics/activity/timeline", get(activity_timeline))
}

/// GET /api/analytics/system/overview
pub async fn system_overview(State(state): State<AppState>) -> ApiResult<Json<SystemOverview>> {
    let storage = state.storage()?;
    let overview = Analytics::new(&storage)
        .system_overview()
        .map_err(StorageError::from)?;
    Ok(Json(overview))
}

/// GET /api/analytics/users/analytics
pub async fn user_analytics(State(state): State<AppState>) -> ApiResult<Json<UserAnalytics>> {
    let storage = state.storage()?;
    let analytics = Analytics::new(&storage)
        .user_analytics()
        .map_err(StorageError::from)?;
    Ok(Json(analytics))
}

/// GET /api/analytics/courses/analytics
pub async fn course_analytics(State(state): State<AppState>) -> ApiResult<Json<CourseAnalytics>> {
    let storage = state.storage()?;
    let analytics = Analytics::new(&storage)
        .course_analytics()
        .map_err(StorageError::from)?;
    Ok(Json(analytics))
}

/// GET /api/analytics/recommendations/analytics
pub async fn recommendation_analytics(
    State(state): State<AppState>,
) -> ApiResult<Json<RecommendationAnalytics>> {
    let storage = state.storage()?;
    let analytics = Analytics::new(&storage)
        .recommendation_analytics()
        .map_err(StorageError::from)?;
    Ok(Json(analytics))
}

/// GET /api/analytics/tests/analytics
pub async fn test_analytics(State(state): State<AppState>) -> ApiResult<Json<TestAnalytics>> {
    let storage = state.storage()?;
    let analytics = Analytics::new(&storage)
        .test_analytics()
        .map_err(StorageError::from)?;
    Ok(Json(analytics))
}

/// GET /api/analytics/activity/timeline?days=N
pub async fn activity_timeline(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TimelineQuery>,
) -> ApiResult<Json<ActivityTimeline>> {
    let days = query.days.unwrap_or(DEFAULT_TIMELINE_DAYS);
    let storage = state.storage()?;
    let timeline = Analytics::new(&storage)
        .activity_timeline(days)
        .map_err(StorageError::from)?;
    Ok(Json(timeline))
}

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use lemoteur::{CourseId, Track};
use leregistre::{
    CourseFilter, CourseRecord, CourseStats, CourseStore, CourseUpdate, NewCourse, PageRequest,
};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::ApiResult;
use crate::extract::{optional_filter, ApiJson, ApiPath, ApiQuery};
use crate::responses::{CourseListResponse, CreatedId, CreatedResponse, MessageResponse};

/// Query parameters for `GET /api/courses`
#[derive(Debug, Default, Deserialize)]
pub struct CourseListQuery {
    /// 1-based page
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Matched against name and description
    pub search: Option<String>,
    /// Required strand filter
    pub strand: Option<String>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/stats/overview", get(course_stats))
        .route("/api/courses/strand/:strand", get(courses_by_strand))
        .route(
            "/api/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

/// GET /api/courses
pub async fn list_courses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CourseListQuery>,
) -> ApiResult<Json<CourseListResponse>> {
    let request = PageRequest::new(query.page, query.limit)?;
    let filter = CourseFilter {
        search: query.search,
        strand: optional_filter::<Track>(query.strand.as_deref())?,
    };

    let mut storage = state.storage()?;
    let page = CourseStore::new(&mut storage).list(&filter, request)?;
    Ok(Json(page.into()))
}

/// GET /api/courses/:id
pub async fn get_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CourseId>,
) -> ApiResult<Json<CourseRecord>> {
    let mut storage = state.storage()?;
    Ok(Json(CourseStore::new(&mut storage).get(id)?))
}

/// POST /api/courses
pub async fn create_course(
    State(state): State<AppState>,
    ApiJson(course): ApiJson<NewCourse>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let mut storage = state.storage()?;
    let id = CourseStore::new(&mut storage).create(&course)?;
    info!("Created course {} '{}'", id, course.course_name);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("Course created successfully", CreatedId::CourseId(id))),
    ))
}

/// PUT /api/courses/:id
pub async fn update_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CourseId>,
    ApiJson(update): ApiJson<CourseUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    CourseStore::new(&mut storage).update(id, &update)?;
    Ok(Json(MessageResponse::new("Course updated successfully")))
}

/// DELETE /api/courses/:id
pub async fn delete_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CourseId>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    CourseStore::new(&mut storage).delete(id)?;
    info!("Deleted course {}", id);
    Ok(Json(MessageResponse::new("Course deleted successfully")))
}

/// GET /api/courses/strand/:strand
pub async fn courses_by_strand(
    State(state): State<AppState>,
    ApiPath(strand): ApiPath<String>,
) -> ApiResult<Json<Vec<CourseRecord>>> {
    let strand: Track = strand.parse()?;
    let mut storage = state.storage()?;
    Ok(Json(CourseStore::new(&mut storage).by_strand(strand)?))
}

/// GET /api/courses/stats/overview
pub async fn course_stats(State(state): State<AppState>) -> ApiResult<Json<CourseStats>> {
    let mut storage = state.storage()?;
    Ok(Json(CourseStore::new(&mut storage).stats()?))
}

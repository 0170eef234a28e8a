use axum::{extract::State, http::StatusCode, routing::{delete, get}, Json, Router};
use leregistre::{
    AssessmentStore, NewQuestion, NewTest, PageRequest, QuestionId, QuestionRecord, TestDetail,
    TestId, TestStats, TestUpdate,
};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::responses::{CreatedId, CreatedResponse, MessageResponse, TestListResponse};

/// Query parameters for `GET /api/tests`
#[derive(Debug, Default, Deserialize)]
pub struct TestListQuery {
    /// 1-based page
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Matched against the test name
    pub search: Option<String>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tests", get(list_tests).post(create_test))
        .route("/api/tests/stats/overview", get(test_stats))
        .route("/api/tests/questions/:question_id", delete(delete_question))
        .route(
            "/api/tests/:id",
            get(get_test).put(update_test).delete(delete_test),
        )
        .route("/api/tests/:id/questions", get(list_questions).post(add_question))
}

/// GET /api/tests
pub async fn list_tests(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TestListQuery>,
) -> ApiResult<Json<TestListResponse>> {
    let request = PageRequest::new(query.page, query.limit)?;
    let mut storage = state.storage()?;
    let page = AssessmentStore::new(&mut storage).list(query.search.as_deref(), request)?;
    Ok(Json(page.into()))
}

/// GET /api/tests/:id - Test with its questions and options
pub async fn get_test(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TestId>,
) -> ApiResult<Json<TestDetail>> {
    let mut storage = state.storage()?;
    Ok(Json(AssessmentStore::new(&mut storage).detail(id)?))
}

/// POST /api/tests
pub async fn create_test(
    State(state): State<AppState>,
    ApiJson(test): ApiJson<NewTest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let mut storage = state.storage()?;
    let id = AssessmentStore::new(&mut storage).create(&test)?;
    info!("Created test {} with {} question(s)", id, test.questions.len());
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("Test created successfully", CreatedId::TestId(id))),
    ))
}

/// PUT /api/tests/:id
pub async fn update_test(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TestId>,
    ApiJson(update): ApiJson<TestUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    AssessmentStore::new(&mut storage).update(id, &update)?;
    Ok(Json(MessageResponse::new("Test updated successfully")))
}

/// DELETE /api/tests/:id
pub async fn delete_test(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TestId>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    AssessmentStore::new(&mut storage).delete(id)?;
    info!("Deleted test {}", id);
    Ok(Json(MessageResponse::new("Test deleted successfully")))
}

/// GET /api/tests/:id/questions
pub async fn list_questions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TestId>,
) -> ApiResult<Json<Vec<QuestionRecord>>> {
    let mut storage = state.storage()?;
    Ok(Json(AssessmentStore::new(&mut storage).questions(id)?))
}

/// POST /api/tests/:id/questions
pub async fn add_question(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TestId>,
    ApiJson(question): ApiJson<NewQuestion>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let mut storage = state.storage()?;
    let question_id = AssessmentStore::new(&mut storage).add_question(id, &question)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new(
            "Question added successfully",
            CreatedId::QuestionId(question_id),
        )),
    ))
}

/// DELETE /api/tests/questions/:question_id
pub async fn delete_question(
    State(state): State<AppState>,
    ApiPath(question_id): ApiPath<QuestionId>,
) -> ApiResult<Json<MessageResponse>> {
    let mut storage = state.storage()?;
    AssessmentStore::new(&mut storage).delete_question(question_id)?;
    Ok(Json(MessageResponse::new("Question deleted successfully")))
}

/// GET /api/tests/stats/overview
pub async fn test_stats(State(state): State<AppState>) -> ApiResult<Json<TestStats>> {
    let mut storage = state.storage()?;
    Ok(Json(AssessmentStore::new(&mut storage).stats()?))
}

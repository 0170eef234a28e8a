//! API response bodies matching the admin dashboard contract

use lemoteur::GeneratedRecommendation;
use leregistre::{
    CourseRecord, Page, Pagination, RecommendationListItem, TestRecord, UserRecord,
};
use serde::{Deserialize, Serialize};

/// Identifier returned by a create endpoint, serialized as `<entity>_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedId {
    /// New learner
    UserId(i64),
    /// New course
    CourseId(i64),
    /// New aptitude test
    TestId(i64),
    /// New question
    QuestionId(i64),
    /// New recommendation
    RecommendationId(i64),
}

/// Body of a `201 Created` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// Human-readable outcome
    pub message: String,

    /// Identifier of the created record
    #[serde(flatten)]
    pub id: CreatedId,
}

impl CreatedResponse {
    /// Build a created response
    pub fn new(message: impl Into<String>, id: CreatedId) -> Self {
        Self {
            message: message.into(),
            id,
        }
    }
}

/// Body of update and delete responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    /// Build a message response
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /api/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    /// Learners on this page
    pub users: Vec<UserRecord>,
    /// Page block
    pub pagination: Pagination,
}

impl From<Page<UserRecord>> for UserListResponse {
    fn from(page: Page<UserRecord>) -> Self {
        Self {
            users: page.items,
            pagination: page.pagination,
        }
    }
}

/// `GET /api/courses`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseListResponse {
    /// Courses on this page
    pub courses: Vec<CourseRecord>,
    /// Page block
    pub pagination: Pagination,
}

impl From<Page<CourseRecord>> for CourseListResponse {
    fn from(page: Page<CourseRecord>) -> Self {
        Self {
            courses: page.items,
            pagination: page.pagination,
        }
    }
}

/// `GET /api/tests`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestListResponse {
    /// Tests on this page
    pub tests: Vec<TestRecord>,
    /// Page block
    pub pagination: Pagination,
}

impl From<Page<TestRecord>> for TestListResponse {
    fn from(page: Page<TestRecord>) -> Self {
        Self {
            tests: page.items,
            pagination: page.pagination,
        }
    }
}

/// `GET /api/recommendations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationListResponse {
    /// Recommendations on this page, joined with learner and course names
    pub recommendations: Vec<RecommendationListItem>,
    /// Page block
    pub pagination: Pagination,
}

impl From<Page<RecommendationListItem>> for RecommendationListResponse {
    fn from(page: Page<RecommendationListItem>) -> Self {
        Self {
            recommendations: page.items,
            pagination: page.pagination,
        }
    }
}

/// `POST /api/recommendations/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// e.g. "Generated 2 recommendations for Ana Cruz"
    pub message: String,
    /// Created recommendations, most demanding course first
    pub recommendations: Vec<GeneratedRecommendation>,
    /// Number of created recommendations
    pub count: usize,
}

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" when the database answers
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// "connected" or "unavailable"
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_response_uses_entity_key() {
        let body = CreatedResponse::new("User created successfully", CreatedId::UserId(7));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "User created successfully", "user_id": 7})
        );
    }

    #[test]
    fn test_created_response_recommendation_key() {
        let json = serde_json::to_value(CreatedResponse::new(
            "Recommendation created successfully",
            CreatedId::RecommendationId(3),
        ))
        .unwrap();
        assert_eq!(json["recommendation_id"], 3);
    }
}

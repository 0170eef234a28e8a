//! leregistre - Persistent Register
//!
//! *Le Registre* (The Register) - SQLite schema, per-table record stores,
//! analytics rollups and the engine's `RecordStore` backend

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Dashboard analytics across tables.
pub mod analytics;
/// Aptitude tests, questions and options.
pub mod assessments;
/// Course catalog storage.
pub mod courses;
/// Storage error types.
pub mod error;
mod filters;
/// Page requests and pagination blocks.
pub mod pagination;
/// Recommendation storage.
pub mod recommendations;
mod record_store;
/// Database schema and connection management.
pub mod schema;
/// Built-in catalog seeding.
pub mod seed;
/// Learner storage.
pub mod users;

pub use analytics::{
    ActivityEntry, ActivityTimeline, Analytics, CourseAnalytics, RecommendationAnalytics,
    SystemOverview, TestAnalytics, UserAnalytics, DEFAULT_TIMELINE_DAYS,
};
pub use assessments::{
    AssessmentStore, NewOption, NewQuestion, NewTest, QuestionId, QuestionRecord, TestDetail,
    TestId, TestRecord, TestStats, TestUpdate,
};
pub use courses::{CourseFilter, CourseRecord, CourseStats, CourseStore, CourseUpdate, NewCourse};
pub use error::{Result, StorageError};
pub use pagination::{Page, PageRequest, Pagination};
pub use recommendations::{
    CourseRecommendation, ManualRecommendation, RecommendationDetail, RecommendationFilter,
    RecommendationListItem, RecommendationRecord, RecommendationStats, RecommendationStore,
    UserRecommendation,
};
pub use schema::{Storage, StorageConfig};
pub use seed::{derive_track, seed_catalog, CATALOG};
pub use users::{NewUser, UserFilter, UserRecord, UserStats, UserStore, UserUpdate};

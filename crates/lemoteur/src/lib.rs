//! lemoteur - Recommendation Engine
//!
//! *Le Moteur* (The Engine) - Eligibility filtering, confidence scoring and
//! batch recommendation generation for LeConseil

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Learner, program and recommendation domain types.
pub mod domain;
/// Eligibility filtering of the program catalog.
pub mod eligibility;
/// Engine error types.
pub mod error;
/// Batch recommendation generation.
pub mod generator;
/// Confidence scoring of eligible pairs.
pub mod scoring;
/// Record store contract and in-memory implementation.
pub mod store;

pub use domain::{
    ConfidenceScore, CourseId, GradeAverage, LearnerProfile, NewRecommendation, Program,
    RecommendationId, RecommendationStatus, Track, UserId, MAX_GRADE_AVERAGE, MIN_GRADE_AVERAGE,
};
pub use eligibility::{eligible_programs, is_eligible};
pub use error::{EngineError, Result, StoreError, StoreResult};
pub use generator::{GeneratedRecommendation, GenerationReport, RecommendationGenerator};
pub use scoring::{confidence, reasoning, score, Assessment};
pub use store::{MemoryStore, RecordStore, StoredRecommendation};

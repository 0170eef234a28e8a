//! Record store contract consumed by the engine.
//!
//! The engine never reaches into a shared connection; callers inject a
//! [`RecordStore`]. [`MemoryStore`] keeps everything in process and backs the
//! engine tests.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    ConfidenceScore, CourseId, LearnerProfile, NewRecommendation, Program, RecommendationId,
    RecommendationStatus, Track, UserId,
};
use crate::error::{StoreError, StoreResult};

/// Read and write operations the engine needs from durable storage.
pub trait RecordStore {
    /// Look up a learner profile by ID.
    fn fetch_profile(&self, id: UserId) -> StoreResult<LearnerProfile>;

    /// Return every program requiring `track`, in catalog insertion order.
    fn fetch_programs_by_track(&self, track: Track) -> StoreResult<Vec<Program>>;

    /// Insert one recommendation and return its ID.
    fn insert_recommendation(&mut self, record: &NewRecommendation) -> StoreResult<RecommendationId>;

    /// Insert several recommendations atomically.
    ///
    /// Either every record is written and all IDs are returned in input
    /// order, or the store is left unchanged and an error is returned.
    fn insert_recommendations(
        &mut self,
        records: &[NewRecommendation],
    ) -> StoreResult<Vec<RecommendationId>>;

    /// Replace the status of a recommendation.
    fn update_recommendation_status(
        &mut self,
        id: RecommendationId,
        status: RecommendationStatus,
    ) -> StoreResult<()>;

    /// Delete a recommendation.
    fn delete_recommendation(&mut self, id: RecommendationId) -> StoreResult<()>;
}

/// A recommendation held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecommendation {
    /// Assigned ID
    pub id: RecommendationId,
    /// Learner ID
    pub profile_id: UserId,
    /// Program ID
    pub program_id: CourseId,
    /// Confidence score
    pub score: ConfidenceScore,
    /// Justification text
    pub reasoning: String,
    /// Current status
    pub status: RecommendationStatus,
}

/// In-process [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: Vec<LearnerProfile>,
    programs: Vec<Program>,
    recommendations: Vec<StoredRecommendation>,
    next_id: RecommendationId,
    inserts: usize,
    fail_on_insert: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Add a learner profile
    pub fn add_profile(&mut self, profile: LearnerProfile) {
        self.profiles.push(profile);
    }

    /// Append a program to the catalog
    pub fn add_program(&mut self, program: Program) {
        self.programs.push(program);
    }

    /// Make the `n`-th insert (1-based, counted across all inserts) fail.
    pub fn fail_on_insert(&mut self, n: usize) {
        self.fail_on_insert = Some(n);
    }

    /// All stored recommendations in insertion order
    pub fn recommendations(&self) -> &[StoredRecommendation] {
        &self.recommendations
    }

    fn check_references(&self, record: &NewRecommendation) -> StoreResult<()> {
        if !self.profiles.iter().any(|p| p.id == record.profile_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "FOREIGN KEY constraint failed: user {}",
                record.profile_id
            )));
        }
        if !self.programs.iter().any(|p| p.id == record.program_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "FOREIGN KEY constraint failed: course {}",
                record.program_id
            )));
        }
        Ok(())
    }

    fn stage(
        &mut self,
        record: &NewRecommendation,
        next_id: &mut RecommendationId,
    ) -> StoreResult<StoredRecommendation> {
        self.inserts += 1;
        if self.fail_on_insert == Some(self.inserts) {
            return Err(StoreError::Backend(format!(
                "injected failure on insert {}",
                self.inserts
            )));
        }
        self.check_references(record)?;

        let stored = StoredRecommendation {
            id: *next_id,
            profile_id: record.profile_id,
            program_id: record.program_id,
            score: record.score,
            reasoning: record.reasoning.clone(),
            status: record.status,
        };
        *next_id += 1;
        Ok(stored)
    }

    fn position(&self, id: RecommendationId) -> StoreResult<usize> {
        self.recommendations
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound {
                entity: "recommendation",
                id,
            })
    }
}

impl RecordStore for MemoryStore {
    fn fetch_profile(&self, id: UserId) -> StoreResult<LearnerProfile> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "user", id })
    }

    fn fetch_programs_by_track(&self, track: Track) -> StoreResult<Vec<Program>> {
        Ok(self
            .programs
            .iter()
            .filter(|p| p.required_track == track)
            .cloned()
            .collect())
    }

    fn insert_recommendation(&mut self, record: &NewRecommendation) -> StoreResult<RecommendationId> {
        let mut next_id = self.next_id;
        let stored = self.stage(record, &mut next_id)?;
        let id = stored.id;
        self.recommendations.push(stored);
        self.next_id = next_id;
        Ok(id)
    }

    fn insert_recommendations(
        &mut self,
        records: &[NewRecommendation],
    ) -> StoreResult<Vec<RecommendationId>> {
        let mut next_id = self.next_id;
        let mut staged = Vec::with_capacity(records.len());
        for record in records {
            staged.push(self.stage(record, &mut next_id)?);
        }

        debug!("Committing {} staged recommendations", staged.len());
        let ids = staged.iter().map(|r| r.id).collect();
        self.recommendations.extend(staged);
        self.next_id = next_id;
        Ok(ids)
    }

    fn update_recommendation_status(
        &mut self,
        id: RecommendationId,
        status: RecommendationStatus,
    ) -> StoreResult<()> {
        let index = self.position(id)?;
        self.recommendations[index].status = status;
        Ok(())
    }

    fn delete_recommendation(&mut self, id: RecommendationId) -> StoreResult<()> {
        let index = self.position(id)?;
        self.recommendations.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GradeAverage;

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_profile(LearnerProfile {
            id: 1,
            track: Track::Stem,
            grade_average: GradeAverage::new(90.0).unwrap(),
        });
        store.add_program(Program {
            id: 10,
            name: "BS Physics".to_string(),
            required_track: Track::Stem,
            minimum_average: GradeAverage::new(80.0).unwrap(),
        });
        store
    }

    fn new_rec(program_id: CourseId) -> NewRecommendation {
        NewRecommendation {
            profile_id: 1,
            program_id,
            score: ConfidenceScore::new(80.0).unwrap(),
            reasoning: "test".to_string(),
            status: RecommendationStatus::Pending,
        }
    }

    #[test]
    fn test_fetch_missing_profile_is_not_found() {
        let store = seeded();
        assert_eq!(
            store.fetch_profile(99),
            Err(StoreError::NotFound { entity: "user", id: 99 })
        );
    }

    #[test]
    fn test_insert_update_delete() {
        let mut store = seeded();
        let id = store.insert_recommendation(&new_rec(10)).unwrap();
        store
            .update_recommendation_status(id, RecommendationStatus::Accepted)
            .unwrap();
        assert_eq!(store.recommendations()[0].status, RecommendationStatus::Accepted);

        store.delete_recommendation(id).unwrap();
        assert!(store.recommendations().is_empty());
        assert!(matches!(
            store.delete_recommendation(id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_program_is_constraint_violation() {
        let mut store = seeded();
        assert!(matches!(
            store.insert_recommendation(&new_rec(404)),
            Err(StoreError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut store = seeded();
        let result = store.insert_recommendations(&[new_rec(10), new_rec(404)]);
        assert!(result.is_err());
        assert!(store.recommendations().is_empty());

        let ids = store.insert_recommendations(&[new_rec(10), new_rec(10)]).unwrap();
        assert_eq!(ids, vec![1, 2]);
    }
}

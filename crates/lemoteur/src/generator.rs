// Batch recommendation generation

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{
    ConfidenceScore, CourseId, NewRecommendation, RecommendationId, RecommendationStatus, UserId,
};
use crate::eligibility::eligible_programs;
use crate::error::{EngineError, Result};
use crate::scoring::score;
use crate::store::RecordStore;

/// Summary of one recommendation created by a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecommendation {
    /// ID assigned by the store
    pub recommendation_id: RecommendationId,
    /// Recommended program
    pub course_id: CourseId,
    /// Program display name
    pub course_name: String,
    /// Confidence score
    pub confidence_score: ConfidenceScore,
}

/// Outcome of a generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Learner the run was for
    pub user_id: UserId,
    /// Created recommendations, most demanding program first
    pub recommendations: Vec<GeneratedRecommendation>,
    /// Number of created recommendations
    pub count: usize,
}

/// Turns a learner profile into pending recommendations.
///
/// Runs are additive: generating twice for the same learner writes two sets
/// of pending recommendations.
pub struct RecommendationGenerator<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: RecordStore + ?Sized> RecommendationGenerator<'a, S> {
    /// Create a generator over a record store
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Generate and persist recommendations for one learner.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] if the learner does not exist
    /// - [`EngineError::NoEligiblePrograms`] if no program qualifies
    /// - [`EngineError::BatchFailure`] if the write fails; no recommendation
    ///   from the run is kept
    pub fn generate(&mut self, user_id: UserId) -> Result<GenerationReport> {
        let profile = self.store.fetch_profile(user_id)?;
        let catalog = self.store.fetch_programs_by_track(profile.track)?;
        let eligible = eligible_programs(&profile, &catalog);

        if eligible.is_empty() {
            info!(
                "No eligible programs for user {} ({}, {})",
                user_id, profile.track, profile.grade_average
            );
            return Err(EngineError::NoEligiblePrograms { profile_id: user_id });
        }

        let records: Vec<NewRecommendation> = eligible
            .iter()
            .map(|program| {
                let assessment = score(&profile, program);
                NewRecommendation {
                    profile_id: profile.id,
                    program_id: program.id,
                    score: assessment.score,
                    reasoning: assessment.reasoning,
                    status: RecommendationStatus::Pending,
                }
            })
            .collect();

        let ids = self.store.insert_recommendations(&records).map_err(|source| {
            warn!("Recommendation batch for user {} failed: {}", user_id, source);
            EngineError::BatchFailure {
                attempted: records.len(),
                source,
            }
        })?;

        let recommendations: Vec<GeneratedRecommendation> = ids
            .into_iter()
            .zip(eligible.iter().zip(records.iter()))
            .map(|(recommendation_id, (program, record))| GeneratedRecommendation {
                recommendation_id,
                course_id: program.id,
                course_name: program.name.clone(),
                confidence_score: record.score,
            })
            .collect();

        info!(
            "Generated {} recommendations for user {}",
            recommendations.len(),
            user_id
        );

        Ok(GenerationReport {
            user_id,
            count: recommendations.len(),
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GradeAverage, LearnerProfile, Program, Track};
    use crate::store::MemoryStore;

    fn store_with(profile: (Track, f64), programs: &[(i64, Track, f64)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_profile(LearnerProfile {
            id: 1,
            track: profile.0,
            grade_average: GradeAverage::new(profile.1).unwrap(),
        });
        for (id, track, min) in programs {
            store.add_program(Program {
                id: *id,
                name: format!("Program {}", id),
                required_track: *track,
                minimum_average: GradeAverage::new(*min).unwrap(),
            });
        }
        store
    }

    #[test]
    fn test_missing_profile_is_not_found() {
        let mut store = MemoryStore::new();
        let err = RecommendationGenerator::new(&mut store).generate(5).unwrap_err();
        assert_eq!(err, EngineError::NotFound { entity: "user", id: 5 });
    }

    #[test]
    fn test_report_matches_store() {
        let mut store = store_with(
            (Track::Stem, 85.0),
            &[(1, Track::Stem, 75.0), (2, Track::Stem, 85.0)],
        );
        let report = RecommendationGenerator::new(&mut store).generate(1).unwrap();

        assert_eq!(report.count, 2);
        assert_eq!(report.recommendations[0].course_id, 2);
        assert_eq!(report.recommendations[0].confidence_score.value(), 60.0);
        assert_eq!(report.recommendations[1].course_id, 1);
        assert_eq!(report.recommendations[1].confidence_score.value(), 80.0);

        let stored = store.recommendations();
        assert_eq!(stored.len(), 2);
        assert!(stored
            .iter()
            .all(|r| r.status == RecommendationStatus::Pending));
        assert_eq!(stored[0].id, report.recommendations[0].recommendation_id);
    }

    #[test]
    fn test_failed_write_keeps_nothing() {
        let mut store = store_with(
            (Track::Abm, 95.0),
            &[(1, Track::Abm, 75.0), (2, Track::Abm, 80.0), (3, Track::Abm, 90.0)],
        );
        store.fail_on_insert(2);

        let err = RecommendationGenerator::new(&mut store).generate(1).unwrap_err();
        assert!(matches!(err, EngineError::BatchFailure { attempted: 3, .. }));
        assert!(store.recommendations().is_empty());
    }
}
